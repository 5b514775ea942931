//! Shared expression-tree utilities for the registry and the passes.

use crate::ir::expr::{BindingIndex, Expr};
use crate::ir::query::QueryIR;
use std::collections::BTreeSet;

/// Visit every node of `expr` pre-order, left to right.
///
/// Uses an explicit stack, so nesting depth is bounded only by memory.
pub fn walk_expr<F>(expr: &Expr, visitor: &mut F)
where
    F: FnMut(&Expr),
{
    let mut stack: Vec<&Expr> = vec![expr];
    while let Some(node) = stack.pop() {
        visitor(node);
        match node {
            Expr::Apply { args, .. } => stack.extend(args.iter().rev()),
            Expr::Seq(items) => stack.extend(items.iter().rev()),
            Expr::Tagged { expr, .. } => stack.push(expr),
            Expr::Reference { .. } | Expr::Literal(_) | Expr::Unsupported { .. } => {}
        }
    }
}

/// Invoke `collector` for every binding referenced in `expr`, in visit order.
pub fn walk_binding_refs<F>(expr: &Expr, collector: &mut F)
where
    F: FnMut(BindingIndex),
{
    walk_expr(expr, &mut |node| {
        if let Expr::Reference { binding, .. } = node {
            collector(*binding);
        }
    });
}

/// Set of binding indices referenced anywhere in `expr`
pub fn collect_binding_refs(expr: &Expr) -> BTreeSet<BindingIndex> {
    let mut refs = BTreeSet::new();
    walk_binding_refs(expr, &mut |b| {
        refs.insert(b);
    });
    refs
}

/// Call `f` on the top-level expression of every clause outside the join
/// list: select, wheres, order-bys, group-bys, havings, distinct, limit,
/// offset, in that order.
pub fn for_each_clause_expr(query: &QueryIR, mut f: impl FnMut(&Expr)) {
    if let Some(select) = &query.select {
        f(select);
    }
    for w in &query.wheres {
        f(&w.expr);
    }
    for sk in &query.order_bys {
        f(&sk.expr);
    }
    for g in &query.group_bys {
        f(g);
    }
    for h in &query.havings {
        f(&h.expr);
    }
    for e in [&query.distinct, &query.limit, &query.offset]
        .into_iter()
        .flatten()
    {
        f(e);
    }
}

/// Count every place `target` is still observed: clause references, ON
/// references from other joins, and preload nodes naming its alias.
pub(crate) fn count_uses(query: &QueryIR, target: BindingIndex) -> usize {
    let mut count = 0;
    let mut tally = |b: BindingIndex| {
        if b == target {
            count += 1;
        }
    };

    for_each_clause_expr(query, |e| walk_binding_refs(e, &mut tally));
    for join in query.joins().iter().filter(|j| j.index != target) {
        walk_binding_refs(&join.on, &mut tally);
    }

    if let Some(alias) = query
        .joins()
        .iter()
        .find(|j| j.index == target)
        .and_then(|j| j.alias.as_ref())
    {
        for tree in &query.preloads {
            tree.for_each_alias(&mut |a| {
                if a == alias {
                    count += 1;
                }
            });
        }
    }

    count
}
