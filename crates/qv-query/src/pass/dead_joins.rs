//! DeadJoinElimination pass: drops joins nothing observes (Q001, Q003)
//!
//! A binding is live when a non-join clause or the preload forest names it,
//! or when the ON-expression of a live join references it. Everything else
//! is pruned; survivors keep their order and indices.

use crate::graph::JoinDependencyGraph;
use crate::ir::expr::{BindingIndex, Expr};
use crate::ir::query::QueryIR;
use crate::pass::{Diagnostic, DiagnosticCode, DiagnosticSink, QueryPass, Severity};
use crate::walk::{for_each_clause_expr, walk_expr};
use std::collections::BTreeSet;

const PASS_NAME: &str = "dead_joins";

/// Dead-join elimination pass
pub struct DeadJoinElimination;

impl QueryPass for DeadJoinElimination {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        "Removes joins whose bindings are not referenced by the result, filters, ordering, grouping, preloads, or another live join"
    }

    fn run(&self, query: QueryIR, sink: &mut dyn DiagnosticSink) -> QueryIR {
        eliminate_dead_joins(query, sink)
    }
}

/// Bindings of `query` that must survive pruning, root included.
///
/// Unsupported expression nodes contribute no references and are reported
/// as Q001.
pub fn live_bindings(query: &QueryIR, sink: &mut dyn DiagnosticSink) -> BTreeSet<BindingIndex> {
    let mut seeds: BTreeSet<BindingIndex> = BTreeSet::new();
    seeds.insert(BindingIndex::ROOT);

    for_each_clause_expr(query, |expr| {
        scan(expr, &mut seeds, &mut |description| {
            sink.report(unsupported(description, None, None));
        });
    });

    for tree in &query.preloads {
        tree.for_each_alias(&mut |alias| {
            if let Some(index) = query.binding_of(alias) {
                seeds.insert(index);
            }
        });
    }

    // ON-expressions only feed the graph, but their opaque nodes are still
    // worth a warning
    for join in query.joins() {
        walk_expr(&join.on, &mut |node| {
            if let Expr::Unsupported { description } = node {
                sink.report(unsupported(
                    description,
                    join.alias.as_ref().map(|a| a.to_string()),
                    Some(join.index),
                ));
            }
        });
    }

    JoinDependencyGraph::build(query).reachable_from(seeds)
}

/// Remove every join that is not live.
///
/// Never fails. Each removed join is reported as Q003.
pub fn eliminate_dead_joins(mut query: QueryIR, sink: &mut dyn DiagnosticSink) -> QueryIR {
    let live = live_bindings(&query, sink);

    let joins = std::mem::take(query.joins_mut());
    let total = joins.len();
    let (kept, pruned): (Vec<_>, Vec<_>) =
        joins.into_iter().partition(|j| live.contains(&j.index));

    for join in &pruned {
        let alias = join.alias.as_ref().map(|a| a.to_string());
        sink.report(Diagnostic {
            code: DiagnosticCode::Q003,
            severity: Severity::Info,
            message: format!(
                "Join {} ({}) is not referenced and was removed",
                alias.as_deref().unwrap_or("<anonymous>"),
                join.index
            ),
            alias,
            binding: Some(join.index),
            pass_name: PASS_NAME.to_string(),
        });
    }

    if !pruned.is_empty() {
        log::debug!("Pruned {} of {} join(s)", pruned.len(), total);
    }

    *query.joins_mut() = kept;
    query
}

fn scan(expr: &Expr, refs: &mut BTreeSet<BindingIndex>, on_unsupported: &mut impl FnMut(&str)) {
    walk_expr(expr, &mut |node| match node {
        Expr::Reference { binding, .. } => {
            refs.insert(*binding);
        }
        Expr::Unsupported { description } => on_unsupported(description.as_str()),
        _ => {}
    });
}

fn unsupported(description: &str, alias: Option<String>, binding: Option<BindingIndex>) -> Diagnostic {
    Diagnostic {
        code: DiagnosticCode::Q001,
        severity: Severity::Warning,
        message: format!("Unsupported expression '{description}' contributes no references"),
        alias,
        binding,
        pass_name: PASS_NAME.to_string(),
    }
}

#[cfg(test)]
#[path = "dead_joins_test.rs"]
mod tests;
