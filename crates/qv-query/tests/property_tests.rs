//! Registry and liveness properties over generated join graphs

use proptest::prelude::*;
use qv_core::Qualifier;
use qv_query::test_utils::{alias, f, join_aliases, join_indices, posts, table};
use qv_query::walk::{collect_binding_refs, for_each_clause_expr};
use qv_query::{
    eliminate_dead_joins, ensure_or_skip, live_bindings, remove_by_alias, replace_by_alias,
    BindingIndex, Diagnostic, Expr, QueryIR,
};
use std::collections::BTreeSet;

/// Shape of a generated query: joins `j1..=jN` on table `t`, each with an
/// ON-expression naming its own binding plus `on_refs[i]`, and clause
/// references into any binding.
#[derive(Debug, Clone)]
struct JoinGraph {
    on_refs: Vec<Vec<usize>>,
    where_refs: Vec<usize>,
    select_ref: Option<usize>,
}

impl JoinGraph {
    fn join_count(&self) -> usize {
        self.on_refs.len()
    }

    fn build(&self) -> QueryIR {
        let mut q = posts();
        for (i, refs) in self.on_refs.iter().enumerate() {
            let index = i + 1;
            let mut on = vec![f(index, "id")];
            on.extend(refs.iter().map(|&r| f(r, "k")));
            q = ensure_or_skip(
                q,
                alias(&format!("j{index}")),
                Qualifier::Left,
                table("t"),
                Expr::Seq(on),
            );
        }
        for &r in &self.where_refs {
            q = q.with_where(f(r, "w"));
        }
        if let Some(r) = self.select_ref {
            q = q.with_select(f(r, "s"));
        }
        q
    }
}

fn arb_join_graph() -> impl Strategy<Value = JoinGraph> {
    (1..=12usize)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(prop::collection::vec(0..=n, 0..3), n),
                prop::collection::vec(0..=n, 0..3),
                prop::option::of(0..=n),
            )
        })
        .prop_map(|(on_refs, where_refs, select_ref)| JoinGraph {
            on_refs,
            where_refs,
            select_ref,
        })
}

fn arb_qualifier() -> impl Strategy<Value = Qualifier> {
    prop_oneof![
        Just(Qualifier::Inner),
        Just(Qualifier::Left),
        Just(Qualifier::Right),
        Just(Qualifier::Full),
    ]
}

/// Repeated full rescans until nothing changes
fn fixed_point_live(query: &QueryIR) -> BTreeSet<BindingIndex> {
    let mut live: BTreeSet<BindingIndex> = BTreeSet::new();
    live.insert(BindingIndex::ROOT);
    for_each_clause_expr(query, |e| live.extend(collect_binding_refs(e)));
    loop {
        let before = live.len();
        for join in query.joins() {
            if live.contains(&join.index) {
                live.extend(collect_binding_refs(&join.on));
            }
        }
        if live.len() == before {
            break;
        }
    }
    let present: BTreeSet<BindingIndex> = query.bindings().iter().map(|b| b.index).collect();
    live.intersection(&present).copied().collect()
}

fn prune(query: QueryIR) -> QueryIR {
    eliminate_dead_joins(query, &mut Vec::<Diagnostic>::new())
}

proptest! {
    /// Work-list liveness agrees with the repeated-rescan fixed point.
    #[test]
    fn prop_liveness_matches_fixed_point(graph in arb_join_graph()) {
        let q = graph.build();
        let mut sink: Vec<Diagnostic> = Vec::new();
        prop_assert_eq!(live_bindings(&q, &mut sink), fixed_point_live(&q));
    }

    /// Pruning keeps exactly the live joins, in order, and a second run
    /// changes nothing.
    #[test]
    fn prop_pruning_keeps_live_joins_and_is_idempotent(graph in arb_join_graph()) {
        let q = graph.build();
        let expected: BTreeSet<BindingIndex> = fixed_point_live(&q)
            .into_iter()
            .filter(|b| !b.is_root())
            .collect();
        let once = prune(q.clone());

        let kept: BTreeSet<BindingIndex> = once.joins().iter().map(|j| j.index).collect();
        prop_assert_eq!(&kept, &expected);

        let original_order: Vec<usize> = join_indices(&q)
            .into_iter()
            .filter(|i| kept.contains(&BindingIndex(*i)))
            .collect();
        prop_assert_eq!(join_indices(&once), original_order);

        prop_assert_eq!(prune(once.clone()), once);
    }

    /// Removal drops at most one join and leaves survivors untouched.
    #[test]
    fn prop_remove_changes_count_by_at_most_one(
        graph in arb_join_graph(),
        target in 1..=14usize,
    ) {
        let q = graph.build();
        let target = format!("j{target}");
        let present = q.has_join(&target);
        let removed = remove_by_alias(q.clone(), &target);

        prop_assert_eq!(removed.joins().len(), q.joins().len() - usize::from(present));
        let survivors: Vec<usize> = q
            .joins()
            .iter()
            .filter(|j| j.alias.as_ref().map(|a| a.as_str()) != Some(target.as_str()))
            .map(|j| j.index.0)
            .collect();
        prop_assert_eq!(join_indices(&removed), survivors);
        prop_assert_eq!(removed.next_index(), q.next_index());
    }

    /// Registering an alias a second time is a no-op.
    #[test]
    fn prop_ensure_or_skip_is_idempotent(
        graph in arb_join_graph(),
        name in 1..=14usize,
        qualifier in arb_qualifier(),
    ) {
        let name = format!("j{name}");
        let once = ensure_or_skip(graph.build(), alias(&name), qualifier, table("u"), Expr::always());
        let twice = ensure_or_skip(once.clone(), alias(&name), qualifier, table("u"), Expr::always());
        prop_assert_eq!(twice, once);
    }

    /// Replacing an existing alias changes only that join's qualifier,
    /// source and condition.
    #[test]
    fn prop_replace_preserves_position(
        graph in arb_join_graph(),
        pick in any::<prop::sample::Index>(),
        qualifier in arb_qualifier(),
    ) {
        let q = graph.build();
        let position = pick.index(graph.join_count());
        let name = format!("j{}", position + 1);

        let replaced = replace_by_alias(q.clone(), alias(&name), qualifier, table("u"), Expr::always());

        prop_assert_eq!(join_aliases(&replaced), join_aliases(&q));
        prop_assert_eq!(join_indices(&replaced), join_indices(&q));
        for (i, (after, before)) in replaced.joins().iter().zip(q.joins()).enumerate() {
            if i == position {
                prop_assert_eq!(after.qualifier, qualifier);
                prop_assert_eq!(&after.on, &Expr::always());
            } else {
                prop_assert_eq!(after, before);
            }
        }
        prop_assert_eq!(&replaced.select, &q.select);
        prop_assert_eq!(&replaced.wheres, &q.wheres);
        prop_assert_eq!(replaced.next_index(), q.next_index());
    }

    /// Any mix of ensure and replace calls keeps aliases unique.
    #[test]
    fn prop_aliases_stay_unique(
        ops in prop::collection::vec((any::<bool>(), 0..6usize, arb_qualifier()), 0..24),
    ) {
        let mut q = posts();
        for (replace, name, qualifier) in ops {
            let name = format!("a{name}");
            q = if replace {
                replace_by_alias(q, alias(&name), qualifier, table("t"), Expr::always())
            } else {
                ensure_or_skip(q, alias(&name), qualifier, table("t"), Expr::always())
            };
        }
        let aliases = join_aliases(&q);
        let distinct: BTreeSet<&String> = aliases.iter().collect();
        prop_assert_eq!(distinct.len(), aliases.len());
    }
}
