//! DanglingReferences pass: reports references to bindings that no longer
//! exist (Q002). Never modifies the query.

use crate::ir::expr::BindingIndex;
use crate::ir::query::QueryIR;
use crate::pass::{Diagnostic, DiagnosticCode, DiagnosticSink, QueryPass, Severity};
use crate::walk::{for_each_clause_expr, walk_binding_refs};
use std::collections::{BTreeMap, HashSet};

const PASS_NAME: &str = "dangling_refs";

/// Dangling reference detection pass
pub struct DanglingReferences;

impl QueryPass for DanglingReferences {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        "Reports references to bindings that are neither the root nor a present join"
    }

    fn run(&self, query: QueryIR, sink: &mut dyn DiagnosticSink) -> QueryIR {
        for (binding, count) in dangling_references(&query) {
            sink.report(Diagnostic {
                code: DiagnosticCode::Q002,
                severity: Severity::Warning,
                message: format!(
                    "Binding {binding} is referenced {count} time(s) but no join provides it"
                ),
                alias: None,
                binding: Some(binding),
                pass_name: PASS_NAME.to_string(),
            });
        }

        let present: HashSet<&str> = query
            .joins()
            .iter()
            .filter_map(|j| j.alias.as_ref().map(|a| a.as_str()))
            .collect();
        for tree in &query.preloads {
            tree.for_each_alias(&mut |alias| {
                if !present.contains(alias.as_str()) {
                    sink.report(Diagnostic {
                        code: DiagnosticCode::Q002,
                        severity: Severity::Warning,
                        message: format!("Preload '{alias}' names no join"),
                        alias: Some(alias.to_string()),
                        binding: None,
                        pass_name: PASS_NAME.to_string(),
                    });
                }
            });
        }

        query
    }
}

/// Missing bindings referenced by clauses or ON-expressions, with the
/// number of references to each
pub fn dangling_references(query: &QueryIR) -> BTreeMap<BindingIndex, usize> {
    let present: HashSet<BindingIndex> = query.bindings().iter().map(|b| b.index).collect();
    let mut missing: BTreeMap<BindingIndex, usize> = BTreeMap::new();
    let mut tally = |b: BindingIndex| {
        if !present.contains(&b) {
            *missing.entry(b).or_default() += 1;
        }
    };

    for_each_clause_expr(query, |e| walk_binding_refs(e, &mut tally));
    for join in query.joins() {
        walk_binding_refs(&join.on, &mut tally);
    }

    missing
}
