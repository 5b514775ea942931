//! qv-query: join-graph manipulation and dead join elimination
//!
//! This crate provides the query IR, alias-addressed join registration,
//! nested association expansion, and composable passes over the IR, the
//! main one being liveness-based dead join elimination.

pub mod error;
pub mod expand;
pub mod graph;
pub mod ir;
pub mod pass;
pub mod registry;
pub mod walk;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::{QueryError, QueryResult};
pub use expand::{expand_nested, Expander, NestedSpec};
pub use graph::JoinDependencyGraph;
pub use ir::expr::{BindingIndex, Expr, LiteralValue, Op};
pub use ir::preload::PreloadTree;
pub use ir::query::{Binding, BoolExpr, BoolOp, Join, QueryIR, SortDirection, SortKey, Source};
pub use pass::dangling_refs::{dangling_references, DanglingReferences};
pub use pass::dead_joins::{eliminate_dead_joins, live_bindings, DeadJoinElimination};
pub use pass::{
    Diagnostic, DiagnosticCode, DiagnosticSink, LogSink, PassManager, QueryPass, Severity,
};
pub use registry::{
    append_join, ensure_or_skip, remove_by_alias, remove_by_alias_checked, remove_with_policy,
    replace_by_alias,
};
