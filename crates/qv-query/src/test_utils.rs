//! Shared test utilities for qv-query

use crate::ir::expr::{BindingIndex, Expr};
use crate::ir::query::{QueryIR, Source};
use qv_core::{Alias, Catalog};

/// Blog schema used across tests: posts, comments, users, tags
pub const BLOG_SCHEMA: &str = r#"
relations:
  - name: posts
    fields: [id, title, author_id]
    associations:
      - { name: comments, kind: has_many, related: comments, related_key: post_id }
      - { name: author, kind: belongs_to, related: users }
      - { name: tags, kind: has_many, related: tags, related_key: post_id }
  - name: comments
    fields: [id, post_id, user_id, body]
    associations:
      - { name: author, kind: belongs_to, related: users, owner_key: user_id }
      - { name: post, kind: belongs_to, related: posts }
  - name: users
    fields: [id, name]
    associations:
      - { name: posts, kind: has_many, related: posts, related_key: author_id }
  - name: tags
    fields: [id, post_id, label]
"#;

/// Catalog built from [`BLOG_SCHEMA`]
pub fn blog_catalog() -> Catalog {
    Catalog::from_yaml_str(BLOG_SCHEMA).expect("blog schema must load")
}

/// `from p in posts`
pub fn posts() -> QueryIR {
    QueryIR::from_relation("posts")
}

/// Shorthand for a field reference on binding `i`
pub fn f(i: usize, field: &str) -> Expr {
    Expr::field(BindingIndex(i), field)
}

/// Shorthand for a whole-row reference on binding `i`
pub fn row(i: usize) -> Expr {
    Expr::binding(BindingIndex(i))
}

/// Shorthand for an alias
pub fn alias(name: &str) -> Alias {
    Alias::new(name)
}

/// Shorthand for a table source
pub fn table(name: &str) -> Source {
    Source::table(name)
}

/// Aliases of the query's joins, in order
pub fn join_aliases(query: &QueryIR) -> Vec<String> {
    query
        .joins()
        .iter()
        .map(|j| j.alias.as_ref().map(|a| a.to_string()).unwrap_or_default())
        .collect()
}

/// Indices of the query's joins, in order
pub fn join_indices(query: &QueryIR) -> Vec<usize> {
    query.joins().iter().map(|j| j.index.0).collect()
}
