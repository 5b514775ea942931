//! Nested association expansion: turns a [`NestedSpec`] tree into a flat,
//! ordered sequence of joins plus a mirrored preload forest.
//!
//! Expansion is depth-first and threads the query through every node. Each
//! association becomes a join under the alias `prefix ++ name`, registered
//! with [`ensure_or_skip`] so repeated or overlapping expansions reuse joins
//! instead of duplicating them.

pub mod spec;

use crate::error::{QueryError, QueryResult};
use crate::ir::expr::{BindingIndex, Expr};
use crate::ir::preload::{merge_forest, PreloadTree};
use crate::ir::query::{QueryIR, Source};
use crate::registry::ensure_or_skip;
use qv_core::{Alias, AssociationProvider, Config, Qualifier};

pub use spec::NestedSpec;

/// Expands nested specifications against an association provider
pub struct Expander<'a, P: AssociationProvider + ?Sized> {
    provider: &'a P,
    qualifier: Qualifier,
}

impl<'a, P: AssociationProvider + ?Sized> Expander<'a, P> {
    /// Expander producing left joins
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            qualifier: Qualifier::default(),
        }
    }

    /// Expander using the configured default qualifier
    pub fn from_config(provider: &'a P, config: &Config) -> Self {
        Self::new(provider).with_qualifier(config.default_qualifier)
    }

    /// Override the qualifier of generated joins
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Qualifier of generated joins
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Expand `spec` from the root binding.
    ///
    /// Returns the query with every requested join registered and the
    /// resulting preload forest merged into `query.preloads`. An empty
    /// specification returns the query unchanged.
    pub fn expand(&self, query: QueryIR, spec: &NestedSpec) -> QueryResult<QueryIR> {
        let (mut query, forest) = self.expand_node(query, spec, BindingIndex::ROOT, "", "$")?;
        if !forest.is_empty() {
            merge_forest(&mut query.preloads, forest);
        }
        Ok(query)
    }

    /// `path` locates `spec` within the specification, in the notation of
    /// [`NestedSpec::from_value`] errors.
    fn expand_node(
        &self,
        query: QueryIR,
        spec: &NestedSpec,
        parent: BindingIndex,
        prefix: &str,
        path: &str,
    ) -> QueryResult<(QueryIR, Vec<PreloadTree>)> {
        match spec {
            NestedSpec::Relation(name) => {
                let (query, alias, _) = self.join_association(query, parent, prefix, name, path)?;
                Ok((query, vec![PreloadTree::leaf(name.clone(), alias)]))
            }
            NestedSpec::Seq(items) => {
                let mut query = query;
                let mut forest = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    let (next, trees) = self.expand_node(query, item, parent, prefix, &item_path)?;
                    query = next;
                    forest.extend(trees);
                }
                Ok((query, forest))
            }
            NestedSpec::Nested(name, sub) => {
                let (query, alias, index) =
                    self.join_association(query, parent, prefix, name, path)?;
                let sub_path = format!("{path}.{name}");
                let (query, children) = self.expand_node(query, sub, index, prefix, &sub_path)?;
                Ok((
                    query,
                    vec![PreloadTree {
                        association: name.clone(),
                        alias,
                        children,
                    }],
                ))
            }
            NestedSpec::Prefixed(extra, sub) => {
                let prefix = format!("{prefix}{extra}");
                self.expand_node(query, sub, parent, &prefix, &format!("{path}.spec"))
            }
        }
    }

    /// Register the join for association `name` of `parent`, returning the
    /// query, the join's alias, and the binding now holding that alias.
    fn join_association(
        &self,
        query: QueryIR,
        parent: BindingIndex,
        prefix: &str,
        name: &str,
        path: &str,
    ) -> QueryResult<(QueryIR, Alias, BindingIndex)> {
        if name.is_empty() {
            return Err(QueryError::InvalidSpecification {
                path: path.to_string(),
                message: "association name must not be empty".to_string(),
            });
        }

        let source = query.source_of(parent);
        let relation = source.and_then(Source::relation).ok_or_else(|| {
            QueryError::UnknownAssociation {
                relation: match source {
                    Some(Source::Subquery(_)) => "<subquery>".to_string(),
                    _ => parent.to_string(),
                },
                association: name.to_string(),
            }
        })?;

        let assoc = self.provider.association(relation, name).ok_or_else(|| {
            QueryError::UnknownAssociation {
                relation: relation.to_string(),
                association: name.to_string(),
            }
        })?;

        let alias = Alias::prefixed(prefix, name);
        let index = query
            .binding_of(&alias)
            .unwrap_or_else(|| query.next_index());

        let on = Expr::equals(
            Expr::field(index, assoc.related_key),
            Expr::field(parent, assoc.owner_key),
        );
        let source = Source::Association {
            parent,
            association: assoc.name,
            related: assoc.related,
        };

        let query = ensure_or_skip(query, alias.clone(), self.qualifier, source, on);
        Ok((query, alias, index))
    }
}

/// Expand `spec` over `query` with the given provider and qualifier
pub fn expand_nested<P: AssociationProvider + ?Sized>(
    query: QueryIR,
    provider: &P,
    qualifier: Qualifier,
    spec: &NestedSpec,
) -> QueryResult<QueryIR> {
    Expander::new(provider)
        .with_qualifier(qualifier)
        .expand(query, spec)
}

#[cfg(test)]
#[path = "expand_test.rs"]
mod tests;
