//! Join registry: alias-addressed join operations over the ordered join list
//!
//! Every operation consumes a [`QueryIR`] and returns the resulting query.
//! Aliases are unique: a lookup-then-append keeps independently composed
//! query fragments from registering the same join twice, while declaration
//! order is preserved for deterministic output.

use crate::error::{QueryError, QueryResult};
use crate::ir::expr::Expr;
use crate::ir::query::{QueryIR, Source};
use crate::walk::count_uses;
use qv_core::{Alias, Qualifier, RemovalPolicy};

/// Append a join under `alias` unless one is already registered.
///
/// An existing join is left untouched even when the request differs from
/// it, which makes the operation idempotent.
pub fn ensure_or_skip(
    mut query: QueryIR,
    alias: Alias,
    qualifier: Qualifier,
    source: Source,
    on: Expr,
) -> QueryIR {
    if let Some(existing) = query.join(&alias) {
        if existing.qualifier != qualifier || existing.source != source || existing.on != on {
            log::debug!(
                "Join '{}' already registered at {}, ignoring differing request",
                alias,
                existing.index
            );
        }
        return query;
    }

    let index = query.push_join(Some(alias), qualifier, source, on);
    log::debug!("Registered join {}", index);
    query
}

/// Replace the join registered under `alias` in place.
///
/// The replacement keeps the original binding index and list position;
/// every other join and clause is carried over as is. Without an existing
/// join this behaves like [`ensure_or_skip`].
pub fn replace_by_alias(
    mut query: QueryIR,
    alias: Alias,
    qualifier: Qualifier,
    source: Source,
    on: Expr,
) -> QueryIR {
    let position = query
        .joins()
        .iter()
        .position(|j| j.alias.as_ref() == Some(&alias));

    match position {
        Some(pos) => {
            let join = &mut query.joins_mut()[pos];
            log::debug!("Replacing join '{}' at {}", alias, join.index);
            join.qualifier = qualifier;
            join.source = source;
            join.on = on;
            query
        }
        None => ensure_or_skip(query, alias, qualifier, source, on),
    }
}

/// Remove the join registered under `alias`.
///
/// Surviving joins keep their indices and order. An unknown alias leaves
/// the query unchanged.
///
/// Other clauses and joins are NOT checked for references to the removed
/// binding; referential integrity is left to a later compile stage. Use
/// [`remove_by_alias_checked`] to refuse such removals instead.
pub fn remove_by_alias(mut query: QueryIR, alias: &str) -> QueryIR {
    let before = query.joins().len();
    query
        .joins_mut()
        .retain(|j| j.alias.as_ref().map(Alias::as_str) != Some(alias));
    if query.joins().len() != before {
        log::debug!("Removed join '{}'", alias);
    }
    query
}

/// Remove the join registered under `alias`, refusing if its binding is
/// still referenced by a clause, another join's ON-expression, or a preload.
pub fn remove_by_alias_checked(query: QueryIR, alias: &str) -> QueryResult<QueryIR> {
    if let Some(index) = query.binding_of(alias) {
        let count = count_uses(&query, index);
        if count > 0 {
            return Err(QueryError::DanglingReference {
                alias: alias.to_string(),
                binding: index,
                count,
            });
        }
    }
    Ok(remove_by_alias(query, alias))
}

/// Remove `alias` following the configured [`RemovalPolicy`]
pub fn remove_with_policy(
    query: QueryIR,
    alias: &str,
    policy: RemovalPolicy,
) -> QueryResult<QueryIR> {
    match policy {
        RemovalPolicy::Permissive => Ok(remove_by_alias(query, alias)),
        RemovalPolicy::Validating => remove_by_alias_checked(query, alias),
    }
}

/// Append a join without an alias.
///
/// Anonymous joins can never be reused, replaced, or removed by alias.
pub fn append_join(mut query: QueryIR, qualifier: Qualifier, source: Source, on: Expr) -> QueryIR {
    query.push_join(None, qualifier, source, on);
    query
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
