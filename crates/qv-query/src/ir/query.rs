//! The query value: root source, joins, and clause slots

use super::expr::{BindingIndex, Expr};
use super::preload::PreloadTree;
use crate::error::QueryError;
use qv_core::{Alias, Qualifier, RelationName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Relation descriptor behind a binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// Plain table/relation
    Table {
        /// Relation name
        relation: RelationName,
    },

    /// Relation reached through an association of another binding
    Association {
        /// Binding that owns the association
        parent: BindingIndex,
        /// Association name on the parent
        association: String,
        /// Relation reached
        related: RelationName,
    },

    /// Nested query used as a relation
    Subquery(Box<QueryIR>),
}

impl Source {
    /// Table source for `relation`
    pub fn table(relation: impl Into<RelationName>) -> Self {
        Source::Table {
            relation: relation.into(),
        }
    }

    /// Relation whose associations apply to rows of this source.
    ///
    /// Subqueries have no catalog identity and return `None`.
    pub fn relation(&self) -> Option<&RelationName> {
        match self {
            Source::Table { relation } => Some(relation),
            Source::Association { related, .. } => Some(related),
            Source::Subquery(_) => None,
        }
    }
}

/// A join in a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// Binding index; assigned once, never renumbered
    pub index: BindingIndex,
    /// Optional alias, unique within the query
    pub alias: Option<Alias>,
    /// Join kind
    pub qualifier: Qualifier,
    /// Joined relation
    pub source: Source,
    /// ON-expression
    pub on: Expr,
}

/// Connective of a where/having entry with the entries before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolOp {
    /// Conjunction
    And,
    /// Disjunction
    Or,
}

/// One where/having entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolExpr {
    /// Connective
    pub op: BoolOp,
    /// Predicate
    pub expr: Expr,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// One order-by entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// Expression to sort by
    pub expr: Expr,
    /// Direction
    pub direction: SortDirection,
}

/// Read-only view of one binding of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding<'a> {
    /// Position of the binding
    pub index: BindingIndex,
    /// Alias (the root has none)
    pub alias: Option<&'a Alias>,
    /// Relation behind the binding
    pub source: &'a Source,
}

/// Query intermediate representation.
///
/// Joins and the binding counter are private so that alias uniqueness and
/// index stability can only change through the join registry. Deserialized
/// queries are checked against the same invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryIR")]
pub struct QueryIR {
    /// Root source, binding 0
    pub from: Source,

    joins: Vec<Join>,

    next_index: BindingIndex,

    /// Result shape
    #[serde(default)]
    pub select: Option<Expr>,

    /// Filters
    #[serde(default)]
    pub wheres: Vec<BoolExpr>,

    /// Ordering
    #[serde(default)]
    pub order_bys: Vec<SortKey>,

    /// Grouping
    #[serde(default)]
    pub group_bys: Vec<Expr>,

    /// Group filters
    #[serde(default)]
    pub havings: Vec<BoolExpr>,

    /// Row limit
    #[serde(default)]
    pub limit: Option<Expr>,

    /// Rows skipped
    #[serde(default)]
    pub offset: Option<Expr>,

    /// DISTINCT / DISTINCT ON
    #[serde(default)]
    pub distinct: Option<Expr>,

    /// Result-shaping preload forest
    #[serde(default)]
    pub preloads: Vec<PreloadTree>,
}

impl QueryIR {
    /// Empty query over `from`
    pub fn new(from: Source) -> Self {
        Self {
            from,
            joins: Vec::new(),
            next_index: BindingIndex::ROOT.next(),
            select: None,
            wheres: Vec::new(),
            order_bys: Vec::new(),
            group_bys: Vec::new(),
            havings: Vec::new(),
            limit: None,
            offset: None,
            distinct: None,
            preloads: Vec::new(),
        }
    }

    /// Empty query over the table `relation`
    pub fn from_relation(relation: impl Into<RelationName>) -> Self {
        Self::new(Source::table(relation))
    }

    /// Joins in declaration order
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// Join registered under `alias`
    pub fn join(&self, alias: &str) -> Option<&Join> {
        self.joins
            .iter()
            .find(|j| j.alias.as_ref().is_some_and(|a| a.as_str() == alias))
    }

    /// Whether a join is registered under `alias`
    pub fn has_join(&self, alias: &str) -> bool {
        self.join(alias).is_some()
    }

    /// Binding index of the join registered under `alias`
    pub fn binding_of(&self, alias: &str) -> Option<BindingIndex> {
        self.join(alias).map(|j| j.index)
    }

    /// Relation descriptor behind `index`, if the binding exists
    pub fn source_of(&self, index: BindingIndex) -> Option<&Source> {
        if index.is_root() {
            return Some(&self.from);
        }
        self.joins
            .iter()
            .find(|j| j.index == index)
            .map(|j| &j.source)
    }

    /// Root followed by every join, in declaration order
    pub fn bindings(&self) -> Vec<Binding<'_>> {
        std::iter::once(Binding {
            index: BindingIndex::ROOT,
            alias: None,
            source: &self.from,
        })
        .chain(self.joins.iter().map(|j| Binding {
            index: j.index,
            alias: j.alias.as_ref(),
            source: &j.source,
        }))
        .collect()
    }

    /// Index the next appended join will receive
    pub fn next_index(&self) -> BindingIndex {
        self.next_index
    }

    /// Set the result shape
    pub fn with_select(mut self, expr: Expr) -> Self {
        self.select = Some(expr);
        self
    }

    /// Add a filter combined with AND
    pub fn with_where(mut self, expr: Expr) -> Self {
        self.wheres.push(BoolExpr {
            op: BoolOp::And,
            expr,
        });
        self
    }

    /// Add a filter combined with OR
    pub fn or_where(mut self, expr: Expr) -> Self {
        self.wheres.push(BoolExpr { op: BoolOp::Or, expr });
        self
    }

    /// Add an ordering term
    pub fn with_order_by(mut self, expr: Expr, direction: SortDirection) -> Self {
        self.order_bys.push(SortKey { expr, direction });
        self
    }

    /// Add a grouping term
    pub fn with_group_by(mut self, expr: Expr) -> Self {
        self.group_bys.push(expr);
        self
    }

    /// Add a group filter combined with AND
    pub fn with_having(mut self, expr: Expr) -> Self {
        self.havings.push(BoolExpr {
            op: BoolOp::And,
            expr,
        });
        self
    }

    /// Set the row limit
    pub fn with_limit(mut self, expr: Expr) -> Self {
        self.limit = Some(expr);
        self
    }

    /// Set the offset
    pub fn with_offset(mut self, expr: Expr) -> Self {
        self.offset = Some(expr);
        self
    }

    /// Set DISTINCT / DISTINCT ON
    pub fn with_distinct(mut self, expr: Expr) -> Self {
        self.distinct = Some(expr);
        self
    }

    /// Append a join with the next index; callers guarantee alias uniqueness
    pub(crate) fn push_join(
        &mut self,
        alias: Option<Alias>,
        qualifier: Qualifier,
        source: Source,
        on: Expr,
    ) -> BindingIndex {
        let index = self.next_index;
        self.next_index = index.next();
        self.joins.push(Join {
            index,
            alias,
            qualifier,
            source,
            on,
        });
        index
    }

    pub(crate) fn joins_mut(&mut self) -> &mut Vec<Join> {
        &mut self.joins
    }
}

/// Wire shape of [`QueryIR`], validated before it becomes one
#[derive(Deserialize)]
struct RawQueryIR {
    from: Source,
    #[serde(default)]
    joins: Vec<Join>,
    next_index: BindingIndex,
    #[serde(default)]
    select: Option<Expr>,
    #[serde(default)]
    wheres: Vec<BoolExpr>,
    #[serde(default)]
    order_bys: Vec<SortKey>,
    #[serde(default)]
    group_bys: Vec<Expr>,
    #[serde(default)]
    havings: Vec<BoolExpr>,
    #[serde(default)]
    limit: Option<Expr>,
    #[serde(default)]
    offset: Option<Expr>,
    #[serde(default)]
    distinct: Option<Expr>,
    #[serde(default)]
    preloads: Vec<PreloadTree>,
}

impl TryFrom<RawQueryIR> for QueryIR {
    type Error = QueryError;

    fn try_from(raw: RawQueryIR) -> Result<Self, Self::Error> {
        let invalid = |message: String| QueryError::InvalidQuery { message };

        let mut aliases: HashSet<&str> = HashSet::new();
        let mut last = BindingIndex::ROOT;
        for join in &raw.joins {
            if join.index <= last {
                return Err(invalid(format!(
                    "join index {} must be greater than {}",
                    join.index, last
                )));
            }
            last = join.index;

            if let Some(alias) = &join.alias {
                if !aliases.insert(alias.as_str()) {
                    return Err(invalid(format!("alias '{alias}' is registered twice")));
                }
            }
        }

        if raw.next_index <= last {
            return Err(invalid(format!(
                "next_index {} must be greater than the last join index {}",
                raw.next_index, last
            )));
        }

        Ok(QueryIR {
            from: raw.from,
            joins: raw.joins,
            next_index: raw.next_index,
            select: raw.select,
            wheres: raw.wheres,
            order_bys: raw.order_bys,
            group_bys: raw.group_bys,
            havings: raw.havings,
            limit: raw.limit,
            offset: raw.offset,
            distinct: raw.distinct,
            preloads: raw.preloads,
        })
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
