//! Nested association specifications

use crate::error::{QueryError, QueryResult};
use serde_yaml::Value;

/// Tree-shaped description of related data to join and preload.
///
/// ```text
/// {comments: [author], author: []}
/// Seq([Nested("comments", Seq([Relation("author")])), Nested("author", Seq([]))])
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum NestedSpec {
    /// A single association name
    Relation(String),
    /// Siblings, expanded left to right
    Seq(Vec<NestedSpec>),
    /// An association and what to expand beneath it
    Nested(String, Box<NestedSpec>),
    /// A literal prefix prepended to every alias generated beneath it
    Prefixed(String, Box<NestedSpec>),
}

impl NestedSpec {
    /// `Relation(name)`
    pub fn relation(name: impl Into<String>) -> Self {
        NestedSpec::Relation(name.into())
    }

    /// `Seq(items)`
    pub fn seq(items: impl IntoIterator<Item = NestedSpec>) -> Self {
        NestedSpec::Seq(items.into_iter().collect())
    }

    /// `Nested(name, sub)`
    pub fn nested(name: impl Into<String>, sub: NestedSpec) -> Self {
        NestedSpec::Nested(name.into(), Box::new(sub))
    }

    /// `Prefixed(prefix, sub)`
    pub fn prefixed(prefix: impl Into<String>, sub: NestedSpec) -> Self {
        NestedSpec::Prefixed(prefix.into(), Box::new(sub))
    }

    /// Parse a specification from YAML (or JSON) text.
    ///
    /// See [`NestedSpec::from_value`] for the accepted shapes.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| QueryError::InvalidSpecification {
                path: "$".to_string(),
                message: e.to_string(),
            })?;
        Self::from_value(&value)
    }

    /// Build a specification from untyped data.
    ///
    /// - string: association name
    /// - sequence: siblings
    /// - `{prefix: <string>, spec: <node>}`: prefixed subtree
    /// - `{name: <node>}`: nested association; several entries are siblings
    ///
    /// Anything else is rejected with [`QueryError::InvalidSpecification`].
    pub fn from_value(value: &Value) -> QueryResult<Self> {
        from_value_at(value, "$")
    }
}

impl From<&str> for NestedSpec {
    fn from(name: &str) -> Self {
        NestedSpec::Relation(name.to_string())
    }
}

fn from_value_at(value: &Value, path: &str) -> QueryResult<NestedSpec> {
    match value {
        Value::String(name) => {
            if name.is_empty() {
                return Err(invalid(path, "association name must not be empty"));
            }
            Ok(NestedSpec::Relation(name.clone()))
        }
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| from_value_at(item, &format!("{path}[{i}]")))
            .collect::<QueryResult<Vec<_>>>()
            .map(NestedSpec::Seq),
        Value::Mapping(map) => {
            if map.is_empty() {
                return Err(invalid(path, "empty mapping"));
            }

            if let (Some(prefix), Some(spec), 2) = (map.get("prefix"), map.get("spec"), map.len()) {
                let prefix = prefix
                    .as_str()
                    .ok_or_else(|| invalid(&format!("{path}.prefix"), "prefix must be a string"))?;
                let sub = from_value_at(spec, &format!("{path}.spec"))?;
                return Ok(NestedSpec::prefixed(prefix, sub));
            }

            let mut entries = Vec::with_capacity(map.len());
            for (key, sub) in map {
                let name = match key.as_str() {
                    Some(name) if !name.is_empty() => name,
                    _ => return Err(invalid(path, "mapping keys must be non-empty association names")),
                };
                let sub = from_value_at(sub, &format!("{path}.{name}"))?;
                entries.push(NestedSpec::nested(name, sub));
            }

            if entries.len() == 1 {
                Ok(entries.remove(0))
            } else {
                Ok(NestedSpec::Seq(entries))
            }
        }
        Value::Null => Err(invalid(path, "expected an association, sequence, or mapping, found null")),
        Value::Bool(_) => Err(invalid(path, "expected an association, sequence, or mapping, found a boolean")),
        Value::Number(_) => Err(invalid(path, "expected an association, sequence, or mapping, found a number")),
        Value::Tagged(tagged) => Err(invalid(
            path,
            &format!("tagged values are not supported (tag {})", tagged.tag),
        )),
    }
}

fn invalid(path: &str, message: &str) -> QueryError {
    QueryError::InvalidSpecification {
        path: path.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string() {
        assert_eq!(NestedSpec::parse("comments").unwrap(), NestedSpec::relation("comments"));
    }

    #[test]
    fn test_parse_nested_and_siblings() {
        let spec = NestedSpec::parse("{comments: [author, likes], tags: []}").unwrap();
        assert_eq!(
            spec,
            NestedSpec::seq([
                NestedSpec::nested(
                    "comments",
                    NestedSpec::seq([NestedSpec::relation("author"), NestedSpec::relation("likes")])
                ),
                NestedSpec::nested("tags", NestedSpec::Seq(vec![])),
            ])
        );
    }

    #[test]
    fn test_parse_json_prefix_form() {
        let spec = NestedSpec::parse(r#"[{"prefix": "draft_", "spec": "comments"}]"#).unwrap();
        assert_eq!(
            spec,
            NestedSpec::seq([NestedSpec::prefixed("draft_", "comments".into())])
        );
    }

    #[test]
    fn test_prefix_key_alone_is_an_association() {
        let spec = NestedSpec::parse("{prefix: author}").unwrap();
        assert_eq!(spec, NestedSpec::nested("prefix", "author".into()));
    }

    #[test]
    fn test_reject_number_with_path() {
        let err = NestedSpec::parse("{comments: [author, 42]}").unwrap_err();
        match err {
            QueryError::InvalidSpecification { path, .. } => assert_eq!(path, "$.comments[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reject_null_bool_and_empty() {
        for text in ["~", "true", "''", "{}", "[comments, '']"] {
            assert!(
                matches!(NestedSpec::parse(text), Err(QueryError::InvalidSpecification { .. })),
                "expected InvalidSpecification for {text:?}"
            );
        }
    }

    #[test]
    fn test_reject_non_string_prefix() {
        let err = NestedSpec::parse("{prefix: 3, spec: comments}").unwrap_err();
        assert!(err.to_string().contains("$.prefix"), "got: {err}");
    }

    #[test]
    fn test_reject_malformed_text() {
        assert!(matches!(
            NestedSpec::parse("[unclosed"),
            Err(QueryError::InvalidSpecification { .. })
        ));
    }
}
