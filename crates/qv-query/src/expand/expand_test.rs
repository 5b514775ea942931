use super::*;
use crate::registry::ensure_or_skip;
use crate::test_utils::*;
use qv_core::RemovalPolicy;

fn expand(query: QueryIR, spec: &NestedSpec) -> QueryResult<QueryIR> {
    let catalog = blog_catalog();
    Expander::new(&catalog).expand(query, spec)
}

fn preload_shape(trees: &[PreloadTree]) -> Vec<String> {
    fn walk(tree: &PreloadTree, out: &mut Vec<String>, depth: usize) {
        out.push(format!("{}{}:{}", "  ".repeat(depth), tree.association, tree.alias));
        for child in &tree.children {
            walk(child, out, depth + 1);
        }
    }
    let mut out = Vec::new();
    for tree in trees {
        walk(tree, &mut out, 0);
    }
    out
}

#[test]
fn test_single_relation() {
    let q = expand(posts(), &NestedSpec::relation("comments")).unwrap();

    assert_eq!(q.joins().len(), 1);
    let join = &q.joins()[0];
    assert_eq!(join.index, BindingIndex(1));
    assert_eq!(join.alias.as_ref().unwrap(), "comments");
    assert_eq!(join.qualifier, Qualifier::Left);
    assert_eq!(
        join.source,
        Source::Association {
            parent: BindingIndex::ROOT,
            association: "comments".to_string(),
            related: "comments".into(),
        }
    );
    assert_eq!(join.on, Expr::equals(f(1, "post_id"), f(0, "id")));
    assert_eq!(preload_shape(&q.preloads), vec!["comments:comments"]);
}

#[test]
fn test_nested_relation_joins_from_parent_alias() {
    let spec = NestedSpec::parse("{comments: [author]}").unwrap();
    let q = expand(posts(), &spec).unwrap();

    assert_eq!(join_aliases(&q), vec!["comments", "author"]);
    let author = q.join("author").unwrap();
    assert_eq!(author.index, BindingIndex(2));
    assert_eq!(author.on, Expr::equals(f(2, "id"), f(1, "user_id")));
    assert!(matches!(
        author.source,
        Source::Association { parent: BindingIndex(1), .. }
    ));
    assert_eq!(
        preload_shape(&q.preloads),
        vec!["comments:comments", "  author:author"]
    );
}

#[test]
fn test_sequence_preserves_declaration_order() {
    let spec = NestedSpec::parse("[tags, author, comments]").unwrap();
    let q = expand(posts(), &spec).unwrap();
    assert_eq!(join_aliases(&q), vec!["tags", "author", "comments"]);
    assert_eq!(join_indices(&q), vec![1, 2, 3]);
    assert_eq!(q.preloads.len(), 3);
}

#[test]
fn test_same_name_under_two_parents_reuses_first_join() {
    // Without a prefix the root-level `author` collides with comments' author
    let spec = NestedSpec::parse("[{comments: [author]}, author]").unwrap();
    let q = expand(posts(), &spec).unwrap();
    assert_eq!(join_aliases(&q), vec!["comments", "author"]);
}

#[test]
fn test_prefix_disambiguates_branches() {
    let spec = NestedSpec::seq([
        NestedSpec::nested(
            "comments",
            NestedSpec::prefixed("comment_", NestedSpec::relation("author")),
        ),
        NestedSpec::relation("author"),
    ]);
    let q = expand(posts(), &spec).unwrap();

    assert_eq!(join_aliases(&q), vec!["comments", "comment_author", "author"]);
    assert_eq!(
        q.join("comment_author").unwrap().on,
        Expr::equals(f(2, "id"), f(1, "user_id"))
    );
    assert_eq!(
        q.join("author").unwrap().on,
        Expr::equals(f(3, "id"), f(0, "author_id"))
    );
    assert_eq!(
        preload_shape(&q.preloads),
        vec!["comments:comments", "  author:comment_author", "author:author"]
    );
}

#[test]
fn test_prefix_applies_to_nested_levels() {
    let spec = NestedSpec::prefixed(
        "p_",
        NestedSpec::nested("comments", NestedSpec::relation("post")),
    );
    let q = expand(posts(), &spec).unwrap();
    assert_eq!(join_aliases(&q), vec!["p_comments", "p_post"]);
    assert_eq!(preload_shape(&q.preloads), vec!["comments:p_comments", "  post:p_post"]);
}

#[test]
fn test_empty_sequence_is_noop() {
    let base = posts().with_select(row(0));
    let q = expand(base.clone(), &NestedSpec::Seq(vec![])).unwrap();
    assert_eq!(q, base);
}

#[test]
fn test_unknown_association_fails_immediately() {
    let spec = NestedSpec::parse("[comments, bogus, tags]").unwrap();
    let err = expand(posts(), &spec).unwrap_err();
    match err {
        QueryError::UnknownAssociation {
            relation,
            association,
        } => {
            assert_eq!(relation, "posts");
            assert_eq!(association, "bogus");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_nested_association_names_parent_relation() {
    let spec = NestedSpec::parse("{comments: [tags]}").unwrap();
    let err = expand(posts(), &spec).unwrap_err();
    assert!(
        matches!(err, QueryError::UnknownAssociation { ref relation, .. } if relation == "comments"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_subquery_root_has_no_associations() {
    let sub = QueryIR::new(Source::Subquery(Box::new(posts())));
    let err = expand(sub, &NestedSpec::relation("comments")).unwrap_err();
    assert!(
        matches!(err, QueryError::UnknownAssociation { ref relation, .. } if relation == "<subquery>")
    );
}

#[test]
fn test_empty_relation_name_is_invalid() {
    let err = expand(posts(), &NestedSpec::relation("")).unwrap_err();
    assert!(
        matches!(err, QueryError::InvalidSpecification { ref path, .. } if path == "$"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_empty_nested_name_reports_spec_path() {
    let spec = NestedSpec::seq([
        NestedSpec::relation("tags"),
        NestedSpec::nested(
            "comments",
            NestedSpec::prefixed("c_", NestedSpec::seq([NestedSpec::relation("")])),
        ),
    ]);
    match expand(posts(), &spec).unwrap_err() {
        QueryError::InvalidSpecification { path, .. } => {
            assert_eq!(path, "$[1].comments.spec[0]");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_qualifier_override_and_config() {
    let catalog = blog_catalog();
    let q = Expander::new(&catalog)
        .with_qualifier(Qualifier::Inner)
        .expand(posts(), &NestedSpec::relation("author"))
        .unwrap();
    assert_eq!(q.joins()[0].qualifier, Qualifier::Inner);

    let config = Config {
        default_qualifier: Qualifier::Right,
        removal: RemovalPolicy::Permissive,
        schema_paths: vec![],
    };
    let expander = Expander::from_config(&catalog, &config);
    assert_eq!(expander.qualifier(), Qualifier::Right);
}

#[test]
fn test_expanding_twice_equals_once() {
    let spec = NestedSpec::parse("[{comments: [author]}, tags]").unwrap();
    let once = expand(posts(), &spec).unwrap();
    let twice = expand(once.clone(), &spec).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_overlapping_expansions_extend_preloads() {
    let q = expand(posts(), &NestedSpec::parse("{comments: [author]}").unwrap()).unwrap();
    let q = expand(q, &NestedSpec::parse("{comments: [post]}").unwrap()).unwrap();
    assert_eq!(join_aliases(&q), vec!["comments", "author", "post"]);
    assert_eq!(
        preload_shape(&q.preloads),
        vec!["comments:comments", "  author:author", "  post:post"]
    );
}

#[test]
fn test_existing_manual_join_is_reused_as_parent() {
    let q = ensure_or_skip(
        posts(),
        alias("comments"),
        Qualifier::Inner,
        table("comments"),
        Expr::equals(f(1, "post_id"), f(0, "id")),
    );
    let q = expand(q, &NestedSpec::parse("{comments: [author]}").unwrap()).unwrap();

    let comments = q.join("comments").unwrap();
    assert_eq!(comments.qualifier, Qualifier::Inner, "manual join is kept");
    assert_eq!(comments.source, table("comments"));
    // The manual join's source is a plain table, so associations resolve on it
    assert_eq!(
        q.join("author").unwrap().on,
        Expr::equals(f(2, "id"), f(1, "user_id"))
    );
}

#[test]
fn test_expand_nested_function() {
    let catalog = blog_catalog();
    let q = expand_nested(
        posts(),
        &catalog,
        Qualifier::Full,
        &NestedSpec::relation("tags"),
    )
    .unwrap();
    assert_eq!(q.joins()[0].qualifier, Qualifier::Full);
}
