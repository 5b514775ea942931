//! Preload trees: which joined relations nest into which result objects

use qv_core::Alias;
use serde::{Deserialize, Serialize};

/// One node of the preload forest.
///
/// Mirrors the join nesting built by association expansion: `association`
/// is the name the rows nest under in the parent object, `alias` the join
/// that supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadTree {
    /// Association name on the parent
    pub association: String,
    /// Alias of the join supplying the rows
    pub alias: Alias,
    /// Nested preloads
    #[serde(default)]
    pub children: Vec<PreloadTree>,
}

impl PreloadTree {
    /// Leaf node
    pub fn leaf(association: impl Into<String>, alias: Alias) -> Self {
        Self {
            association: association.into(),
            alias,
            children: Vec::new(),
        }
    }

    /// Visit every alias in this tree, pre-order
    pub fn for_each_alias(&self, f: &mut impl FnMut(&Alias)) {
        f(&self.alias);
        for child in &self.children {
            child.for_each_alias(f);
        }
    }
}

/// Merge `incoming` into `forest`.
///
/// A tree whose alias is already present at the same level has its children
/// merged recursively; anything else is appended in order. Merging the same
/// forest twice therefore leaves it unchanged.
pub fn merge_forest(forest: &mut Vec<PreloadTree>, incoming: Vec<PreloadTree>) {
    for tree in incoming {
        match forest.iter_mut().find(|t| t.alias == tree.alias) {
            Some(existing) => merge_forest(&mut existing.children, tree.children),
            None => forest.push(tree),
        }
    }
}
