//! Association metadata: the provider trait and its YAML-backed catalog
//!
//! The join engine never inspects schemas itself. It asks an
//! [`AssociationProvider`] how two relations are connected and builds the
//! join condition from the answer. [`Catalog`] is the stock provider, loaded
//! from one or more schema files:
//!
//! ```yaml
//! relations:
//!   - name: posts
//!     fields: [id, title, author_id]
//!     associations:
//!       - { name: comments, kind: has_many, related: comments, related_key: post_id }
//!       - { name: author, kind: belongs_to, related: users }
//! ```

use crate::error::{CoreError, CoreResult};
use crate::names::RelationName;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Cardinality of an association, seen from its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Owner holds the foreign key (`posts.author_id -> users.id`)
    BelongsTo,
    /// Related side holds the foreign key, at most one row
    HasOne,
    /// Related side holds the foreign key, any number of rows
    HasMany,
}

impl std::fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssociationKind::BelongsTo => write!(f, "belongs_to"),
            AssociationKind::HasOne => write!(f, "has_one"),
            AssociationKind::HasMany => write!(f, "has_many"),
        }
    }
}

/// A resolved association between two relations.
///
/// The default join condition is `related.related_key = owner.owner_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Association name as used in nested specifications
    pub name: String,
    /// Cardinality
    pub kind: AssociationKind,
    /// Relation that declares the association
    pub owner: RelationName,
    /// Relation reached through the association
    pub related: RelationName,
    /// Key column on the owner side
    pub owner_key: String,
    /// Key column on the related side
    pub related_key: String,
}

/// Schema/association metadata collaborator.
pub trait AssociationProvider {
    /// Resolve association `name` declared on `relation`
    fn association(&self, relation: &str, name: &str) -> Option<Association>;

    /// Whether `relation` declares `field`
    fn has_field(&self, relation: &str, field: &str) -> bool;
}

/// One schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    /// Relations declared in this file
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

/// A relation declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDef {
    /// Relation name
    pub name: RelationName,

    /// Field names
    #[serde(default)]
    pub fields: Vec<String>,

    /// Outgoing associations
    #[serde(default)]
    pub associations: Vec<AssociationDef>,
}

/// An association declaration, before key defaults are applied
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationDef {
    /// Association name
    pub name: String,

    /// Cardinality
    pub kind: AssociationKind,

    /// Target relation
    pub related: RelationName,

    /// Owner-side key (belongs_to: `<name>_id`, otherwise `id`)
    #[serde(default)]
    pub owner_key: Option<String>,

    /// Related-side key (belongs_to: `id`, otherwise required)
    #[serde(default)]
    pub related_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct RelationEntry {
    fields: HashSet<String>,
    associations: HashMap<String, Association>,
    origin: String,
}

/// In-memory association catalog built from schema files
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    relations: HashMap<RelationName, RelationEntry>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a single schema file
    pub fn load(path: &Path) -> CoreResult<Self> {
        Self::load_all(&[path.to_path_buf()])
    }

    /// Load and merge several schema files into one catalog.
    ///
    /// Relations may reference relations declared in any of the files.
    pub fn load_all(paths: &[PathBuf]) -> CoreResult<Self> {
        let mut catalog = Self::new();
        for path in paths {
            let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
            let file: SchemaFile = serde_yaml::from_str(&content)?;
            catalog.add_file(file, &path.display().to_string())?;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Build a catalog from YAML text
    pub fn from_yaml_str(yaml: &str) -> CoreResult<Self> {
        let file: SchemaFile = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::new();
        catalog.add_file(file, "<inline>")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Number of declared relations
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the catalog declares no relations
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Whether `relation` is declared
    pub fn contains(&self, relation: &str) -> bool {
        self.relations.contains_key(relation)
    }

    fn add_file(&mut self, file: SchemaFile, origin: &str) -> CoreResult<()> {
        let count = file.relations.len();
        for def in file.relations {
            if self.relations.contains_key(def.name.as_str()) {
                return Err(CoreError::DuplicateRelation {
                    name: def.name.to_string(),
                    path: origin.to_string(),
                });
            }

            let mut entry = RelationEntry {
                fields: def.fields.into_iter().collect(),
                associations: HashMap::with_capacity(def.associations.len()),
                origin: origin.to_string(),
            };
            for assoc in def.associations {
                let resolved = resolve_association(&def.name, assoc)?;
                if entry.associations.contains_key(&resolved.name) {
                    return Err(CoreError::DuplicateAssociation {
                        relation: def.name.to_string(),
                        association: resolved.name,
                    });
                }
                entry.associations.insert(resolved.name.clone(), resolved);
            }
            self.relations.insert(def.name, entry);
        }
        log::debug!("Loaded {} relation(s) from {}", count, origin);
        Ok(())
    }

    /// Every association must target a declared relation
    fn validate(&self) -> CoreResult<()> {
        for (name, entry) in &self.relations {
            for assoc in entry.associations.values() {
                if !self.relations.contains_key(assoc.related.as_str()) {
                    log::debug!(
                        "Association '{}' declared in {} has no target",
                        assoc.name,
                        entry.origin
                    );
                    return Err(CoreError::UnknownRelatedRelation {
                        relation: name.to_string(),
                        association: assoc.name.clone(),
                        related: assoc.related.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Apply the per-kind key defaults
fn resolve_association(owner: &RelationName, def: AssociationDef) -> CoreResult<Association> {
    let (owner_key, related_key) = match def.kind {
        AssociationKind::BelongsTo => (
            def.owner_key.unwrap_or_else(|| format!("{}_id", def.name)),
            def.related_key.unwrap_or_else(|| "id".to_string()),
        ),
        AssociationKind::HasOne | AssociationKind::HasMany => {
            let related_key = def.related_key.ok_or_else(|| CoreError::MissingRelatedKey {
                relation: owner.to_string(),
                association: def.name.clone(),
                kind: def.kind.to_string(),
            })?;
            (def.owner_key.unwrap_or_else(|| "id".to_string()), related_key)
        }
    };

    Ok(Association {
        name: def.name,
        kind: def.kind,
        owner: owner.clone(),
        related: def.related,
        owner_key,
        related_key,
    })
}

impl AssociationProvider for Catalog {
    fn association(&self, relation: &str, name: &str) -> Option<Association> {
        self.relations
            .get(relation)
            .and_then(|entry| entry.associations.get(name))
            .cloned()
    }

    fn has_field(&self, relation: &str, field: &str) -> bool {
        self.relations
            .get(relation)
            .is_some_and(|entry| entry.fields.contains(field))
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
