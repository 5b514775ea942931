//! qv-core - Core library for Quiver
//!
//! This crate provides the shared vocabulary of the join engine: strongly
//! typed relation names and aliases, join qualifiers, the association
//! metadata provider with its YAML-backed catalog, and engine configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod names;
pub mod qualifier;

pub use catalog::{Association, AssociationKind, AssociationProvider, Catalog};
pub use config::{Config, RemovalPolicy};
pub use error::{CoreError, CoreResult};
pub use names::{Alias, RelationName};
pub use qualifier::Qualifier;
