//! Join qualifiers

use serde::{Deserialize, Serialize};

/// Join kind attached to every join in a query.
///
/// Association expansion defaults to [`Qualifier::Left`] so that parents
/// without related rows are still returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    /// Inner join
    Inner,
    /// Left outer join
    #[default]
    Left,
    /// Right outer join
    Right,
    /// Full outer join
    Full,
    /// Cross join (cartesian product, ON-expression is ignored)
    Cross,
}

impl Qualifier {
    /// Whether rows of the joined side may be absent from the output
    pub fn is_outer(self) -> bool {
        matches!(self, Qualifier::Left | Qualifier::Right | Qualifier::Full)
    }
}

impl std::fmt::Display for Qualifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Qualifier::Inner => write!(f, "inner"),
            Qualifier::Left => write!(f, "left"),
            Qualifier::Right => write!(f, "right"),
            Qualifier::Full => write!(f, "full"),
            Qualifier::Cross => write!(f, "cross"),
        }
    }
}
