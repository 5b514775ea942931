//! Strongly-typed names used throughout the join graph.
//!
//! Relation names and join aliases are both plain strings at the edges of
//! the system, but mixing them up (joining on an alias where a relation was
//! meant) is exactly the kind of slip that yields a silently wrong join.

/// Generate a non-empty string wrapper with the usual borrowing impls.
macro_rules! name_type {
    ($(#[$meta:meta])* $Name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        pub struct $Name(String);

        impl $Name {
            /// Create a new name.
            ///
            /// # Panics
            ///
            /// Panics if `name` is empty. Use [`try_new`](Self::try_new) for
            /// untrusted input.
            pub fn new(name: impl Into<String>) -> Self {
                let s = name.into();
                assert!(!s.is_empty(), concat!(stringify!($Name), " must not be empty"));
                Self(s)
            }

            /// Create a new name, returning `None` if it is empty.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let s = name.into();
                (!s.is_empty()).then_some(Self(s))
            }

            /// Borrow the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " must not be empty"))
                })
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        // Panics on an empty string, like `new`
        impl From<&str> for $Name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

name_type! {
    /// Name of a relation (table or schema) known to the catalog.
    RelationName
}

name_type! {
    /// Symbolic name that uniquely identifies one join within a query.
    Alias
}

impl Alias {
    /// Build the alias for `name` nested under `prefix`.
    ///
    /// The prefix is prepended verbatim; an empty prefix yields `name` itself.
    pub fn prefixed(prefix: &str, name: &str) -> Self {
        let mut s = String::with_capacity(prefix.len() + name.len());
        s.push_str(prefix);
        s.push_str(name);
        Self::new(s)
    }
}
