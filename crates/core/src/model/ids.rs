use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued identifier for a study session.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

/// Server-issued identifier for a deck.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeckId(String);

/// Server-issued identifier for a card.
///
/// The wire value may arrive as a JSON string or number; both are normalized
/// to the decimal string form, so `CardId` comparisons are stable across
/// response variants.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(String);

macro_rules! opaque_id {
    ($name:ident) => {
        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(SessionId);
opaque_id!(DeckId);
opaque_id!(CardId);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_id_display_is_raw_value() {
        let id = CardId::new("42");
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(SessionId::from("s1"), SessionId::new(String::from("s1")));
        assert_ne!(DeckId::from("d1"), DeckId::from("d2"));
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", SessionId::new("abc")), "SessionId(abc)");
    }
}
