//! Entity identifiers
//!
//! Every entity is keyed by a UUIDv7 held as a raw `u128`. UUIDv7 sorts
//! chronologically, which the store relies on to break ties between rows
//! created in the same millisecond.

use std::fmt;

/// Error returned when an identifier string is not a valid UUID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidId(pub String);

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid identifier: {}", self.0)
    }
}

impl std::error::Error for InvalidId {}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u128);

        impl $name {
            /// Generate a new UUIDv7-based identifier
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7().as_u128())
            }

            /// Create an identifier from a raw u128 value
            ///
            /// This is primarily for storage layer deserialization.
            pub fn from_value(value: u128) -> Self {
                Self(value)
            }

            /// Parse an identifier from its hyphenated UUID form
            pub fn from_string(s: &str) -> Result<Self, InvalidId> {
                uuid::Uuid::parse_str(s)
                    .map(|u| Self(u.as_u128()))
                    .map_err(|e| InvalidId(format!("'{}': {}", s, e)))
            }

            /// Get the raw u128 value
            pub fn value(&self) -> u128 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", uuid::Uuid::from_u128(self.0))
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_string(s)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user
    UserId
);

entity_id!(
    /// Identifier of a post (the content item that can be liked)
    PostId
);

entity_id!(
    /// Identifier of a comment on a post
    CommentId
);

entity_id!(
    /// Identifier of a notification
    NotificationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_chronological() {
        let a = PostId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = PostId::new();
        assert!(a < b);
    }

    #[test]
    fn test_display_and_parse() {
        let id = UserId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(UserId::from_string(&text).unwrap(), id);
        assert_eq!(text.parse::<UserId>().unwrap(), id);
    }

    #[test]
    fn test_invalid_string() {
        assert!(UserId::from_string("not-a-uuid").is_err());
        assert!(CommentId::from_string("").is_err());
    }
}
