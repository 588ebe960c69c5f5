use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                uuid::Uuid::parse_str(trimmed)
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId {
                        kind: $kind,
                        input: trimmed.to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`Document`](crate::Document).
    DocumentId,
    "document"
);

uuid_id!(
    /// Identifier of a [`Version`](crate::Version).
    VersionId,
    "version"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
        assert_ne!(VersionId::new(), VersionId::new());
    }

    #[test]
    fn ids_are_time_ordered() {
        let first = VersionId::new();
        let second = VersionId::new();
        assert!(first < second);
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        let id = VersionId::new();
        let parsed: VersionId = format!("  {id}\n").parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<DocumentId>().unwrap_err();
        match err {
            TypeError::InvalidId { kind, input, .. } => {
                assert_eq!(kind, "document");
                assert_eq!(input, "not-a-uuid");
            }
        }
    }

    #[test]
    fn short_id_is_eight_chars() {
        assert_eq!(VersionId::new().short_id().len(), 8);
    }

    #[test]
    fn debug_names_the_type() {
        let id = DocumentId::new();
        assert!(format!("{id:?}").starts_with("DocumentId("));
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id = VersionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: VersionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
