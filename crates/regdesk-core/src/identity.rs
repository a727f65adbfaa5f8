//! # Identifier Newtypes
//!
//! Every backend row is keyed by a UUID. Each table gets its own wrapper so
//! that a company identifier can never be handed to a law lookup.
//!
//! All identifiers serialize as the bare UUID string, matching the backend's
//! `id` / `id_*` columns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a row in the `companies` table.
    CompanyId
);

uuid_identifier!(
    /// Identifier of a domain, activity, or market row.
    ///
    /// The three tag tables share one identifier type; the [`crate::TagKind`]
    /// travelling alongside it says which table the row lives in.
    TagId
);

uuid_identifier!(
    /// Identifier of a row in the `laws_and_regulations` table.
    LawId
);

uuid_identifier!(
    /// Identifier of a row in the `control_framework` table.
    ControlFrameworkId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_serialize_as_bare_uuid() {
        let raw = Uuid::new_v4();
        let id = CompanyId::from_uuid(raw);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{raw}\""));
        let back: CompanyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn identifiers_parse_from_str() {
        let id: LawId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert!("not-a-uuid".parse::<TagId>().is_err());
    }

    #[test]
    fn new_identifiers_are_unique() {
        assert_ne!(ControlFrameworkId::new(), ControlFrameworkId::new());
    }
}
