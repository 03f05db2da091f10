//! Typed ID wrappers for agent, session, and event identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrappers keep the three identifier kinds from being confused
/// with one another in signatures. Each holds a plain `String` and the
/// core imposes no structure on the text: callers that need determinism
/// supply their own ids, and [`EventId::generate`] / [`SessionId::generate`]
/// mint UUIDs when nobody does.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an owned or borrowed string as this identifier type.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View the identifier as a plain `&str`.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the wrapped string has no characters.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(AgentId, "Registered name of an agent handler.");
typed_id!(SessionId, "Correlation id grouping trace entries across events.");
typed_id!(EventId, "Unique identifier of an emitted event.");

impl EventId {
    /// Mint a fresh process-unique event id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl SessionId {
    /// Mint a fresh session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
