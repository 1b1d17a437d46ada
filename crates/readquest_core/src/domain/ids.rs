//! crates/readquest_core/src/domain/ids.rs
//!
//! Strongly typed identifiers for everything the engine touches. Wrapping
//! `Uuid` keeps a user id from ever being wired into a chapter slot, and
//! gives string input a single fail-fast validation point.

use std::fmt;

use uuid::Uuid;

use crate::ports::{EngineError, EngineResult};

macro_rules! define_id {
    ($name:ident, $label:literal) => {
        #[doc = concat!("Unique ", $label, ".")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse from string form; empty or malformed input fails fast.
            pub fn parse(s: &str) -> EngineResult<Self> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(EngineError::Validation(format!(
                        "{} must not be empty",
                        $label
                    )));
                }
                Uuid::parse_str(trimmed).map(Self).map_err(|_| {
                    EngineError::Validation(format!("malformed {}: {:?}", $label, s))
                })
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(UserId, "user id");
define_id!(BookId, "book id");
define_id!(ChapterId, "chapter id");
define_id!(CollectionId, "collection id");
define_id!(AchievementId, "achievement id");

/// Stable, human-readable key of a catalog achievement.
///
/// Codes are immutable once created: lowercase ASCII letters, digits and
/// underscores only (e.g. `first_book`, `streak_7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AchievementCode(String);

impl AchievementCode {
    pub fn new(code: impl Into<String>) -> EngineResult<Self> {
        let code = code.into();
        if code.is_empty() {
            return Err(EngineError::Validation(
                "achievement code must not be empty".to_string(),
            ));
        }
        let valid = code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(EngineError::Validation(format!(
                "achievement code {:?} may only contain lowercase letters, digits and underscores",
                code
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AchievementCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
