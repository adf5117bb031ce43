//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::RaceTime;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid gender category value.
    #[error("invalid gender category: {value}")]
    InvalidGender { value: String },
}

/// Gender category an athlete races and is drafted in.
///
/// The two categories are drafted, scored and ranked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "M", alias = "m")]
    Men,
    #[serde(alias = "F", alias = "f", alias = "W", alias = "w")]
    Women,
}

impl Gender {
    /// Both categories, in draft order.
    pub const ALL: [Self; 2] = [Self::Men, Self::Women];

    /// String representation used in input and output files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Athlete ranking feeds use single-letter codes
        match s {
            "men" | "M" | "m" => Ok(Self::Men),
            "women" | "F" | "f" | "W" | "w" => Ok(Self::Women),
            _ => Err(ValidationError::InvalidGender {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated athlete identifier.
    ///
    /// Athlete IDs come from the external athlete registry and must be
    /// non-empty. They are unique across both gender categories.
    AthleteId, "athlete ID"
);

define_string_id!(
    /// A validated participant (team owner) identifier.
    ParticipantId, "participant ID"
);

/// Athlete reference data. Owned externally; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,

    #[serde(default)]
    pub name: Option<String>,

    pub gender: Gender,

    /// Marathon personal best, if known.
    #[serde(default, with = "crate::time::lenient")]
    pub personal_best: Option<RaceTime>,
}
