use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },
}

/// Stable identifier of a user's learning path.
///
/// Generated ids take the form `{category}-{unix_millis}`; ids that arrive
/// from storage or clients are kept verbatim.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(String);

impl PathId {
    /// Wrap an existing id.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the id is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(IdError::Empty { kind: "path id" });
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn generate(category: &str, at: DateTime<Utc>) -> Self {
        Self(format!("{category}-{}", at.timestamp_millis()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key under which a set of paths is persisted: an authenticated user id or
/// a device key for the local fallback.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Create a trimmed, non-empty owner key.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Empty` if the key is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty { kind: "owner key" });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Random key identifying this device for local persistence.
    #[must_use]
    pub fn new_device() -> Self {
        Self(format!("device-{}", uuid::Uuid::new_v4()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerKey> for String {
    fn from(value: OwnerKey) -> Self {
        value.0
    }
}

impl fmt::Debug for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathId({})", self.0)
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerKey({})", self.0)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PathId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for OwnerKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
