//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a pie in the catalog.
///
/// Pie ids are numeric and stable; they are also the member values of every
/// availability / label set in the inventory store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieId(u64);

impl PieId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for PieId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for PieId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for PieId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("PieId: {e}")))?;
        Ok(Self(value))
    }
}

/// Name of a buyer.
///
/// Usernames are opaque and unauthenticated; the only rule is that they are
/// not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pie_id_parses_decimal_strings() {
        assert_eq!("42".parse::<PieId>().unwrap(), PieId::new(42));
        assert_eq!(PieId::new(7).to_string(), "7");
    }

    #[test]
    fn pie_id_rejects_non_numeric_input() {
        let err = "apple".parse::<PieId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("PieId")));
        assert!("-1".parse::<PieId>().is_err());
    }

    #[test]
    fn username_must_not_be_empty() {
        assert!(Username::parse("").is_err());
        assert_eq!(Username::parse("alice").unwrap().as_str(), "alice");
    }
}
