use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key for a municipality, e.g. the 7-digit IBGE code `3550308`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    #[inline] pub fn new(id: u32) -> Self { Self(id) }

    #[inline] pub fn get(&self) -> u32 { self.0 }

    /// Parse an id from snapshot text, tolerating surrounding whitespace and a
    /// trailing `.0` left behind by float-typed exports.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_suffix(".0").unwrap_or(text);
        text.parse().ok().map(Self)
    }

    /// Convert a numeric id, rejecting negatives and fractional values.
    pub fn from_f64(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64)
            .then(|| Self(value as u32))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self { Self(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handles_export_artifacts() {
        assert_eq!(EntityId::parse(" 3550308 "), Some(EntityId(3550308)));
        assert_eq!(EntityId::parse("3550308.0"), Some(EntityId(3550308)));
        assert_eq!(EntityId::parse("SP"), None);
        assert_eq!(EntityId::parse(""), None);
    }

    #[test]
    fn from_f64_rejects_non_integers() {
        assert_eq!(EntityId::from_f64(42.0), Some(EntityId(42)));
        assert_eq!(EntityId::from_f64(42.5), None);
        assert_eq!(EntityId::from_f64(-1.0), None);
        assert_eq!(EntityId::from_f64(f64::NAN), None);
    }
}
