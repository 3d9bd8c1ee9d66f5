// src/models/class_level.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::{MAX_CLASS_LEVEL, MIN_CLASS_LEVEL},
    error::AppError,
};

/// A grade level in `1..=10`. Scopes which questions an account may see.
///
/// Serialized as a plain JSON integer; out-of-range values never make it past
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ClassLevel(u8);

impl ClassLevel {
    pub fn new(level: i64) -> Result<Self, AppError> {
        Self::try_from(level).map_err(AppError::ValidationError)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every class level in ascending order.
    pub fn all() -> impl Iterator<Item = ClassLevel> {
        (MIN_CLASS_LEVEL..=MAX_CLASS_LEVEL).map(ClassLevel)
    }
}

impl TryFrom<i64> for ClassLevel {
    type Error = String;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_CLASS_LEVEL)..=i64::from(MAX_CLASS_LEVEL)).contains(&level) {
            Ok(ClassLevel(level as u8))
        } else {
            Err(format!(
                "Class must be between {} and {}",
                MIN_CLASS_LEVEL, MAX_CLASS_LEVEL
            ))
        }
    }
}

impl From<ClassLevel> for i64 {
    fn from(level: ClassLevel) -> Self {
        i64::from(level.0)
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_one_through_ten() {
        assert!(ClassLevel::new(0).is_err());
        assert!(ClassLevel::new(11).is_err());
        assert!(ClassLevel::new(-3).is_err());
        assert_eq!(ClassLevel::new(1).unwrap().get(), 1);
        assert_eq!(ClassLevel::new(10).unwrap().get(), 10);
    }

    #[test]
    fn all_lists_ten_levels_in_order() {
        let levels: Vec<u8> = ClassLevel::all().map(ClassLevel::get).collect();
        assert_eq!(levels, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn deserializes_from_integer_only_in_range() {
        let ok: ClassLevel = serde_json::from_str("7").unwrap();
        assert_eq!(ok.get(), 7);
        assert!(serde_json::from_str::<ClassLevel>("12").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "7");
    }
}
