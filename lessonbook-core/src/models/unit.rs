use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::renumber::NumberMap;

/// A teaching unit: a named, colored grouping of lesson numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub lesson_numbers: Vec<String>,
    pub color: String,
    pub term: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            lesson_numbers: Vec::new(),
            color: String::new(),
            term: None,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl Unit {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            color: color.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn with_lesson_numbers(mut self, lesson_numbers: Vec<String>) -> Self {
        self.lesson_numbers = lesson_numbers;
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    /// Drops `removed` and rewrites remapped references; returns true
    /// (and bumps `updated_at`) when anything changed.
    pub fn remap_lessons(&mut self, removed: &str, map: &NumberMap) -> bool {
        let changed = map.remap_refs(&mut self.lesson_numbers, removed);
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    /// Drops a single lesson number without remapping the rest.
    pub fn remove_lesson(&mut self, number: &str) -> bool {
        let before = self.lesson_numbers.len();
        self.lesson_numbers.retain(|n| n != number);
        let changed = self.lesson_numbers.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_remove_lesson() {
        let mut unit = Unit::new("Pulse and Beat", "#3b82f6")
            .with_lesson_numbers(nums(&["1", "2", "3"]));
        assert!(unit.remove_lesson("2"));
        assert_eq!(unit.lesson_numbers, nums(&["1", "3"]));
        assert!(!unit.remove_lesson("9"));
    }

    #[test]
    fn test_remap_lessons() {
        let mut unit =
            Unit::new("Pitch Play", "#10b981").with_lesson_numbers(nums(&["2", "3", "4"]));
        let map = NumberMap::from_pairs(&[("3", "2"), ("4", "3")]);
        assert!(unit.remap_lessons("2", &map));
        assert_eq!(unit.lesson_numbers, nums(&["2", "3"]));
    }

    #[test]
    fn test_remap_untouched_unit_reports_no_change() {
        let mut unit = Unit::new("Listening", "#ef4444").with_lesson_numbers(nums(&["1"]));
        let map = NumberMap::from_pairs(&[("5", "4")]);
        let before = unit.updated_at;
        assert!(!unit.remap_lessons("6", &map));
        assert_eq!(unit.updated_at, before);
    }
}
