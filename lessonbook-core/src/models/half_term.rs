use serde::{Deserialize, Serialize};

use crate::renumber::NumberMap;

/// One of the six fixed scheduling periods in an academic year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalfTerm {
    pub id: String,
    pub name: String,
    pub months: String,
    pub lessons: Vec<String>,
    pub is_complete: bool,
}

impl HalfTerm {
    fn fixed(id: &str, name: &str, months: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            months: months.to_string(),
            lessons: Vec::new(),
            is_complete: false,
        }
    }

    /// The six fixed periods every class starts from.
    pub fn defaults() -> Vec<HalfTerm> {
        vec![
            HalfTerm::fixed("A1", "Autumn 1", "Sep-Oct"),
            HalfTerm::fixed("A2", "Autumn 2", "Nov-Dec"),
            HalfTerm::fixed("SP1", "Spring 1", "Jan-Feb"),
            HalfTerm::fixed("SP2", "Spring 2", "Mar-Apr"),
            HalfTerm::fixed("SM1", "Summer 1", "Apr-May"),
            HalfTerm::fixed("SM2", "Summer 2", "Jun-Jul"),
        ]
    }

    /// Drops `removed` and rewrites remapped references.
    pub fn remap_lessons(&mut self, removed: &str, map: &NumberMap) -> bool {
        map.remap_refs(&mut self.lessons, removed)
    }

    /// Drops a single lesson number without remapping the rest.
    pub fn remove_lesson(&mut self, number: &str) -> bool {
        let before = self.lessons.len();
        self.lessons.retain(|n| n != number);
        self.lessons.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_six_fixed_periods() {
        let terms = HalfTerm::defaults();
        assert_eq!(terms.len(), 6);
        let ids: Vec<&str> = terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "SP1", "SP2", "SM1", "SM2"]);
        assert!(terms.iter().all(|t| t.lessons.is_empty() && !t.is_complete));
    }

    #[test]
    fn test_remap_lessons() {
        let mut term = HalfTerm::fixed("A1", "Autumn 1", "Sep-Oct");
        term.lessons = vec!["1".into(), "2".into(), "3".into()];
        let map = NumberMap::from_pairs(&[("3", "2")]);
        assert!(term.remap_lessons("2", &map));
        assert_eq!(term.lessons, vec!["1", "2"]);
    }
}
