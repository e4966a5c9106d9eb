//! Contiguous lesson renumbering after a bound plan is deleted.
//!
//! Deleting a plan that carries a lesson number compacts the surviving
//! numbered plans of that class onto 1..=K and produces an old -> new
//! map that every dependent collection applies.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::LessonPlan;

/// Old lesson number -> new lesson number, restricted to entries whose
/// value actually changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberMap(BTreeMap<String, String>);

impl NumberMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, old: &str) -> Option<&String> {
        self.0.get(old)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Removes every occurrence of `removed` from `refs` and rewrites
    /// remapped survivors in place. Returns true if anything changed.
    pub fn remap_refs(&self, refs: &mut Vec<String>, removed: &str) -> bool {
        let mut changed = false;
        refs.retain(|n| {
            let keep = n != removed;
            changed |= !keep;
            keep
        });
        for n in refs.iter_mut() {
            if let Some(new) = self.0.get(n) {
                *n = new.clone();
                changed = true;
            }
        }
        changed
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
        )
    }
}

/// Compacts the numbered plans of `class` onto the contiguous range
/// 1..=K, preserving their current numeric order (stable for
/// duplicated numbers). Plans of other classes and unnumbered plans
/// are untouched.
///
/// Returns the old -> new map of changed numbers. A duplicated old
/// number keeps only its last assignment in the map, so dependent
/// entries collapse onto one slot.
pub fn renumber_class_plans(plans: &mut [LessonPlan], class: &str) -> NumberMap {
    let mut indices: Vec<usize> = plans
        .iter()
        .enumerate()
        .filter(|(_, p)| p.class_name == class && p.lesson_number.is_some())
        .map(|(i, _)| i)
        .collect();

    // Numeric ascending; unparsable numbers sink to the end, in place.
    indices.sort_by_key(|&i| plans[i].numeric_lesson_number().unwrap_or(i64::MAX));

    let now = Utc::now();
    let mut map = BTreeMap::new();
    for (position, &i) in indices.iter().enumerate() {
        let new = (position + 1).to_string();
        let old = plans[i]
            .lesson_number
            .clone()
            .unwrap_or_default();
        if old != new {
            map.insert(old, new.clone());
            plans[i].lesson_number = Some(new);
            plans[i].updated_at = now;
        }
    }
    NumberMap(map)
}
