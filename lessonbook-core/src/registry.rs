//! The per-class lesson registry: numbered lessons, their index, the
//! category roster and the curriculum-tag map, kept as one versioned
//! bundle. Every mutation returns a fresh snapshot; callers swap the
//! whole value so concurrently triggered effects never observe a
//! half-applied change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::categories::default_lesson_title;
use crate::ingest::ImportBatch;
use crate::models::{LessonData, LessonPlan};
use crate::renumber::NumberMap;

/// Current bundle schema. Stored bundles with an older (or missing)
/// version are repaired on read.
pub const BUNDLE_SCHEMA_VERSION: u32 = 1;

/// The authoritative in-memory view of one class's lesson data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonRegistry {
    pub schema_version: u32,
    /// Monotonic write stamp; bumped on every persisted change.
    pub revision: u64,
    pub lessons: BTreeMap<String, LessonData>,
    /// Ascending numerically-sorted key set of `lessons`.
    pub lesson_numbers: Vec<String>,
    /// Distinct categories seen at assembly time.
    pub teaching_units: Vec<String>,
    /// Lesson number -> curriculum tags.
    pub tag_map: BTreeMap<String, Vec<String>>,
}

/// Sorts lesson-number labels numerically, so "10" follows "9".
/// Unparsable labels sink to the end in stable order.
pub fn sort_lesson_numbers(numbers: &mut [String]) {
    numbers.sort_by_key(|n| n.parse::<i64>().unwrap_or(i64::MAX));
}

impl LessonRegistry {
    pub fn new() -> Self {
        Self {
            schema_version: BUNDLE_SCHEMA_VERSION,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty() && self.lesson_numbers.is_empty()
    }

    pub fn lesson(&self, number: &str) -> Option<&LessonData> {
        self.lessons.get(number)
    }

    /// Assembles a registry from a normalized import batch: only
    /// integer-parseable lesson numbers survive, sorted numerically;
    /// each lesson gets its grouped activities, duration sum and a
    /// derived default title.
    pub fn assemble(batch: &ImportBatch) -> Self {
        let mut numbers: Vec<String> = batch
            .lesson_numbers
            .iter()
            .filter(|n| n.parse::<i64>().is_ok())
            .cloned()
            .collect();
        sort_lesson_numbers(&mut numbers);

        let mut lessons = BTreeMap::new();
        let mut tag_map = BTreeMap::new();
        for number in &numbers {
            let activities = batch
                .activities
                .iter()
                .filter(|a| a.lesson_number == *number)
                .cloned();
            let mut data = LessonData::from_activities(number, activities);
            data.title = Some(default_lesson_title(&data.category_order));
            lessons.insert(number.clone(), data);
            tag_map.insert(number.clone(), Vec::new());
        }

        let mut teaching_units = batch.categories.clone();
        teaching_units.sort();

        Self {
            schema_version: BUNDLE_SCHEMA_VERSION,
            revision: 0,
            lessons,
            lesson_numbers: numbers,
            teaching_units,
            tag_map,
        }
    }

    /// Validates a bundle read from storage and repairs its derived
    /// fields instead of trusting the stored shape: the number index
    /// is recomputed from the lesson table and contained activities
    /// are restamped with their containing key.
    pub fn repair(mut self) -> Self {
        if self.schema_version == 0 {
            self.schema_version = BUNDLE_SCHEMA_VERSION;
        }
        let mut numbers: Vec<String> = self.lessons.keys().cloned().collect();
        sort_lesson_numbers(&mut numbers);
        self.lesson_numbers = numbers;
        for (number, data) in self.lessons.iter_mut() {
            data.set_lesson_number(number);
        }
        self
    }

    pub fn with_revision_bumped(&self) -> Self {
        let mut next = self.clone();
        next.revision += 1;
        next
    }

    /// Sets the title override on a lesson, if it exists.
    pub fn with_lesson_title(&self, number: &str, title: &str) -> Self {
        let mut next = self.clone();
        if let Some(data) = next.lessons.get_mut(number) {
            data.title = Some(title.to_string());
        }
        next
    }

    /// Attaches a tag to a lesson (tag map and lesson data both).
    pub fn with_tag_added(&self, number: &str, tag: &str) -> Self {
        let mut next = self.clone();
        let tags = next.tag_map.entry(number.to_string()).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
        if let Some(data) = next.lessons.get_mut(number) {
            if !data.tags.iter().any(|t| t == tag) {
                data.tags.push(tag.to_string());
            }
        }
        next
    }

    /// Detaches a tag from a lesson.
    pub fn with_tag_removed(&self, number: &str, tag: &str) -> Self {
        let mut next = self.clone();
        if let Some(tags) = next.tag_map.get_mut(number) {
            tags.retain(|t| t != tag);
        }
        if let Some(data) = next.lessons.get_mut(number) {
            data.tags.retain(|t| t != tag);
        }
        next
    }

    /// Promotes a numbered plan into the registry: its activities
    /// become the lesson's grouping and its number joins the index in
    /// numeric position. An existing lesson under that number is
    /// replaced.
    pub fn with_plan_promoted(&self, plan: &LessonPlan) -> Self {
        let Some(number) = plan.lesson_number.as_deref() else {
            return self.clone();
        };
        let mut next = self.clone();
        let mut data = LessonData::from_activities(number, plan.activities.iter().cloned());
        data.title = plan.title.clone();
        next.lessons.insert(number.to_string(), data);
        if !next.lesson_numbers.iter().any(|n| n == number) {
            next.lesson_numbers.push(number.to_string());
            sort_lesson_numbers(&mut next.lesson_numbers);
        }
        next
    }

    /// Plain lesson removal: drops exactly this number's lesson data,
    /// index entry and tag entry. Surviving lessons keep their
    /// numbers.
    pub fn without_lesson(&self, number: &str) -> Self {
        let mut next = self.clone();
        next.lessons.remove(number);
        next.tag_map.remove(number);
        next.lesson_numbers.retain(|n| n != number);
        next
    }

    /// Applies a deletion-renumbering to the whole bundle: the removed
    /// number disappears and every mapped lesson moves to its new key,
    /// carrying its activities (restamped) and tags. The index is
    /// rebuilt and re-sorted numerically.
    pub fn renumbered(&self, removed: &str, map: &NumberMap) -> Self {
        let mut next = self.clone();
        next.lessons.remove(removed);
        next.tag_map.remove(removed);

        // Drain all moving entries before reinserting so moves cannot
        // clobber a source entry that has not been moved yet.
        let mut moved_lessons = Vec::new();
        let mut moved_tags = Vec::new();
        for (old, new) in map.iter() {
            if let Some(data) = next.lessons.remove(old) {
                moved_lessons.push((new.clone(), data));
            }
            if let Some(tags) = next.tag_map.remove(old) {
                moved_tags.push((new.clone(), tags));
            }
        }
        for (new, mut data) in moved_lessons {
            data.set_lesson_number(&new);
            next.lessons.insert(new, data);
        }
        for (new, tags) in moved_tags {
            next.tag_map.insert(new, tags);
        }

        next.lesson_numbers = self
            .lesson_numbers
            .iter()
            .filter(|n| *n != removed)
            .map(|n| map.get(n).cloned().unwrap_or_else(|| n.clone()))
            .collect();
        sort_lesson_numbers(&mut next.lesson_numbers);
        next.lesson_numbers.dedup();
        next
    }
}
