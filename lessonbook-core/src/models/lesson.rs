use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Activity;
use crate::categories::{default_lesson_title, sort_categories};

/// The derived, activity-grouped view of a numbered lesson.
///
/// Everything here is recomputed from the contained activities except
/// `title` (user override) and `tags` (curriculum tags attached to
/// the lesson).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonData {
    /// Category -> activities, in the order they were supplied.
    pub grouped: BTreeMap<String, Vec<Activity>>,
    pub category_order: Vec<String>,
    pub total_duration: u32,
    pub title: Option<String>,
    pub tags: Vec<String>,
}

impl LessonData {
    /// Groups activities under `lesson_number`, restamping each
    /// activity with that number.
    pub fn from_activities(
        lesson_number: &str,
        activities: impl IntoIterator<Item = Activity>,
    ) -> Self {
        let mut grouped: BTreeMap<String, Vec<Activity>> = BTreeMap::new();
        let mut total = 0u32;
        for mut activity in activities {
            activity.lesson_number = lesson_number.to_string();
            total += activity.duration_minutes;
            grouped
                .entry(activity.category.clone())
                .or_default()
                .push(activity);
        }
        let mut category_order: Vec<String> = grouped.keys().cloned().collect();
        sort_categories(&mut category_order);
        Self {
            grouped,
            category_order,
            total_duration: total,
            title: None,
            tags: Vec::new(),
        }
    }

    /// All activities, flattened in display (category) order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.category_order
            .iter()
            .filter_map(|c| self.grouped.get(c))
            .flatten()
    }

    pub fn activity_count(&self) -> usize {
        self.grouped.values().map(Vec::len).sum()
    }

    /// The stored title, or the derived default when none is set.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| default_lesson_title(&self.category_order))
    }

    /// Restamps the lesson number on every contained activity.
    pub fn set_lesson_number(&mut self, lesson_number: &str) {
        for activities in self.grouped.values_mut() {
            for activity in activities {
                activity.lesson_number = lesson_number.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_activities() -> Vec<Activity> {
        vec![
            Activity::new("Wave Goodbye", "Goodbye", "9").with_duration(2),
            Activity::new("Hello Song", "Welcome", "9").with_duration(3),
            Activity::new("Stick Tap", "Rhythm Sticks", "9").with_duration(5),
            Activity::new("Stick March", "Rhythm Sticks", "9").with_duration(4),
        ]
    }

    #[test]
    fn test_from_activities_groups_and_sums() {
        let data = LessonData::from_activities("3", sample_activities());
        assert_eq!(data.total_duration, 14);
        assert_eq!(
            data.category_order,
            vec!["Welcome", "Rhythm Sticks", "Goodbye"]
        );
        assert_eq!(data.grouped["Rhythm Sticks"].len(), 2);
        assert!(data.activities().all(|a| a.lesson_number == "3"));
    }

    #[test]
    fn test_activities_flatten_in_category_order() {
        let data = LessonData::from_activities("1", sample_activities());
        let names: Vec<&str> = data.activities().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Hello Song", "Stick Tap", "Stick March", "Wave Goodbye"]
        );
    }

    #[test]
    fn test_display_title_prefers_override() {
        let mut data = LessonData::from_activities("1", sample_activities());
        assert_eq!(data.display_title(), "Rhythm Sticks Lesson");
        data.title = Some("Spring Concert Prep".to_string());
        assert_eq!(data.display_title(), "Spring Concert Prep");
    }

    #[test]
    fn test_set_lesson_number_restamps_activities() {
        let mut data = LessonData::from_activities("4", sample_activities());
        data.set_lesson_number("2");
        assert!(data.activities().all(|a| a.lesson_number == "2"));
    }
}
