//! Tabular ingestion: raw rows in, normalized activities out.
//!
//! The input is a rectangular table of string cells with a fixed
//! column layout: lesson number, category, name, description, level,
//! duration, video, music, backing, resource, unit name. Row 0 is a
//! header and is discarded. Normalization is deterministic and never
//! fails; malformed rows degrade instead of aborting the pass.

use crate::models::{Activity, MediaLinks};

/// The output of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    /// Activities in row order.
    pub activities: Vec<Activity>,
    /// Distinct lesson-number labels, in first-seen order.
    pub lesson_numbers: Vec<String>,
    /// Distinct categories, in first-seen order.
    pub categories: Vec<String>,
}

impl ImportBatch {
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Converts raw table rows into activity records.
///
/// A non-empty lesson-number cell becomes the "current" number and is
/// carried forward across following rows until the next non-empty
/// value; rows before any label fall back to "1". A row is skipped
/// when its category or name cell is empty. Durations parse as
/// non-negative integers; anything else coerces to 0.
pub fn normalize_rows(rows: &[Vec<String>]) -> ImportBatch {
    let mut batch = ImportBatch::default();
    let mut current_number = String::new();

    for row in rows.iter().skip(1) {
        if row.len() < 3 {
            continue;
        }
        let cell = |i: usize| row.get(i).map(|c| c.trim()).unwrap_or("").to_string();

        let label = cell(0);
        let category = cell(1);
        let name = cell(2);
        if category.is_empty() || name.is_empty() {
            continue;
        }

        if !label.is_empty() {
            if !batch.lesson_numbers.contains(&label) {
                batch.lesson_numbers.push(label.clone());
            }
            current_number = label;
        }
        if !batch.categories.contains(&category) {
            batch.categories.push(category.clone());
        }

        let lesson_number = if current_number.is_empty() {
            "1".to_string()
        } else {
            current_number.clone()
        };

        let duration = cell(5).parse::<u32>().unwrap_or(0);
        let activity = Activity::new(name, category, lesson_number)
            .with_description(cell(3).replace('"', ""))
            .with_level(cell(4))
            .with_duration(duration)
            .with_media(MediaLinks {
                video: cell(6),
                music: cell(7),
                backing: cell(8),
                resource: cell(9),
                ..MediaLinks::default()
            })
            .with_unit_name(cell(10));
        batch.activities.push(activity);
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> Vec<String> {
        row(&[
            "Lesson", "Category", "Activity", "Description", "Level", "Time", "Video", "Music",
            "Backing", "Resource", "Unit",
        ])
    }

    #[test]
    fn test_header_row_is_discarded() {
        let batch = normalize_rows(&[header()]);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_sparse_lesson_numbers_fill_forward() {
        let rows = vec![
            header(),
            row(&["1", "Welcome", "Hello Song", "", "", "3"]),
            row(&["", "Rhythm Sticks", "Stick Tap", "", "", "5"]),
            row(&["2", "Welcome", "Hello Again", "", "", "3"]),
            row(&["", "Goodbye", "Wave Goodbye", "", "", "2"]),
        ];
        let batch = normalize_rows(&rows);
        assert_eq!(batch.lesson_numbers, vec!["1", "2"]);
        let numbers: Vec<&str> = batch
            .activities
            .iter()
            .map(|a| a.lesson_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["1", "1", "2", "2"]);
    }

    #[test]
    fn test_row_before_any_label_defaults_to_one() {
        let rows = vec![
            header(),
            row(&["", "Welcome", "Hello Song", "", "", "3"]),
        ];
        let batch = normalize_rows(&rows);
        assert_eq!(batch.activities[0].lesson_number, "1");
        // The fallback is not a label the table declared.
        assert!(batch.lesson_numbers.is_empty());
    }

    #[test]
    fn test_rows_missing_category_or_name_are_skipped() {
        let rows = vec![
            header(),
            row(&["1", "", "Hello Song"]),
            row(&["1", "Welcome", ""]),
            row(&["1", "Welcome", "Hello Song"]),
            row(&["short"]),
        ];
        let batch = normalize_rows(&rows);
        assert_eq!(batch.activities.len(), 1);
        assert_eq!(batch.activities[0].name, "Hello Song");
    }

    #[test]
    fn test_bad_durations_coerce_to_zero() {
        let rows = vec![
            header(),
            row(&["1", "Welcome", "Hello Song", "", "", "-4"]),
            row(&["", "Welcome", "Name Game", "", "", "five"]),
            row(&["", "Welcome", "Echo Clap", "", "", "7"]),
        ];
        let batch = normalize_rows(&rows);
        let durations: Vec<u32> = batch
            .activities
            .iter()
            .map(|a| a.duration_minutes)
            .collect();
        assert_eq!(durations, vec![0, 0, 7]);
    }

    #[test]
    fn test_cells_are_trimmed_and_quotes_stripped() {
        let rows = vec![
            header(),
            row(&[
                " 1 ",
                " Welcome ",
                " Hello Song ",
                "Sing \"hello\" to everyone",
                "All",
                "3",
                "v",
                "m",
                "b",
                "r",
                "Starting Out",
            ]),
        ];
        let batch = normalize_rows(&rows);
        let activity = &batch.activities[0];
        assert_eq!(activity.lesson_number, "1");
        assert_eq!(activity.category, "Welcome");
        assert_eq!(activity.name, "Hello Song");
        assert_eq!(activity.description, "Sing hello to everyone");
        assert_eq!(activity.media.video, "v");
        assert_eq!(activity.unit_name, "Starting Out");
    }

    #[test]
    fn test_import_is_deterministic() {
        let rows = vec![
            header(),
            row(&["1", "Welcome", "Hello Song", "", "", "3"]),
            row(&["", "Goodbye", "Wave Goodbye", "", "", "2"]),
        ];
        let a = normalize_rows(&rows);
        let b = normalize_rows(&rows);
        assert_eq!(a.lesson_numbers, b.lesson_numbers);
        assert_eq!(a.categories, b.categories);
        assert_eq!(a.activities.len(), b.activities.len());
        for (x, y) in a.activities.iter().zip(&b.activities) {
            // Ids are freshly generated; everything else matches.
            assert_eq!(x.name, y.name);
            assert_eq!(x.category, y.category);
            assert_eq!(x.lesson_number, y.lesson_number);
        }
    }
}
