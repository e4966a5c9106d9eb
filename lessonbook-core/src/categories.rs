//! Category ordering policy and default lesson titles.

use std::cmp::Ordering;

/// Display priority for lesson categories. Categories not in this
/// list sort after all listed ones, alphabetically.
pub const CATEGORY_PRIORITY: [&str; 15] = [
    "Welcome",
    "Kodaly Songs",
    "Kodaly Action Songs",
    "Action/Games Songs",
    "Rhythm Sticks",
    "Scarf Songs",
    "General Game",
    "Core Songs",
    "Parachute Games",
    "Percussion Games",
    "Goodbye",
    "Teaching Units",
    "Kodaly Rhythms",
    "Kodaly Games",
    "IWB Games",
];

fn priority(category: &str) -> Option<usize> {
    CATEGORY_PRIORITY.iter().position(|c| *c == category)
}

/// Sorts categories in place by the fixed priority list.
pub fn sort_categories(categories: &mut [String]) {
    categories.sort_by(|a, b| match (priority(a), priority(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// Derives a lesson title from its ordered category set.
///
/// A Welcome/Goodbye pair brackets a lesson: the title comes from the
/// first category between them. Otherwise a handful of signature
/// categories name the lesson outright.
pub fn default_lesson_title(category_order: &[String]) -> String {
    if category_order.is_empty() {
        return "Untitled Lesson".to_string();
    }

    let has = |name: &str| category_order.iter().any(|c| c == name);

    if has("Welcome") && has("Goodbye") {
        let main = category_order
            .iter()
            .find(|c| *c != "Welcome" && *c != "Goodbye");
        return match main {
            Some(category) => format!("{} Lesson", category),
            None => "Standard Lesson".to_string(),
        };
    }

    for (category, title) in [
        ("Kodaly Songs", "Kodaly Lesson"),
        ("Rhythm Sticks", "Rhythm Sticks Lesson"),
        ("Percussion Games", "Percussion Lesson"),
        ("Scarf Songs", "Movement with Scarves"),
        ("Parachute Games", "Parachute Activities"),
        ("Action/Games Songs", "Action Games Lesson"),
    ] {
        if has(category) {
            return title.to_string();
        }
    }

    format!("{} Lesson", category_order[0])
}
