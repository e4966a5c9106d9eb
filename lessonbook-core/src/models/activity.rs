use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media links attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaLinks {
    pub video: String,
    pub music: String,
    pub backing: String,
    pub resource: String,
    pub image: String,
    pub vocals: String,
}

impl MediaLinks {
    pub fn is_empty(&self) -> bool {
        self.video.is_empty()
            && self.music.is_empty()
            && self.backing.is_empty()
            && self.resource.is_empty()
            && self.image.is_empty()
            && self.vocals.is_empty()
    }
}

/// A single teachable activity.
///
/// Within the global library an activity is identified by
/// (name, category, lesson_number); the same record also appears
/// inside the grouped [`LessonData`](super::LessonData) of its lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_minutes: u32,
    pub media: MediaLinks,
    pub category: String,
    pub level: String,
    pub unit_name: String,
    pub lesson_number: String,
    pub tags: Vec<String>,
}

impl Activity {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        lesson_number: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category: category.into(),
            lesson_number: lesson_number.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_unit_name(mut self, unit_name: impl Into<String>) -> Self {
        self.unit_name = unit_name.into();
        self
    }

    pub fn with_media(mut self, media: MediaLinks) -> Self {
        self.media = media;
        self
    }

    /// Import/merge identity: (name, category, lesson_number).
    pub fn key(&self) -> ActivityKey {
        ActivityKey {
            name: self.name.clone(),
            category: self.category.clone(),
            lesson_number: self.lesson_number.clone(),
        }
    }

    /// Library seeding identity: (name, category), lesson-agnostic.
    pub fn library_key(&self) -> (String, String) {
        (self.name.clone(), self.category.clone())
    }
}

/// Identity of an activity in the global catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    pub name: String,
    pub category: String,
    pub lesson_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_new() {
        let activity = Activity::new("Hello Song", "Welcome", "1");
        assert!(!activity.id.is_empty());
        assert_eq!(activity.name, "Hello Song");
        assert_eq!(activity.category, "Welcome");
        assert_eq!(activity.lesson_number, "1");
        assert_eq!(activity.duration_minutes, 0);
        assert!(activity.media.is_empty());
    }

    #[test]
    fn test_activity_builder() {
        let activity = Activity::new("Stick Tap", "Rhythm Sticks", "2")
            .with_description("Tap along to the pulse")
            .with_duration(5)
            .with_level("All")
            .with_unit_name("Pulse and Beat");
        assert_eq!(activity.duration_minutes, 5);
        assert_eq!(activity.level, "All");
        assert_eq!(activity.unit_name, "Pulse and Beat");
    }

    #[test]
    fn test_keys_distinguish_lesson_number() {
        let a = Activity::new("Hello Song", "Welcome", "1");
        let b = Activity::new("Hello Song", "Welcome", "2");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.library_key(), b.library_key());
    }

    #[test]
    fn test_json_roundtrip_and_defaults() {
        let activity = Activity::new("Hello Song", "Welcome", "1").with_duration(3);
        let json = serde_json::to_string(&activity).unwrap();
        let parsed: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(activity, parsed);

        // Stored shapes are not trusted: missing fields decode as defaults.
        let sparse: Activity = serde_json::from_str(r#"{"name":"X","category":"Welcome"}"#).unwrap();
        assert_eq!(sparse.duration_minutes, 0);
        assert!(sparse.lesson_number.is_empty());
        assert!(sparse.tags.is_empty());
    }
}
