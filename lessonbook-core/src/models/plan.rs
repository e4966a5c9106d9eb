use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Activity;

/// Lifecycle state of a user-authored lesson plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Planned,
    Completed,
    Cancelled,
    Draft,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanStatus::Planned => "planned",
            PlanStatus::Completed => "completed",
            PlanStatus::Cancelled => "cancelled",
            PlanStatus::Draft => "draft",
        };
        write!(f, "{}", s)
    }
}

/// A user-authored scheduling record.
///
/// A plan owns its own lifecycle; binding to a numbered lesson via
/// `lesson_number` is optional, and only bound plans participate in
/// renumbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonPlan {
    pub id: String,
    pub date: DateTime<Utc>,
    pub week: u32,
    pub class_name: String,
    pub activities: Vec<Activity>,
    pub duration_minutes: u32,
    pub notes: String,
    pub status: PlanStatus,
    pub unit_id: Option<String>,
    pub unit_name: Option<String>,
    pub lesson_number: Option<String>,
    pub title: Option<String>,
    pub term: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for LessonPlan {
    fn default() -> Self {
        Self {
            id: String::new(),
            date: DateTime::UNIX_EPOCH,
            week: 0,
            class_name: String::new(),
            activities: Vec::new(),
            duration_minutes: 0,
            notes: String::new(),
            status: PlanStatus::default(),
            unit_id: None,
            unit_name: None,
            lesson_number: None,
            title: None,
            term: None,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl LessonPlan {
    pub fn new(class_name: impl Into<String>, date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            class_name: class_name.into(),
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn with_week(mut self, week: u32) -> Self {
        self.week = week;
        self
    }

    pub fn with_activities(mut self, activities: Vec<Activity>) -> Self {
        self.duration_minutes = activities.iter().map(|a| a.duration_minutes).sum();
        self.activities = activities;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_lesson_number(mut self, lesson_number: impl Into<String>) -> Self {
        self.lesson_number = Some(lesson_number.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_unit(mut self, unit_id: impl Into<String>, unit_name: impl Into<String>) -> Self {
        self.unit_id = Some(unit_id.into());
        self.unit_name = Some(unit_name.into());
        self
    }

    /// The bound lesson number parsed as an integer, if any.
    pub fn numeric_lesson_number(&self) -> Option<i64> {
        self.lesson_number.as_deref()?.parse().ok()
    }
}
