//! Lessonbook Core Library
//!
//! The lesson-numbering data layer: normalized ingestion, the
//! per-class lesson registry, contiguous renumbering across every
//! dependent collection, and cache/remote reconciliation.

pub mod categories;
pub mod error;
pub mod ingest;
pub mod models;
pub mod registry;
pub mod renumber;
pub mod service;
pub mod store;

pub use categories::{default_lesson_title, sort_categories, CATEGORY_PRIORITY};
pub use error::DataError;
pub use ingest::{normalize_rows, ImportBatch};
pub use models::{
    Activity, ActivityKey, HalfTerm, LessonData, LessonPlan, MediaLinks, PlanStatus,
    TagStatements, Unit,
};
pub use registry::{LessonRegistry, BUNDLE_SCHEMA_VERSION};
pub use renumber::{renumber_class_plans, NumberMap};
pub use service::{DataService, ImportSummary};
pub use store::{keys, LocalCache, RemoteConfig, RemoteError, RemoteStore};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
