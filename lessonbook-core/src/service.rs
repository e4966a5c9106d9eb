//! The top-level data service: one explicit context object holding
//! every collection for the active class, reconciling the local cache
//! with the optional remote store.
//!
//! Read precedence: remote (when configured and non-empty), then
//! cache (adopted and opportunistically mirrored back to the remote),
//! then defaults. Every write lands in the cache synchronously first;
//! remote mirroring runs in detached tasks whose failures are logged
//! and never joined.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::error::DataError;
use crate::ingest::{self, ImportBatch};
use crate::models::{tags, Activity, ActivityKey, HalfTerm, LessonData, LessonPlan, TagStatements, Unit};
use crate::registry::LessonRegistry;
use crate::renumber::{renumber_class_plans, NumberMap};
use crate::store::{keys, LocalCache, RemoteConfig, RemoteStore};

/// Counts reported by a table import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub activities: usize,
    pub lessons: usize,
    pub categories: usize,
}

/// Data-layer facade for one active class.
pub struct DataService {
    cache: LocalCache,
    remote: Option<RemoteStore>,
    class: String,
    registry: LessonRegistry,
    plans: Vec<LessonPlan>,
    units: Vec<Unit>,
    half_terms: Vec<HalfTerm>,
    library: Vec<Activity>,
    tag_catalogue: Vec<String>,
}

impl DataService {
    /// Loads every collection for `class`.
    ///
    /// `cleared` is the out-of-band wipe signal: it short-circuits
    /// every loader straight to its empty/default value without
    /// touching either store, which is distinct from "absent" (absent
    /// data re-seeds defaults and may persist them).
    pub async fn open(
        cache: LocalCache,
        remote_config: &RemoteConfig,
        class: impl Into<String>,
        cleared: bool,
    ) -> Result<Self, DataError> {
        let mut service = Self {
            cache,
            remote: RemoteStore::from_config(remote_config),
            class: class.into(),
            registry: LessonRegistry::new(),
            plans: Vec::new(),
            units: Vec::new(),
            half_terms: HalfTerm::defaults(),
            library: Vec::new(),
            tag_catalogue: tags::default_catalogue(),
        };
        if cleared {
            return Ok(service);
        }
        service.load_registry().await?;
        service.load_tag_catalogue().await?;
        service.load_plans().await?;
        service.load_library().await?;
        service.load_units().await?;
        service.load_half_terms().await?;
        Ok(service)
    }

    /// Switches the active class and reloads its collections. The
    /// plan list and activity library are global and stay put.
    pub async fn set_class(&mut self, class: impl Into<String>) -> Result<(), DataError> {
        self.class = class.into();
        self.load_registry().await?;
        self.load_tag_catalogue().await?;
        self.load_units().await?;
        self.load_half_terms().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn registry(&self) -> &LessonRegistry {
        &self.registry
    }

    pub fn lesson(&self, number: &str) -> Option<&LessonData> {
        self.registry.lesson(number)
    }

    pub fn lesson_numbers(&self) -> &[String] {
        &self.registry.lesson_numbers
    }

    pub fn plans(&self) -> &[LessonPlan] {
        &self.plans
    }

    pub fn class_plans(&self) -> impl Iterator<Item = &LessonPlan> {
        self.plans.iter().filter(|p| p.class_name == self.class)
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn half_terms(&self) -> &[HalfTerm] {
        &self.half_terms
    }

    pub fn library(&self) -> &[Activity] {
        &self.library
    }

    pub fn tag_catalogue(&self) -> &[String] {
        &self.tag_catalogue
    }

    // ------------------------------------------------------------------
    // Loaders (read reconciliation)
    // ------------------------------------------------------------------

    async fn load_registry(&mut self) -> Result<(), DataError> {
        if let Some(remote) = &self.remote {
            match remote.fetch_lessons(&self.class).await {
                Ok(Some(bundle)) if !bundle.is_empty() => {
                    self.registry = bundle.repair();
                    tracing::debug!(class = %self.class, "loaded lesson bundle from remote");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(class = %self.class, error = %e,
                        "remote lesson fetch failed, falling back to cache");
                }
            }
        }

        match self
            .cache
            .get::<LessonRegistry>(&keys::lesson_data(&self.class))
            .await?
        {
            Some(bundle) => {
                self.registry = bundle.repair();
                // Self-healing staleness: push the cached copy up.
                let class = self.class.clone();
                self.mirror_bundle(&class, &self.registry.clone());
            }
            None => self.registry = LessonRegistry::new(),
        }
        Ok(())
    }

    async fn load_tag_catalogue(&mut self) -> Result<(), DataError> {
        if let Some(remote) = &self.remote {
            match remote.fetch_tags(&self.class).await {
                Ok(Some(statements)) if !statements.all_statements.is_empty() => {
                    self.tag_catalogue = statements.all_statements;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(class = %self.class, error = %e,
                        "remote tag fetch failed, falling back to cache");
                }
            }
        }

        match self
            .cache
            .get::<std::collections::BTreeMap<String, Vec<String>>>(&keys::tags_structured(
                &self.class,
            ))
            .await?
        {
            Some(structured) => {
                let flat = tags::flatten_structured(&structured);
                self.tag_catalogue = if flat.is_empty() {
                    tags::default_catalogue()
                } else {
                    flat
                };
            }
            None => self.tag_catalogue = tags::default_catalogue(),
        }
        Ok(())
    }

    async fn load_plans(&mut self) -> Result<(), DataError> {
        if let Some(remote) = &self.remote {
            match remote.fetch_plans().await {
                Ok(Some(plans)) => {
                    self.plans = plans;
                    return Ok(());
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "remote plan fetch failed, falling back to cache");
                }
            }
        }
        self.plans = self
            .cache
            .get(keys::USER_LESSON_PLANS)
            .await?
            .unwrap_or_default();
        Ok(())
    }

    /// Loads the activity library. With no remote copy and no cached
    /// copy, the library is seeded by flattening the current bundle
    /// and deduplicating on (name, category), first occurrence wins.
    async fn load_library(&mut self) -> Result<(), DataError> {
        if let Some(remote) = &self.remote {
            match remote.fetch_activities().await {
                Ok(list) if !list.is_empty() => {
                    self.library = list;
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e,
                        "remote activity fetch failed, falling back to cache");
                }
            }
        }

        if let Some(list) = self.cache.get(keys::LIBRARY_ACTIVITIES).await? {
            self.library = list;
            return Ok(());
        }

        let mut seen = HashSet::new();
        let mut extracted = Vec::new();
        for number in &self.registry.lesson_numbers {
            let Some(data) = self.registry.lessons.get(number) else {
                continue;
            };
            for activity in data.activities() {
                if seen.insert(activity.library_key()) {
                    extracted.push(activity.clone());
                }
            }
        }
        self.library = extracted;
        self.cache
            .put(keys::LIBRARY_ACTIVITIES, &self.library)
            .await?;
        self.mirror_library();
        Ok(())
    }

    async fn load_units(&mut self) -> Result<(), DataError> {
        match self.cache.get(&keys::units(&self.class)).await? {
            Some(units) => self.units = units,
            None => {
                self.units = Vec::new();
                self.cache.put(&keys::units(&self.class), &self.units).await?;
            }
        }
        Ok(())
    }

    async fn load_half_terms(&mut self) -> Result<(), DataError> {
        match self
            .cache
            .get::<Vec<HalfTerm>>(&keys::half_terms(&self.class))
            .await?
        {
            Some(terms) if !terms.is_empty() => self.half_terms = terms,
            _ => {
                self.half_terms = HalfTerm::defaults();
                self.cache
                    .put(&keys::half_terms(&self.class), &self.half_terms)
                    .await?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ingestion and the activity library
    // ------------------------------------------------------------------

    /// Runs a tabular import: normalizes rows, rebuilds the class
    /// bundle from them and merges the activities into the global
    /// library keyed by (name, category, lesson_number), last import
    /// wins. Importing the same table twice is a no-op for the
    /// library.
    pub async fn import_table(&mut self, rows: &[Vec<String>]) -> Result<ImportSummary, DataError> {
        let batch = ingest::normalize_rows(rows);
        self.import_batch(&batch).await
    }

    /// Same as [`import_table`](Self::import_table) for an already
    /// normalized batch.
    pub async fn import_batch(&mut self, batch: &ImportBatch) -> Result<ImportSummary, DataError> {
        let mut next = LessonRegistry::assemble(batch);
        next.revision = self.registry.revision;
        self.registry = next;
        self.persist_registry().await?;

        self.merge_into_library(&batch.activities).await?;

        Ok(ImportSummary {
            activities: batch.activities.len(),
            lessons: self.registry.lesson_numbers.len(),
            categories: batch.categories.len(),
        })
    }

    async fn merge_into_library(&mut self, activities: &[Activity]) -> Result<(), DataError> {
        let mut index: HashMap<ActivityKey, usize> = self
            .library
            .iter()
            .enumerate()
            .map(|(i, a)| (a.key(), i))
            .collect();
        for activity in activities {
            match index.get(&activity.key()) {
                Some(&i) => self.library[i] = activity.clone(),
                None => {
                    index.insert(activity.key(), self.library.len());
                    self.library.push(activity.clone());
                }
            }
        }
        self.cache
            .put(keys::LIBRARY_ACTIVITIES, &self.library)
            .await?;
        self.mirror_library();
        Ok(())
    }

    /// Adds a library activity. The local write is the operation; the
    /// remote upsert is best-effort.
    pub async fn add_activity(&mut self, activity: Activity) -> Result<Activity, DataError> {
        self.library.push(activity.clone());
        self.cache
            .put(keys::LIBRARY_ACTIVITIES, &self.library)
            .await?;
        self.mirror_activity_upsert(vec![activity.clone()]);
        Ok(activity)
    }

    pub async fn update_activity(&mut self, activity: Activity) -> Result<Activity, DataError> {
        if let Some(slot) = self.library.iter_mut().find(|a| a.id == activity.id) {
            *slot = activity.clone();
        }
        self.cache
            .put(keys::LIBRARY_ACTIVITIES, &self.library)
            .await?;
        self.mirror_activity_upsert(vec![activity.clone()]);
        Ok(activity)
    }

    pub async fn delete_activity(&mut self, id: &str) -> Result<(), DataError> {
        self.library.retain(|a| a.id != id);
        self.cache
            .put(keys::LIBRARY_ACTIVITIES, &self.library)
            .await?;
        if let Some(remote) = self.remote.clone() {
            let id = id.to_string();
            tokio::spawn(async move {
                if let Err(e) = remote.delete_activity(&id).await {
                    tracing::warn!(id = %id, error = %e, "activity delete mirror failed");
                }
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lesson plans
    // ------------------------------------------------------------------

    /// Upserts a plan by id. A plan bound to a lesson number is also
    /// promoted into its class bundle.
    pub async fn add_or_update_plan(&mut self, mut plan: LessonPlan) -> Result<(), DataError> {
        let now = Utc::now();
        plan.updated_at = now;
        match self.plans.iter().position(|p| p.id == plan.id) {
            Some(i) => {
                plan.created_at = self.plans[i].created_at;
                self.plans[i] = plan.clone();
            }
            None => {
                plan.created_at = now;
                self.plans.push(plan.clone());
            }
        }
        self.persist_plans().await?;

        if plan.lesson_number.is_some() {
            let class = plan.class_name.clone();
            let bundle = self.bundle_for(&class).await?.with_plan_promoted(&plan);
            self.persist_bundle_for(&class, bundle).await?;
        }
        Ok(())
    }

    /// Deletes a plan. When the plan is bound to a lesson number the
    /// surviving numbered plans of its class are compacted onto
    /// 1..=K and the old -> new map is propagated to the class bundle
    /// (lesson data, contained activities, number index, tag map),
    /// every half-term and every unit. An unbound plan only removes
    /// the plan record.
    ///
    /// A failure part-way through leaves the already-applied updates
    /// in place; there is no rollback.
    pub async fn delete_plan(&mut self, plan_id: &str) -> Result<(), DataError> {
        let Some(position) = self.plans.iter().position(|p| p.id == plan_id) else {
            return Err(DataError::PlanNotFound(plan_id.to_string()));
        };
        let deleted = self.plans.remove(position);

        let Some(removed_number) = deleted.lesson_number.clone() else {
            self.persist_plans().await?;
            self.mirror_plan_delete(&deleted.id);
            return Ok(());
        };

        let class = deleted.class_name.clone();
        let map = renumber_class_plans(&mut self.plans, &class);
        self.persist_plans().await?;
        self.mirror_plan_delete(&deleted.id);

        if let Err(e) = self
            .propagate_renumbering(&class, &removed_number, &map)
            .await
        {
            tracing::error!(class = %class, error = %e,
                "renumbering propagation failed part-way; partial remapping kept");
            return Err(e);
        }
        Ok(())
    }

    /// Applies the old -> new map across the class bundle, half-terms
    /// and units, persisting each collection as it goes.
    async fn propagate_renumbering(
        &mut self,
        class: &str,
        removed: &str,
        map: &NumberMap,
    ) -> Result<(), DataError> {
        let bundle = self.bundle_for(class).await?.renumbered(removed, map);
        self.persist_bundle_for(class, bundle).await?;

        let mut terms = self.half_terms_for(class).await?;
        let mut changed = false;
        for term in &mut terms {
            changed |= term.remap_lessons(removed, map);
        }
        if changed || class == self.class {
            self.save_half_terms_for(class, terms).await?;
        }

        let mut units = self.units_for(class).await?;
        let mut changed = false;
        for unit in &mut units {
            changed |= unit.remap_lessons(removed, map);
        }
        if changed {
            self.save_units_for(class, units).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lessons
    // ------------------------------------------------------------------

    /// Plain lesson deletion for the active class: removes exactly
    /// this number's lesson data, index entry, tag entry, unit and
    /// half-term references, and any class plans bound to it.
    /// Surviving lessons are NOT renumbered.
    pub async fn delete_lesson(&mut self, number: &str) -> Result<(), DataError> {
        let bundle = self.registry.without_lesson(number);
        let class = self.class.clone();
        self.persist_bundle_for(&class, bundle).await?;

        let bound_ids: Vec<String> = self
            .plans
            .iter()
            .filter(|p| p.class_name == self.class && p.lesson_number.as_deref() == Some(number))
            .map(|p| p.id.clone())
            .collect();
        if !bound_ids.is_empty() {
            self.plans
                .retain(|p| !(p.class_name == self.class && p.lesson_number.as_deref() == Some(number)));
            self.persist_plans().await?;
            for id in &bound_ids {
                self.mirror_plan_delete(id);
            }
        }

        let mut changed = false;
        for unit in &mut self.units {
            changed |= unit.remove_lesson(number);
        }
        if changed {
            let units = self.units.clone();
            self.save_units_for(&class, units).await?;
        }

        let mut changed = false;
        for term in &mut self.half_terms {
            changed |= term.remove_lesson(number);
        }
        if changed {
            let terms = self.half_terms.clone();
            self.save_half_terms_for(&class, terms).await?;
        }
        Ok(())
    }

    /// Sets the title override on a lesson of the active class.
    pub async fn update_lesson_title(
        &mut self,
        number: &str,
        title: &str,
    ) -> Result<(), DataError> {
        let bundle = self.registry.with_lesson_title(number, title);
        let class = self.class.clone();
        self.persist_bundle_for(&class, bundle).await
    }

    // ------------------------------------------------------------------
    // Curriculum tags
    // ------------------------------------------------------------------

    pub async fn add_tag_to_lesson(&mut self, number: &str, tag: &str) -> Result<(), DataError> {
        let bundle = self.registry.with_tag_added(number, tag);
        let class = self.class.clone();
        self.persist_bundle_for(&class, bundle).await
    }

    pub async fn remove_tag_from_lesson(
        &mut self,
        number: &str,
        tag: &str,
    ) -> Result<(), DataError> {
        let bundle = self.registry.with_tag_removed(number, tag);
        let class = self.class.clone();
        self.persist_bundle_for(&class, bundle).await
    }

    /// Replaces the master tag catalogue for the active class, in
    /// both its flat and structured cache shapes.
    pub async fn set_tag_catalogue(&mut self, statements: Vec<String>) -> Result<(), DataError> {
        self.tag_catalogue = statements;
        let statements = TagStatements::from_flat(&self.tag_catalogue);
        self.cache
            .put(&keys::tags_flat(&self.class), &statements.all_statements)
            .await?;
        self.cache
            .put(
                &keys::tags_structured(&self.class),
                &statements.structured_statements,
            )
            .await?;
        if let Some(remote) = self.remote.clone() {
            let class = self.class.clone();
            tokio::spawn(async move {
                if let Err(e) = remote.put_tags(&class, &statements).await {
                    tracing::warn!(class = %class, error = %e, "tag statements mirror failed");
                }
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Units and half-terms
    // ------------------------------------------------------------------

    /// Upserts a unit by id for the active class.
    pub async fn update_unit(&mut self, mut unit: Unit) -> Result<(), DataError> {
        let now = Utc::now();
        unit.updated_at = now;
        match self.units.iter().position(|u| u.id == unit.id) {
            Some(i) => {
                unit.created_at = self.units[i].created_at;
                self.units[i] = unit;
            }
            None => {
                unit.created_at = now;
                self.units.push(unit);
            }
        }
        let class = self.class.clone();
        let units = self.units.clone();
        self.save_units_for(&class, units).await
    }

    pub async fn delete_unit(&mut self, unit_id: &str) -> Result<(), DataError> {
        self.units.retain(|u| u.id != unit_id);
        let class = self.class.clone();
        let units = self.units.clone();
        self.save_units_for(&class, units).await
    }

    /// Replaces the lesson assignment and completion flag of one
    /// half-term.
    pub async fn update_half_term(
        &mut self,
        half_term_id: &str,
        lessons: Vec<String>,
        is_complete: bool,
    ) -> Result<(), DataError> {
        for term in &mut self.half_terms {
            if term.id == half_term_id {
                term.lessons = lessons.clone();
                term.is_complete = is_complete;
            }
        }
        let class = self.class.clone();
        let terms = self.half_terms.clone();
        self.save_half_terms_for(&class, terms).await
    }

    pub fn lessons_for_half_term(&self, half_term_id: &str) -> Vec<String> {
        self.half_terms
            .iter()
            .find(|t| t.id == half_term_id)
            .map(|t| t.lessons.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Persistence plumbing
    // ------------------------------------------------------------------

    async fn persist_registry(&mut self) -> Result<(), DataError> {
        let class = self.class.clone();
        let bundle = self.registry.clone();
        self.persist_bundle_for(&class, bundle).await
    }

    /// Bumps the revision stamp, writes the bundle to the cache and
    /// mirrors it. The in-memory snapshot is swapped when `class` is
    /// the active one.
    async fn persist_bundle_for(
        &mut self,
        class: &str,
        bundle: LessonRegistry,
    ) -> Result<(), DataError> {
        let bundle = bundle.with_revision_bumped();
        self.cache.put(&keys::lesson_data(class), &bundle).await?;
        self.mirror_bundle(class, &bundle);
        if class == self.class {
            self.registry = bundle;
        }
        Ok(())
    }

    async fn bundle_for(&self, class: &str) -> Result<LessonRegistry, DataError> {
        if class == self.class {
            return Ok(self.registry.clone());
        }
        Ok(self
            .cache
            .get::<LessonRegistry>(&keys::lesson_data(class))
            .await?
            .map(LessonRegistry::repair)
            .unwrap_or_else(LessonRegistry::new))
    }

    async fn units_for(&self, class: &str) -> Result<Vec<Unit>, DataError> {
        if class == self.class {
            return Ok(self.units.clone());
        }
        Ok(self.cache.get(&keys::units(class)).await?.unwrap_or_default())
    }

    async fn save_units_for(&mut self, class: &str, units: Vec<Unit>) -> Result<(), DataError> {
        self.cache.put(&keys::units(class), &units).await?;
        if class == self.class {
            self.units = units;
        }
        Ok(())
    }

    async fn half_terms_for(&self, class: &str) -> Result<Vec<HalfTerm>, DataError> {
        if class == self.class {
            return Ok(self.half_terms.clone());
        }
        Ok(self
            .cache
            .get(&keys::half_terms(class))
            .await?
            .unwrap_or_default())
    }

    async fn save_half_terms_for(
        &mut self,
        class: &str,
        terms: Vec<HalfTerm>,
    ) -> Result<(), DataError> {
        self.cache.put(&keys::half_terms(class), &terms).await?;
        if class == self.class {
            self.half_terms = terms;
        }
        Ok(())
    }

    async fn persist_plans(&mut self) -> Result<(), DataError> {
        self.cache.put(keys::USER_LESSON_PLANS, &self.plans).await?;
        if let Some(remote) = self.remote.clone() {
            let plans = self.plans.clone();
            tokio::spawn(async move {
                if let Err(e) = remote.upsert_plans(&plans).await {
                    tracing::warn!(error = %e, "lesson plan mirror failed");
                }
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fire-and-forget mirroring
    // ------------------------------------------------------------------

    fn mirror_bundle(&self, class: &str, bundle: &LessonRegistry) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let class = class.to_string();
        let bundle = bundle.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.put_lessons(&class, &bundle).await {
                tracing::warn!(class = %class, error = %e, "lesson bundle mirror failed");
            }
        });
    }

    fn mirror_library(&self) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let activities = self.library.clone();
        tokio::spawn(async move {
            if let Err(e) = remote.upsert_activities(&activities).await {
                tracing::warn!(error = %e, "activity library mirror failed");
            }
        });
    }

    fn mirror_activity_upsert(&self, activities: Vec<Activity>) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = remote.upsert_activities(&activities).await {
                tracing::warn!(error = %e, "activity mirror failed");
            }
        });
    }

    fn mirror_plan_delete(&self, plan_id: &str) {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let plan_id = plan_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = remote.delete_plan(&plan_id).await {
                tracing::warn!(id = %plan_id, error = %e, "plan delete mirror failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStatus;
    use tempfile::TempDir;

    struct TestContext {
        temp_dir: TempDir,
    }

    impl TestContext {
        fn new() -> Self {
            Self {
                temp_dir: TempDir::new().unwrap(),
            }
        }

        async fn cache(&self) -> LocalCache {
            LocalCache::open(&self.temp_dir.path().join("cache.db"))
                .await
                .unwrap()
        }

        async fn service(&self) -> DataService {
            DataService::open(self.cache().await, &RemoteConfig::default(), "LKG", false)
                .await
                .unwrap()
        }
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_table() -> Vec<Vec<String>> {
        vec![
            row(&["Lesson", "Category", "Activity", "Desc", "Level", "Time"]),
            row(&["1", "Welcome", "Hello Song", "", "", "3"]),
            row(&["", "Goodbye", "Wave Goodbye", "", "", "2"]),
            row(&["2", "Rhythm Sticks", "Stick Tap", "", "", "5"]),
            row(&["3", "Kodaly Songs", "So-Mi Echo", "", "", "4"]),
        ]
    }

    fn numbered_plan(class: &str, number: &str) -> LessonPlan {
        LessonPlan::new(class, Utc::now())
            .with_lesson_number(number)
            .with_title(format!("Plan {}", number))
            .with_activities(vec![Activity::new(
                format!("Song {}", number),
                "Welcome",
                number,
            )
            .with_duration(3)])
    }

    fn class_numbers(service: &DataService) -> Vec<String> {
        let mut plans: Vec<&LessonPlan> = service.class_plans().collect();
        plans.sort_by_key(|p| p.numeric_lesson_number().unwrap_or(i64::MAX));
        plans
            .iter()
            .filter_map(|p| p.lesson_number.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_open_empty_seeds_defaults() {
        let ctx = TestContext::new();
        let service = ctx.service().await;
        assert!(service.registry().is_empty());
        assert!(service.units().is_empty());
        assert_eq!(service.half_terms().len(), 6);
        assert_eq!(service.tag_catalogue(), &tags::default_catalogue()[..]);
        assert!(service.library().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_open_ignores_cached_state() {
        let ctx = TestContext::new();
        {
            let mut service = ctx.service().await;
            service.import_table(&sample_table()).await.unwrap();
            service
                .update_half_term("A1", vec!["1".into()], true)
                .await
                .unwrap();
        }
        let service = DataService::open(ctx.cache().await, &RemoteConfig::default(), "LKG", true)
            .await
            .unwrap();
        assert!(service.registry().is_empty());
        assert!(service.half_terms().iter().all(|t| t.lessons.is_empty()));
        assert!(service.library().is_empty());
    }

    #[tokio::test]
    async fn test_import_assembles_registry_and_persists() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let summary = service.import_table(&sample_table()).await.unwrap();
        assert_eq!(summary.activities, 4);
        assert_eq!(summary.lessons, 3);
        assert_eq!(summary.categories, 4);
        assert_eq!(service.lesson_numbers(), ["1", "2", "3"]);

        // A fresh service over the same cache sees the same data.
        let reloaded = ctx.service().await;
        assert_eq!(reloaded.lesson_numbers(), ["1", "2", "3"]);
        assert_eq!(
            reloaded.lesson("1").unwrap().title.as_deref(),
            Some("Standard Lesson")
        );
    }

    #[tokio::test]
    async fn test_import_twice_is_idempotent_for_library() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        let first: Vec<ActivityKey> = service.library().iter().map(Activity::key).collect();
        service.import_table(&sample_table()).await.unwrap();
        let second: Vec<ActivityKey> = service.library().iter().map(Activity::key).collect();
        assert_eq!(first, second);
        assert_eq!(service.library().len(), 4);
    }

    #[tokio::test]
    async fn test_library_seeded_from_bundle_dedups_by_name_category() {
        let ctx = TestContext::new();
        {
            // Build a bundle whose lessons share an activity, then
            // drop the cached library so the next open re-seeds it.
            let mut service = ctx.service().await;
            let rows = vec![
                row(&["Lesson", "Category", "Activity", "Desc", "Level", "Time"]),
                row(&["1", "Welcome", "Hello Song", "", "", "3"]),
                row(&["2", "Welcome", "Hello Song", "", "", "3"]),
                row(&["", "Goodbye", "Wave Goodbye", "", "", "2"]),
            ];
            service.import_table(&rows).await.unwrap();
            ctx.cache()
                .await
                .remove(keys::LIBRARY_ACTIVITIES)
                .await
                .unwrap();
        }
        let service = ctx.service().await;
        // Import kept both lesson-1 and lesson-2 copies; seeding keeps
        // the first (name, category) occurrence only.
        assert_eq!(service.library().len(), 2);
        assert_eq!(service.library()[0].lesson_number, "1");
    }

    #[tokio::test]
    async fn test_plan_promotion_updates_bundle() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        service
            .add_or_update_plan(numbered_plan("LKG", "5"))
            .await
            .unwrap();
        assert_eq!(service.lesson_numbers(), ["1", "2", "3", "5"]);
        let lesson = service.lesson("5").unwrap();
        assert_eq!(lesson.title.as_deref(), Some("Plan 5"));
        assert_eq!(lesson.total_duration, 3);
    }

    #[tokio::test]
    async fn test_plan_update_keeps_created_at() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let plan = LessonPlan::new("LKG", Utc::now()).with_status(PlanStatus::Draft);
        service.add_or_update_plan(plan.clone()).await.unwrap();
        let created = service.plans()[0].created_at;

        let mut edited = plan.clone();
        edited.notes = "warm-up first".to_string();
        service.add_or_update_plan(edited).await.unwrap();
        assert_eq!(service.plans().len(), 1);
        assert_eq!(service.plans()[0].created_at, created);
        assert_eq!(service.plans()[0].notes, "warm-up first");
    }

    #[tokio::test]
    async fn test_delete_unbound_plan_touches_nothing_else() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        let plan = LessonPlan::new("LKG", Utc::now());
        let id = plan.id.clone();
        service.add_or_update_plan(plan).await.unwrap();

        let revision = service.registry().revision;
        service.delete_plan(&id).await.unwrap();
        assert!(service.plans().is_empty());
        assert_eq!(service.registry().revision, revision);
        assert_eq!(service.lesson_numbers(), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_delete_missing_plan_is_an_error() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let result = service.delete_plan("nope").await;
        assert!(matches!(result, Err(DataError::PlanNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_plan_renumbers_every_collection() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let mut ids = Vec::new();
        for n in ["1", "2", "3", "4"] {
            let plan = numbered_plan("LKG", n);
            ids.push((n, plan.id.clone()));
            service.add_or_update_plan(plan).await.unwrap();
        }
        service
            .update_half_term("A1", vec!["1".into(), "2".into()], false)
            .await
            .unwrap();
        service
            .update_half_term("A2", vec!["3".into(), "4".into()], true)
            .await
            .unwrap();
        service
            .update_unit(
                Unit::new("Pulse and Beat", "#3b82f6")
                    .with_lesson_numbers(vec!["2".into(), "3".into(), "4".into()]),
            )
            .await
            .unwrap();
        service
            .add_tag_to_lesson("3", "Rhythm and Pulse: Keeps a steady beat with body percussion")
            .await
            .unwrap();

        let deleted_id = ids.iter().find(|(n, _)| *n == "2").unwrap().1.clone();
        service.delete_plan(&deleted_id).await.unwrap();

        // Survivors occupy exactly {1,2,3} in prior relative order.
        assert_eq!(class_numbers(&service), vec!["1", "2", "3"]);

        // Old key "2" now holds what was lesson 3, restamped.
        assert_eq!(service.lesson_numbers(), ["1", "2", "3"]);
        let moved = service.lesson("2").unwrap();
        let names: Vec<&str> = moved.activities().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Song 3"]);
        assert!(moved.activities().all(|a| a.lesson_number == "2"));
        assert!(service.lesson("4").is_none());

        // The tag followed its lesson from 3 to 2.
        assert_eq!(service.registry().tag_map["2"].len(), 1);
        assert!(!service.registry().tag_map.contains_key("3"));

        // Half-terms and units carry no stale references.
        assert_eq!(service.lessons_for_half_term("A1"), vec!["1"]);
        assert_eq!(service.lessons_for_half_term("A2"), vec!["2", "3"]);
        assert_eq!(service.units()[0].lesson_numbers, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_deletion_sequences_stay_contiguous() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let mut ids = Vec::new();
        for n in ["1", "2", "3", "4", "5"] {
            let plan = numbered_plan("LKG", n);
            ids.push(plan.id.clone());
            service.add_or_update_plan(plan).await.unwrap();
        }

        // Delete plans originally numbered 4, 1, 3 in that order.
        for original in [3usize, 0, 2] {
            service.delete_plan(&ids[original]).await.unwrap();
            let survivors = class_numbers(&service);
            let expected: Vec<String> =
                (1..=survivors.len()).map(|k| k.to_string()).collect();
            assert_eq!(survivors, expected);
            assert_eq!(service.lesson_numbers(), &expected[..]);
        }

        // Relative order preserved: the survivors are the plans that
        // started as 2 and 5, in that order.
        let titles: Vec<&str> = service
            .class_plans()
            .filter_map(|p| p.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["Plan 2", "Plan 5"]);
    }

    #[tokio::test]
    async fn test_plain_lesson_deletion_does_not_renumber() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        for n in ["1", "2", "3"] {
            service
                .add_or_update_plan(numbered_plan("LKG", n))
                .await
                .unwrap();
        }
        service
            .update_half_term("A1", vec!["1".into(), "2".into(), "3".into()], false)
            .await
            .unwrap();
        service
            .update_unit(
                Unit::new("Listening", "#ef4444")
                    .with_lesson_numbers(vec!["2".into(), "3".into()]),
            )
            .await
            .unwrap();

        service.delete_lesson("2").await.unwrap();

        // "3" keeps its number; only exact references to "2" are gone.
        assert_eq!(service.lesson_numbers(), ["1", "3"]);
        assert!(service.lesson("3").is_some());
        assert_eq!(service.lessons_for_half_term("A1"), vec!["1", "3"]);
        assert_eq!(service.units()[0].lesson_numbers, vec!["3"]);
        // The plan bound to "2" went with it; others keep numbers.
        assert_eq!(class_numbers(&service), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_title_and_tag_edits_persist() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        service
            .update_lesson_title("1", "Opening Circle")
            .await
            .unwrap();
        service
            .add_tag_to_lesson("1", "Singing: Joins in with repeated refrains")
            .await
            .unwrap();

        let reloaded = ctx.service().await;
        let lesson = reloaded.lesson("1").unwrap();
        assert_eq!(lesson.title.as_deref(), Some("Opening Circle"));
        assert_eq!(lesson.tags.len(), 1);
        assert_eq!(reloaded.registry().tag_map["1"].len(), 1);
    }

    #[tokio::test]
    async fn test_revision_strictly_increases() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        let r1 = service.registry().revision;
        service.update_lesson_title("1", "A").await.unwrap();
        let r2 = service.registry().revision;
        service
            .add_tag_to_lesson("1", "Expression: Explores loud and quiet sounds")
            .await
            .unwrap();
        let r3 = service.registry().revision;
        assert!(r1 < r2 && r2 < r3);
    }

    #[tokio::test]
    async fn test_unreachable_remote_still_writes_locally() {
        let ctx = TestContext::new();
        let remote = RemoteConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            api_key: None,
        };
        {
            let mut service = DataService::open(ctx.cache().await, &remote, "LKG", false)
                .await
                .unwrap();
            service.import_table(&sample_table()).await.unwrap();
        }
        // A simulated reload falls back to the cache and returns the
        // just-written value.
        let service = DataService::open(ctx.cache().await, &remote, "LKG", false)
            .await
            .unwrap();
        assert_eq!(service.lesson_numbers(), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_corrupt_bundle_resets_to_empty() {
        let ctx = TestContext::new();
        ctx.cache()
            .await
            .put(&keys::lesson_data("LKG"), &"not a bundle")
            .await
            .unwrap();
        let service = ctx.service().await;
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_set_class_swaps_per_class_state() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        service.import_table(&sample_table()).await.unwrap();
        service
            .add_or_update_plan(numbered_plan("LKG", "1"))
            .await
            .unwrap();
        let library_len = service.library().len();

        service.set_class("UKG").await.unwrap();
        assert!(service.registry().is_empty());
        assert_eq!(service.half_terms().len(), 6);
        // Globals survive the switch.
        assert_eq!(service.plans().len(), 1);
        assert_eq!(service.library().len(), library_len);

        service.set_class("LKG").await.unwrap();
        assert_eq!(service.lesson_numbers(), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_unit_upsert_and_delete() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let unit = Unit::new("Pitch Play", "#10b981").with_lesson_numbers(vec!["1".into()]);
        let id = unit.id.clone();
        service.update_unit(unit.clone()).await.unwrap();
        assert_eq!(service.units().len(), 1);

        let mut edited = unit;
        edited.name = "Pitch and Pulse".to_string();
        service.update_unit(edited).await.unwrap();
        assert_eq!(service.units().len(), 1);
        assert_eq!(service.units()[0].name, "Pitch and Pulse");

        service.delete_unit(&id).await.unwrap();
        assert!(service.units().is_empty());
    }

    #[tokio::test]
    async fn test_tag_catalogue_roundtrip() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let statements = vec![
            "Singing: Matches pitch over a small range".to_string(),
            "Movement: Moves in time with the music".to_string(),
        ];
        service.set_tag_catalogue(statements.clone()).await.unwrap();

        let reloaded = ctx.service().await;
        let mut expected = statements;
        expected.sort();
        let mut actual = reloaded.tag_catalogue().to_vec();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_activity_crud_is_local_first() {
        let ctx = TestContext::new();
        let mut service = ctx.service().await;
        let activity = Activity::new("Drum Circle", "Percussion Games", "1").with_duration(10);
        let id = activity.id.clone();
        service.add_activity(activity.clone()).await.unwrap();
        assert_eq!(service.library().len(), 1);

        let mut edited = activity;
        edited.duration_minutes = 12;
        service.update_activity(edited).await.unwrap();
        assert_eq!(service.library()[0].duration_minutes, 12);

        service.delete_activity(&id).await.unwrap();
        assert!(service.library().is_empty());

        let reloaded = ctx.service().await;
        assert!(reloaded.library().is_empty());
    }
}
