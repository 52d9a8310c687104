//! Application facade tying the log, estimator and store together
//!
//! Every mutating call builds the changed section, writes it to the store and
//! only then replaces the in-memory copy, so a failed write leaves the
//! tracker as it was.

use chrono::NaiveDate;
use rand::Rng;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::activity_log::ActivityLog;
use crate::error::Result;
use crate::estimator::MetricsEstimator;
use crate::export::{self, ExportBundle};
use crate::import::{ImportManager, ImportMode, ImportedData};
use crate::models::{new_entry_id, ActivityKind, Entry, Goals, PartialMetrics, Profile};
use crate::sample::generate_sample_data;
use crate::store::{
    save_json, AppState, KeyValueStore, ACTIVITY_LOG_KEY, GOALS_KEY, PROFILE_KEY,
};

/// What an import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub entries: usize,
    pub profile_replaced: bool,
    pub goals_replaced: bool,
}

pub struct Tracker<S: KeyValueStore> {
    store: S,
    state: AppState,
    estimator: MetricsEstimator,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load persisted state from `store`
    pub fn open(store: S, estimator: MetricsEstimator) -> Result<Self> {
        let state = AppState::load(&store)?;
        Ok(Self {
            store,
            state,
            estimator,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn log(&self) -> &ActivityLog {
        &self.state.log
    }

    pub fn profile(&self) -> &Profile {
        &self.state.profile
    }

    pub fn goals(&self) -> &Goals {
        &self.state.goals
    }

    pub fn estimator(&self) -> &MetricsEstimator {
        &self.estimator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Estimate the missing metrics and log the activity
    #[instrument(skip(self, notes))]
    pub fn add_activity(
        &mut self,
        date: NaiveDate,
        kind: &str,
        partial: PartialMetrics,
        notes: &str,
    ) -> Result<Entry> {
        let kind = kind.parse::<ActivityKind>().map_err(|e| {
            warn!(kind, "Rejected unknown activity kind");
            e
        })?;
        let entry = self
            .estimator
            .build_entry(kind, &self.state.profile, partial, notes);
        self.push(date, entry)
    }

    /// Log an activity from duration alone, using the configured default when absent
    pub fn add_activity_auto(
        &mut self,
        date: NaiveDate,
        kind: ActivityKind,
        duration_minutes: Option<f64>,
        notes: &str,
    ) -> Result<Entry> {
        let metrics = self
            .estimator
            .estimate_auto(kind, &self.state.profile, duration_minutes);
        self.push(date, Entry::new(kind, metrics, notes))
    }

    fn push(&mut self, date: NaiveDate, entry: Entry) -> Result<Entry> {
        let mut log = self.state.log.clone();
        log.add_entry(date, entry.clone());
        self.commit_log(log)?;
        info!(%date, id = %entry.id, kind = %entry.activity_kind, "Logged activity");
        Ok(entry)
    }

    /// Persist `log`, then make it the current log
    fn commit_log(&mut self, log: ActivityLog) -> Result<()> {
        save_json(&mut self.store, ACTIVITY_LOG_KEY, &log)?;
        self.state.log = log;
        Ok(())
    }

    pub fn edit_notes(&mut self, date: NaiveDate, id: &str, notes: &str) -> Result<()> {
        let mut log = self.state.log.clone();
        log.update_notes(date, id, notes)?;
        self.commit_log(log)
    }

    /// Remove one entry; its date disappears when it was the last one
    pub fn delete_entry(&mut self, date: NaiveDate, id: &str) -> Result<Entry> {
        let mut log = self.state.log.clone();
        let removed = log.remove_entry(date, id)?;
        self.commit_log(log)?;
        info!(%date, id, "Deleted entry");
        Ok(removed)
    }

    pub fn update_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        save_json(&mut self.store, PROFILE_KEY, &profile)?;
        self.state.profile = profile;
        Ok(())
    }

    pub fn update_goals(&mut self, goals: Goals) -> Result<()> {
        goals.validate()?;
        save_json(&mut self.store, GOALS_KEY, &goals)?;
        self.state.goals = goals;
        Ok(())
    }

    /// Import a CSV or JSON file, picking the format from its extension
    pub fn import_file(&mut self, path: &Path, mode: ImportMode) -> Result<ImportSummary> {
        let data = ImportManager::new().import_file(path)?;
        self.apply_import(data, mode)
    }

    /// Apply already-parsed import data and persist the result
    pub fn apply_import(&mut self, data: ImportedData, mode: ImportMode) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut next = self.state.clone();

        match data {
            ImportedData::Entries(entries) => {
                summary.entries = entries.len();
                match mode {
                    ImportMode::Replace => next.log = entries.into_iter().collect(),
                    ImportMode::Append => next.log.extend(entries),
                }
            }
            ImportedData::Bundle(bundle) => {
                if let Some(profile) = bundle.profile {
                    next.profile = profile;
                    summary.profile_replaced = true;
                }
                if let Some(goals) = bundle.goals {
                    next.goals = goals;
                    summary.goals_replaced = true;
                }
                if let Some(log) = bundle.activity_data {
                    summary.entries = log.entry_count();
                    match mode {
                        ImportMode::Replace => next.log = log,
                        ImportMode::Append => next.log.extend(log.iter().map(|(date, entry)| {
                            let entry = Entry {
                                id: new_entry_id(),
                                ..entry.clone()
                            };
                            (date, entry)
                        })),
                    }
                }
            }
        }

        next.save(&mut self.store)?;
        self.state = next;
        info!(?mode, ?summary, "Imported data");
        Ok(summary)
    }

    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle {
            profile: self.state.profile.clone(),
            goals: self.state.goals.clone(),
            activity_data: self.state.log.clone(),
        }
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        export::csv::export_csv(&self.state.log, path)
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        export::json::export_bundle(&self.export_bundle(), path)
    }

    /// Erase the activity log; profile and goals are kept
    pub fn reset(&mut self) -> Result<()> {
        warn!(entries = self.state.log.entry_count(), "Clearing activity log");
        self.store.remove(ACTIVITY_LOG_KEY)?;
        self.state.log.clear();
        Ok(())
    }

    /// Append generated sample activities ending at `today`
    pub fn load_sample_data<R: Rng>(
        &mut self,
        today: NaiveDate,
        days: u32,
        rng: &mut R,
    ) -> Result<usize> {
        let entries = generate_sample_data(&self.estimator, &self.state.profile, today, days, rng);
        let count = entries.len();
        let mut log = self.state.log.clone();
        log.extend(entries);
        self.commit_log(log)?;
        info!(days, entries = count, "Loaded sample data");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ActivityLogError, StorageError};
    use crate::import::ImportBundle;
    use crate::store::{load_json, MemoryStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn tracker() -> Tracker<MemoryStore> {
        Tracker::open(MemoryStore::new(), MetricsEstimator::default()).unwrap()
    }

    /// Serves reads from `inner` and refuses every write
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    /// A tracker over one logged walk whose store rejects writes
    fn read_only_tracker() -> (Tracker<ReadOnlyStore>, Entry) {
        let mut seeded = tracker();
        let entry = seeded
            .add_activity_auto(date(26), ActivityKind::Walking, Some(30.0), "")
            .unwrap();
        let store = ReadOnlyStore {
            inner: seeded.store().clone(),
        };
        (Tracker::open(store, MetricsEstimator::default()).unwrap(), entry)
    }

    #[test]
    fn test_add_activity_persists() {
        let mut tracker = tracker();
        let entry = tracker
            .add_activity(date(26), "walking", PartialMetrics::from_duration(30.0), "park")
            .unwrap();

        assert_eq!(entry.steps, 3000);
        assert_eq!(entry.calories, 123);

        let stored: ActivityLog = load_json(tracker.store(), ACTIVITY_LOG_KEY).unwrap().unwrap();
        assert_eq!(stored.find_entry(date(26), &entry.id), Some(&entry));
    }

    #[test]
    fn test_add_unknown_activity_is_rejected() {
        let mut tracker = tracker();
        let err = tracker
            .add_activity(date(26), "rowing", PartialMetrics::from_duration(30.0), "")
            .unwrap_err();

        assert!(matches!(err, ActivityLogError::InvalidActivityKind(_)));
        assert!(tracker.log().is_empty());
    }

    #[test]
    fn test_add_activity_auto_uses_default_duration() {
        let mut tracker = tracker();
        let entry = tracker
            .add_activity_auto(date(26), ActivityKind::Cycling, None, "")
            .unwrap();

        assert_eq!(entry.duration_minutes, 30.0);
        assert_eq!(entry.distance_km, 9.0);
    }

    #[test]
    fn test_delete_prunes_and_persists() {
        let mut tracker = tracker();
        let entry = tracker
            .add_activity_auto(date(26), ActivityKind::Swimming, Some(20.0), "")
            .unwrap();

        tracker.delete_entry(date(26), &entry.id).unwrap();
        assert!(!tracker.log().has_entries(date(26)));

        let err = tracker.delete_entry(date(26), &entry.id).unwrap_err();
        assert!(matches!(
            err,
            ActivityLogError::Storage(StorageError::EntryNotFound { .. })
        ));

        let reopened = Tracker::open(tracker.store().clone(), MetricsEstimator::default()).unwrap();
        assert!(reopened.log().is_empty());
    }

    #[test]
    fn test_edit_notes() {
        let mut tracker = tracker();
        let entry = tracker
            .add_activity_auto(date(26), ActivityKind::Jogging, Some(25.0), "")
            .unwrap();

        tracker.edit_notes(date(26), &entry.id, "intervals").unwrap();
        assert_eq!(tracker.log().find_entry(date(26), &entry.id).unwrap().notes, "intervals");
    }

    #[test]
    fn test_profile_changes_later_estimates() {
        let mut tracker = tracker();
        tracker
            .update_profile(Profile {
                name: "Ana".to_string(),
                age: 40,
                weight: 50.0,
                resting_heart_rate: 50,
            })
            .unwrap();

        let entry = tracker
            .add_activity_auto(date(26), ActivityKind::Walking, Some(60.0), "")
            .unwrap();
        // 3.5 * 50 * 1h
        assert_eq!(entry.calories, 175);
    }

    #[test]
    fn test_bundle_import_replaces_present_sections() {
        let mut tracker = tracker();
        tracker
            .add_activity_auto(date(20), ActivityKind::Walking, Some(10.0), "")
            .unwrap();

        let mut log = ActivityLog::new();
        log.add_entry(
            date(26),
            Entry::new(
                ActivityKind::Cycling,
                tracker
                    .estimator()
                    .estimate_auto(ActivityKind::Cycling, &Profile::default(), Some(40.0)),
                "",
            ),
        );
        let bundle = ImportBundle {
            goals: Some(Goals {
                steps: 6000,
                ..Goals::default()
            }),
            activity_data: Some(log.clone()),
            ..ImportBundle::default()
        };

        let summary = tracker
            .apply_import(ImportedData::Bundle(bundle), ImportMode::Replace)
            .unwrap();

        assert_eq!(summary.entries, 1);
        assert!(summary.goals_replaced);
        assert!(!summary.profile_replaced);
        assert_eq!(tracker.goals().steps, 6000);
        assert_eq!(tracker.profile(), &Profile::default());
        assert_eq!(tracker.log(), &log);
    }

    #[test]
    fn test_entries_import_append() {
        let mut tracker = tracker();
        tracker
            .add_activity_auto(date(26), ActivityKind::Walking, Some(10.0), "")
            .unwrap();

        let imported = tracker
            .estimator()
            .build_entry(ActivityKind::Jogging, &Profile::default(), PartialMetrics::from_duration(20.0), "");
        tracker
            .apply_import(ImportedData::Entries(vec![(date(26), imported)]), ImportMode::Append)
            .unwrap();

        assert_eq!(tracker.log().entries_for(date(26)).len(), 2);
    }

    #[test]
    fn test_reset_keeps_profile() {
        let mut tracker = tracker();
        tracker
            .update_goals(Goals {
                steps: 12_000,
                ..Goals::default()
            })
            .unwrap();
        tracker
            .add_activity_auto(date(26), ActivityKind::Walking, Some(10.0), "")
            .unwrap();

        tracker.reset().unwrap();
        assert!(tracker.log().is_empty());

        let reopened = Tracker::open(tracker.store().clone(), MetricsEstimator::default()).unwrap();
        assert!(reopened.log().is_empty());
        assert_eq!(reopened.goals().steps, 12_000);
    }

    #[test]
    fn test_load_sample_data() {
        let mut tracker = tracker();
        let mut rng = StdRng::seed_from_u64(42);
        let count = tracker.load_sample_data(date(26), 5, &mut rng).unwrap();

        assert_eq!(tracker.log().entry_count(), count);
        assert_eq!(tracker.log().day_count(), 5);
    }

    #[test]
    fn test_failed_write_leaves_log_unchanged() {
        let (mut tracker, entry) = read_only_tracker();
        let before = tracker.state().clone();

        let err = tracker
            .add_activity(date(26), "jogging", PartialMetrics::from_duration(20.0), "")
            .unwrap_err();
        assert!(matches!(err, ActivityLogError::Io(_)));
        assert!(tracker.add_activity_auto(date(27), ActivityKind::Cycling, None, "").is_err());
        assert!(tracker.edit_notes(date(26), &entry.id, "changed").is_err());
        assert!(tracker.delete_entry(date(26), &entry.id).is_err());
        assert!(tracker.reset().is_err());

        let mut rng = StdRng::seed_from_u64(1);
        assert!(tracker.load_sample_data(date(26), 3, &mut rng).is_err());

        assert_eq!(tracker.state(), &before);
        assert_eq!(tracker.log().entry_count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_profile_goals_and_imports_unchanged() {
        let (mut tracker, _) = read_only_tracker();
        let before = tracker.state().clone();

        let profile = Profile {
            name: "Ana".to_string(),
            ..Profile::default()
        };
        assert!(tracker.update_profile(profile.clone()).is_err());
        assert!(tracker
            .update_goals(Goals {
                steps: 1,
                ..Goals::default()
            })
            .is_err());

        let bundle = ImportBundle {
            profile: Some(profile),
            activity_data: Some(ActivityLog::new()),
            ..ImportBundle::default()
        };
        assert!(tracker
            .apply_import(ImportedData::Bundle(bundle), ImportMode::Replace)
            .is_err());
        assert!(tracker
            .apply_import(ImportedData::Entries(Vec::new()), ImportMode::Replace)
            .is_err());

        assert_eq!(tracker.state(), &before);
    }

    #[test]
    fn test_add_activity_auto_keeps_notes() {
        let mut tracker = tracker();
        let entry = tracker
            .add_activity_auto(date(26), ActivityKind::Swimming, Some(30.0), "laps")
            .unwrap();

        let stored: ActivityLog = load_json(tracker.store(), ACTIVITY_LOG_KEY).unwrap().unwrap();
        assert_eq!(stored.find_entry(date(26), &entry.id).unwrap().notes, "laps");
    }

    #[test]
    fn test_invalid_profile_and_goals_are_rejected() {
        let mut tracker = tracker();

        let err = tracker
            .update_profile(Profile {
                weight: -3.0,
                ..Profile::default()
            })
            .unwrap_err();
        assert!(matches!(err, ActivityLogError::Validation(_)));
        assert!(tracker
            .update_profile(Profile {
                age: 0,
                ..Profile::default()
            })
            .is_err());
        assert!(tracker
            .update_goals(Goals {
                duration_minutes: f64::NAN,
                ..Goals::default()
            })
            .is_err());

        assert_eq!(tracker.profile(), &Profile::default());
        assert_eq!(tracker.goals(), &Goals::default());
        assert!(load_json::<Profile, _>(tracker.store(), PROFILE_KEY).unwrap().is_none());
    }
}
