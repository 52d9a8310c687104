//! Date-keyed activity log
//!
//! A date is present only while it has at least one entry. Every removal runs
//! an explicit prune step, and deserialization drops empty days.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::models::{ActivityKind, Entry};

/// Mapping from calendar date to the entries logged that day, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActivityLog {
    days: BTreeMap<NaiveDate, Vec<Entry>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the end of the date's list, creating the date if needed
    pub fn add_entry(&mut self, date: NaiveDate, entry: Entry) {
        debug!(%date, id = %entry.id, kind = %entry.activity_kind, "Adding entry");
        self.days.entry(date).or_default().push(entry);
    }

    /// Remove one entry by id, pruning the date if it empties
    pub fn remove_entry(&mut self, date: NaiveDate, id: &str) -> Result<Entry> {
        let entries = self.days.get_mut(&date).ok_or_else(|| StorageError::EntryNotFound {
            date,
            id: id.to_string(),
        })?;

        let position = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StorageError::EntryNotFound {
                date,
                id: id.to_string(),
            })?;

        let removed = entries.remove(position);
        self.prune(date);
        debug!(%date, id, "Removed entry");
        Ok(removed)
    }

    /// Replace the notes of one entry; notes are the only editable field
    pub fn update_notes(&mut self, date: NaiveDate, id: &str, notes: impl Into<String>) -> Result<()> {
        let entry = self
            .days
            .get_mut(&date)
            .and_then(|entries| entries.iter_mut().find(|e| e.id == id))
            .ok_or_else(|| StorageError::EntryNotFound {
                date,
                id: id.to_string(),
            })?;

        entry.notes = notes.into();
        Ok(())
    }

    /// Drop the date key when its list is empty
    fn prune(&mut self, date: NaiveDate) {
        if self.days.get(&date).is_some_and(|entries| entries.is_empty()) {
            self.days.remove(&date);
            debug!(%date, "Pruned empty day");
        }
    }

    /// Entries for a date; empty slice when absent
    pub fn entries_for(&self, date: NaiveDate) -> &[Entry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_entry(&self, date: NaiveDate, id: &str) -> Option<&Entry> {
        self.entries_for(date).iter().find(|e| e.id == id)
    }

    pub fn has_entries(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Logged dates in ascending order
    pub fn dates(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    /// Every `(date, entry)` pair, dates ascending, entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Entry)> + '_ {
        self.days
            .iter()
            .flat_map(|(date, entries)| entries.iter().map(move |e| (*date, e)))
    }

    /// Number of days with at least one entry
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn entry_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total minutes of one activity kind on a date
    pub fn duration_for_kind(&self, date: NaiveDate, kind: ActivityKind) -> f64 {
        self.entries_for(date)
            .iter()
            .filter(|e| e.activity_kind == kind)
            .map(|e| e.duration_minutes)
            .sum()
    }

    /// Erase everything
    pub fn clear(&mut self) {
        self.days.clear();
    }

    /// Append a batch of dated entries, as produced by an importer
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (NaiveDate, Entry)>,
    {
        for (date, entry) in entries {
            self.add_entry(date, entry);
        }
    }
}

impl FromIterator<(NaiveDate, Entry)> for ActivityLog {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Entry)>>(iter: I) -> Self {
        let mut log = ActivityLog::new();
        log.extend(iter);
        log
    }
}

/// Accepts both a bare entry list and the older `{ "entries": [...] }` wrapper
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDay {
    Entries(Vec<Entry>),
    Wrapped { entries: Vec<Entry> },
}

impl<'de> Deserialize<'de> for ActivityLog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let stored = BTreeMap::<NaiveDate, StoredDay>::deserialize(deserializer)?;

        let days = stored
            .into_iter()
            .map(|(date, day)| {
                let entries = match day {
                    StoredDay::Entries(entries) => entries,
                    StoredDay::Wrapped { entries } => entries,
                };
                (date, entries)
            })
            .filter(|(_, entries)| !entries.is_empty())
            .collect();

        Ok(ActivityLog { days })
    }
}
