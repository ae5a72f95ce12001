//! Mutual fund NAV history

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fund state recorded at the end of one step
///
/// `nav_per_share` is measured before that step's flow; `cash`, `nav` and
/// `shares` are the post-flow values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    pub step: usize,
    pub bond_value: f64,
    pub cash: f64,
    pub nav: f64,
    pub nav_per_share: f64,
    pub shares: f64,
    pub flow: f64,
}

/// A serialized history lists the same step more than once
#[derive(Debug, Clone, PartialEq, Error)]
#[error("NAV history records step {0} more than once")]
pub struct DuplicateNavStep(pub usize);

/// Write-once NAV history keyed by step
///
/// Serialized as a plain list of entries; a list that repeats a step is
/// rejected on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NavEntry>", into = "Vec<NavEntry>")]
pub struct NavHistory {
    entries: BTreeMap<usize, NavEntry>,
}

impl NavHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; returns false (and keeps the old one) if the step
    /// was already recorded
    pub fn record(&mut self, entry: NavEntry) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(entry.step) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, step: usize) -> Option<&NavEntry> {
        self.entries.get(&step)
    }

    pub fn latest(&self) -> Option<&NavEntry> {
        self.entries.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in step order
    pub fn entries(&self) -> impl Iterator<Item = &NavEntry> {
        self.entries.values()
    }
}

impl TryFrom<Vec<NavEntry>> for NavHistory {
    type Error = DuplicateNavStep;

    fn try_from(entries: Vec<NavEntry>) -> Result<Self, Self::Error> {
        let mut history = Self::new();
        for entry in entries {
            let step = entry.step;
            if !history.record(entry) {
                return Err(DuplicateNavStep(step));
            }
        }
        Ok(history)
    }
}

impl From<NavHistory> for Vec<NavEntry> {
    fn from(history: NavHistory) -> Self {
        history.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(step: usize, nav_per_share: f64) -> NavEntry {
        NavEntry {
            step,
            bond_value: 0.0,
            cash: 0.0,
            nav: 0.0,
            nav_per_share,
            shares: 1.0,
            flow: 0.0,
        }
    }

    #[test]
    fn test_record_is_write_once() {
        let mut history = NavHistory::new();
        assert!(history.record(entry(3, 10.0)));
        assert!(!history.record(entry(3, 11.0)));
        assert_eq!(history.get(3).unwrap().nav_per_share, 10.0);
    }

    #[test]
    fn test_latest_is_highest_step() {
        let mut history = NavHistory::new();
        history.record(entry(5, 10.0));
        history.record(entry(1, 9.0));
        assert_eq!(history.latest().unwrap().step, 5);
        assert_eq!(history.entries().map(|e| e.step).collect::<Vec<_>>(), vec![1, 5]);
    }

    #[test]
    fn test_json_round_trip_keeps_entries() {
        let mut history = NavHistory::new();
        history.record(entry(1, 10.0));
        history.record(entry(2, 10.1));
        let json = serde_json::to_string(&history).unwrap();
        let restored: NavHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn test_repeated_step_rejected_on_load() {
        let entries = vec![entry(4, 10.0), entry(4, 12.0)];
        assert_eq!(
            NavHistory::try_from(entries.clone()).unwrap_err(),
            DuplicateNavStep(4)
        );
        let json = serde_json::to_string(&entries).unwrap();
        let err = serde_json::from_str::<NavHistory>(&json).unwrap_err();
        assert!(err.to_string().contains("step 4"), "{}", err);
    }
}
