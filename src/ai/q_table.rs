use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::game::StateKey;

/// Column index → estimated value for one state.
pub type ActionValues = BTreeMap<usize, f64>;

/// Sparse two-level value table: state key → column → value.
///
/// Reads never create entries; a missing state or column reads as `0.0`.
/// States are only added through [`QTable::ensure_entry`]. Iteration follows
/// the order in which states were first added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<QTableRecord>", into = "Vec<QTableRecord>")]
pub struct QTable {
    index: HashMap<StateKey, usize>,
    entries: Vec<(StateKey, ActionValues)>,
}

/// Persisted form of one table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTableRecord {
    pub state: StateKey,
    pub actions: ActionValues,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of states with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &StateKey) -> Option<&ActionValues> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Stored value for (state, column), `0.0` when either is missing.
    pub fn value(&self, key: &StateKey, action: usize) -> f64 {
        self.get(key)
            .and_then(|values| values.get(&action).copied())
            .unwrap_or(0.0)
    }

    /// Largest value stored for a state, `0.0` when the state has none.
    pub fn max_value(&self, key: &StateKey) -> f64 {
        self.get(key)
            .and_then(|values| values.values().copied().reduce(f64::max))
            .unwrap_or(0.0)
    }

    /// Get the entry for `key`, inserting an empty one if absent.
    pub fn ensure_entry(&mut self, key: StateKey) -> &mut ActionValues {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.entries.push((key, ActionValues::new()));
                let i = self.entries.len() - 1;
                self.index.insert(key, i);
                i
            }
        };
        &mut self.entries[i].1
    }

    pub fn set(&mut self, key: StateKey, action: usize, value: f64) {
        self.ensure_entry(key).insert(action, value);
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// At most `limit` entries, for inspection.
    pub fn entries(&self, limit: usize) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.iter().take(limit)
    }
}

impl From<Vec<QTableRecord>> for QTable {
    fn from(records: Vec<QTableRecord>) -> Self {
        let mut table = QTable::new();
        for record in records {
            table.ensure_entry(record.state).extend(record.actions);
        }
        table
    }
}

impl From<QTable> for Vec<QTableRecord> {
    fn from(table: QTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(state, actions)| QTableRecord { state, actions })
            .collect()
    }
}
