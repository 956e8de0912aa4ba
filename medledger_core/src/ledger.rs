//! The key-value ledger capability consumed by the record store.

use crate::Result;
use std::collections::BTreeMap;

/// Key-value storage with per-key linearizable get/put and ordered scans
pub trait Ledger {
    /// Fetch the value at `key`, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` at `key`, replacing any previous value
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// All entries with `start <= key <= end`, in ascending key order
    fn range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

/// In-memory ledger backed by an ordered map
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(scan(&self.entries, start, end)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Inclusive range over an ordered map; empty when `start > end`
pub(crate) fn scan<'a, V: 'a>(
    entries: &'a BTreeMap<String, V>,
    start: &str,
    end: &str,
) -> impl Iterator<Item = (&'a String, &'a V)> + 'a {
    // BTreeMap::range panics on an inverted range
    let bounds = (start <= end).then(|| (start.to_string(), end.to_string()));
    bounds
        .into_iter()
        .flat_map(move |(start, end)| entries.range(start..=end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_none() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.get("nope").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mut ledger = MemoryLedger::new();
        ledger.put("k", b"one").unwrap();
        ledger.put("k", b"two").unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let mut ledger = MemoryLedger::new();
        for key in ["P3", "P1", "P2", "Q1"] {
            ledger.put(key, key.as_bytes()).unwrap();
        }

        let keys: Vec<String> = ledger
            .range("P1", "P3")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_range_inverted_bounds_is_empty() {
        let mut ledger = MemoryLedger::new();
        ledger.put("A", b"1").unwrap();
        assert!(ledger.range("Z", "A").unwrap().is_empty());
    }
}
