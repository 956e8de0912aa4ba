//! File-backed ledger with locking and atomic replacement.
//!
//! The whole keyspace lives in one JSON object (`key -> value`). Readers take
//! a shared lock and writers an exclusive lock on a sidecar `.lock` file, so
//! the data file itself can be swapped by rename without losing the lock.

use crate::ledger::{scan, Ledger};
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

type Entries = BTreeMap<String, String>;

/// Ledger persisted to a single JSON file
#[derive(Clone, Debug)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Open a ledger at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        Ok(file)
    }

    /// Read all entries. Caller must hold the lock.
    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            Error::Ledger(format!(
                "ledger file {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Atomically replace the data file. Caller must hold the exclusive lock.
    fn save(&self, entries: &Entries) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            Error::Ledger(format!("ledger path {} has no parent", self.path.display()))
        })?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(entries)
                .map_err(|e| Error::Ledger(format!("failed to serialize ledger: {}", e)))?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read_locked<T>(&self, f: impl FnOnce(&Entries) -> T) -> Result<T> {
        if !self.path.exists() {
            return Ok(f(&Entries::new()));
        }

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let entries = self.load();
        lock.unlock()?;
        Ok(f(&entries?))
    }
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.read_locked(|entries| entries.get(key).map(|v| v.clone().into_bytes()))?;
        tracing::debug!("get {} from {:?}: {}", key, self.path, value.is_some());
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let value = std::str::from_utf8(value)
            .map_err(|e| Error::Ledger(format!("value for {} is not valid UTF-8: {}", key, e)))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;
        let result = self.load().and_then(|mut entries| {
            entries.insert(key.to_string(), value.to_string());
            self.save(&entries)
        });
        lock.unlock()?;
        result?;

        tracing::debug!("put {} ({} bytes) to {:?}", key, value.len(), self.path);
        Ok(())
    }

    fn range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.read_locked(|entries| {
            scan(entries, start, end)
                .map(|(k, v)| (k.clone(), v.clone().into_bytes()))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = FileLedger::open(temp_dir.path().join("ledger.json"));

        ledger.put("P1", br#"{"sourceId":"P1"}"#).unwrap();

        let reopened = FileLedger::open(temp_dir.path().join("ledger.json"));
        assert_eq!(
            reopened.get("P1").unwrap(),
            Some(br#"{"sourceId":"P1"}"#.to_vec())
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(temp_dir.path().join("nonexistent.json"));

        assert_eq!(ledger.get("P1").unwrap(), None);
        assert!(ledger.range("A", "Z").unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/ledger.json");
        let mut ledger = FileLedger::open(&path);

        ledger.put("k", b"v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_range_across_writes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = FileLedger::open(temp_dir.path().join("ledger.json"));
        for key in ["b", "a", "c", "d"] {
            ledger.put(key, key.as_bytes()).unwrap();
        }

        let entries = ledger.range("a", "c").unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let mut ledger = FileLedger::open(&path);
        assert!(matches!(ledger.get("k"), Err(Error::Ledger(_))));
        assert!(matches!(ledger.put("k", b"v"), Err(Error::Ledger(_))));

        // The corrupt file is left for inspection
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ invalid json }");
    }

    #[test]
    fn test_non_utf8_value_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = FileLedger::open(temp_dir.path().join("ledger.json"));

        let result = ledger.put("k", &[0xff, 0xfe]);
        assert!(matches!(result, Err(Error::Ledger(_))));
    }

    #[test]
    fn test_no_stray_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut ledger = FileLedger::open(temp_dir.path().join("ledger.json"));
        ledger.put("k", b"v").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "ledger.json" && name != "ledger.json.lock")
            .collect();
        assert!(extras.is_empty(), "Unexpected files: {:?}", extras);
    }
}
