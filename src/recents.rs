//! Newest-first, size-bounded log of placed calls, stored as one JSON array.
//!
//! Every append rewrites the whole document. Two appends racing each other
//! lose one entry; callers must not issue writes concurrently.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::contact::RecentCall;
use crate::error::{ContactsError, Result};
use crate::store::write_atomic;

pub const RECENT_CALLS_FILE: &str = "recentCalls.json";
pub const DEFAULT_RECENTS_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct RecentCallStore {
    path: PathBuf,
    limit: usize,
}

impl RecentCallStore {
    pub fn open(documents_dir: &Path) -> Self {
        Self::with_path(documents_dir.join(RECENT_CALLS_FILE))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            limit: DEFAULT_RECENTS_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The log, newest first. A missing, unreadable or corrupt document reads
    /// as empty history.
    pub fn get(&self) -> Vec<RecentCall> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %self.path.display(), ?err, "failed to read recent calls");
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }
        match parse_log(&raw) {
            Ok(calls) => calls,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring corrupt recent calls log");
                Vec::new()
            }
        }
    }

    /// Prepend `call`, keeping at most `limit` entries. Returns the new log.
    pub fn append(&self, call: RecentCall) -> Result<Vec<RecentCall>> {
        let mut calls = Vec::with_capacity(self.limit);
        calls.push(call);
        calls.extend(self.get());
        calls.truncate(self.limit);
        self.write(&calls)?;
        Ok(calls)
    }

    pub fn clear(&self) -> Result<()> {
        self.write(&[])
    }

    fn write(&self, calls: &[RecentCall]) -> Result<()> {
        let bytes =
            serde_json::to_vec(calls).map_err(|err| ContactsError::write(&self.path, err))?;
        write_atomic(&self.path, &bytes)
    }
}

/// Parse the document. The top level must be an array; individual entries
/// that do not look like calls are dropped.
fn parse_log(raw: &str) -> Result<Vec<RecentCall>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| ContactsError::malformed(RECENT_CALLS_FILE, err))?;
    let Value::Array(entries) = value else {
        return Err(ContactsError::malformed(
            RECENT_CALLS_FILE,
            "expected a JSON array",
        ));
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
            Ok(call) => Some(call),
            Err(err) => {
                warn!(index = idx, ?err, "skipping malformed recent call entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn call(n: i64) -> RecentCall {
        RecentCall {
            id: format!("id-{n}"),
            name: format!("Caller {n}"),
            phone_numbers: format!("555-{n:04}"),
            avatar: None,
            timestamp: 1_700_000_000_000 + n,
        }
    }

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_append_is_newest_first() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        store.append(call(1)).unwrap();
        store.append(call(2)).unwrap();

        let calls = store.get();
        assert_eq!(calls, vec![call(2), call(1)]);
    }

    #[test]
    fn test_append_evicts_oldest_past_limit() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        for n in 0..=100 {
            store.append(call(n)).unwrap();
        }

        let calls = store.get();
        assert_eq!(calls.len(), 100);
        assert_eq!(calls[0], call(100));
        assert_eq!(calls[99], call(1));
        assert!(!calls.contains(&call(0)));
    }

    #[test]
    fn test_custom_limit() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path()).with_limit(3);
        for n in 0..5 {
            store.append(call(n)).unwrap();
        }
        assert_eq!(store.get(), vec![call(4), call(3), call(2)]);
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        store.append(call(1)).unwrap();
        store.clear().unwrap();
        assert!(store.get().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");
    }

    #[test]
    fn test_corrupt_log_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        for corrupt in ["[{\"id\":\"1\",", "{\"id\":\"1\"}", "42", ""] {
            fs::write(store.path(), corrupt).unwrap();
            assert!(store.get().is_empty(), "{corrupt:?}");
        }

        // Appending onto a corrupt log starts a fresh one.
        fs::write(store.path(), "not json").unwrap();
        store.append(call(7)).unwrap();
        assert_eq!(store.get(), vec![call(7)]);
    }

    #[test]
    fn test_bad_entries_are_dropped() {
        let temp = TempDir::new().unwrap();
        let store = RecentCallStore::open(temp.path());
        let good = serde_json::to_value(call(3)).unwrap();
        let doc = serde_json::json!([good, {"id": 5}, "text"]);
        fs::write(store.path(), doc.to_string()).unwrap();

        assert_eq!(store.get(), vec![call(3)]);
    }
}
