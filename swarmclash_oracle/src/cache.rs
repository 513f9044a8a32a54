//! Persistent verdict cache.
//!
//! The file is a JSON object mapping a stringified sorted name pair to
//! `[winner, loser]`, the exact format the game has always written, so
//! an existing `cache.json` keeps working. Loaded once at startup; a
//! missing or malformed file just means an empty cache.

use crate::error::CacheError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Canonical cache key: the two names sorted lexicographically, in the
/// historical stringified-tuple form, so `(a, b)` and `(b, a)` collide.
pub fn pair_key(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("('{first}', '{second}')")
}

/// A settled collision: which name won and which lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub winner: String,
    pub loser: String,
}

/// In-memory cache with optional file backing.
#[derive(Debug)]
pub struct VerdictCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, Verdict>,
}

impl VerdictCache {
    /// Loads the cache from `path`, tolerating a missing or malformed
    /// file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| parse_entries(&text))
            .unwrap_or_default();
        Self {
            path: Some(path),
            entries,
        }
    }

    /// Cache with no file backing (tests, ephemeral worlds).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<Verdict> {
        self.entries.get(&pair_key(a, b)).cloned()
    }

    pub fn insert(&mut self, a: &str, b: &str, verdict: Verdict) {
        self.entries.insert(pair_key(a, b), verdict);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole cache atomically: temp file first, then rename
    /// over the real one. A cache without a path is a no-op.
    pub fn persist(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file_map: BTreeMap<&str, [&str; 2]> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), [v.winner.as_str(), v.loser.as_str()]))
            .collect();
        let json = serde_json::to_string_pretty(&file_map)?;
        let tmp = tmp_path(path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn parse_entries(text: &str) -> Option<BTreeMap<String, Verdict>> {
    let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(text).ok()?;
    Some(
        raw.into_iter()
            .filter_map(|(key, mut value)| {
                if value.len() != 2 {
                    return None;
                }
                let loser = value.pop()?;
                let winner = value.pop()?;
                Some((key, Verdict { winner, loser }))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(winner: &str, loser: &str) -> Verdict {
        Verdict {
            winner: winner.to_string(),
            loser: loser.to_string(),
        }
    }

    #[test]
    fn test_pair_key_is_symmetric_and_sorted() {
        assert_eq!(pair_key("Rock", "Paper"), pair_key("Paper", "Rock"));
        assert_eq!(pair_key("Rock", "Paper"), "('Paper', 'Rock')");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = VerdictCache::load(&path);
        assert!(cache.is_empty());
        cache.insert("Rock", "Paper", verdict("Paper", "Rock"));
        cache.persist().unwrap();

        let reloaded = VerdictCache::load(&path);
        assert_eq!(reloaded.len(), 1);
        // Orderless lookup.
        assert_eq!(reloaded.get("Paper", "Rock"), Some(verdict("Paper", "Rock")));
    }

    #[test]
    fn test_malformed_file_yields_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(VerdictCache::load(&path).is_empty());
    }

    #[test]
    fn test_entries_with_wrong_arity_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{"('Paper', 'Rock')":["Paper","Rock"],"('A', 'B')":["A"]}"#,
        )
        .unwrap();
        let cache = VerdictCache::load(&path);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("A", "B").is_none());
    }

    #[test]
    fn test_in_memory_persist_is_a_noop() {
        let mut cache = VerdictCache::in_memory();
        cache.insert("a", "b", verdict("a", "b"));
        cache.persist().unwrap();
    }
}
