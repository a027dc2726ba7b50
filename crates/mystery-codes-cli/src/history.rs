//! Previously generated codes, stored as a JSON array on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mystery_codes::{Choice, GeneratedCodePair};

/// One stored code and the variant it was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCode {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl StoredCode {
    /// Both codes of a pair, stamped with `now`.
    pub fn from_pair(pair: &GeneratedCodePair, choice: Choice, now: DateTime<Utc>) -> Vec<Self> {
        pair.codes()
            .iter()
            .map(|value| StoredCode {
                value: value.to_string(),
                kind: choice.label().to_string(),
                generated_at: Some(now),
            })
            .collect()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt history file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// File-backed history of generated codes, newest first.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored codes. A missing file is an empty history.
    pub fn load(&self) -> HistoryResult<Vec<StoredCode>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the stored history with `codes`.
    pub fn save(&self, codes: &[StoredCode]) -> HistoryResult<()> {
        let io_err = |source| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let payload = serde_json::to_vec_pretty(codes).map_err(|source| HistoryError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Sibling temp file, then rename over the target.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        tracing::debug!("Saved {} codes to {}", codes.len(), self.path.display());
        Ok(())
    }

    /// Put `fresh` in front of the existing history.
    pub fn prepend(&self, fresh: &[StoredCode]) -> HistoryResult<usize> {
        if fresh.is_empty() {
            return Ok(self.load()?.len());
        }
        let mut all = fresh.to_vec();
        all.extend(self.load()?);
        self.save(&all)?;
        Ok(all.len())
    }

    pub fn clear(&self) -> HistoryResult<()> {
        self.save(&[])
    }
}

/// Group code values by type, keeping stored order within each group.
pub fn group_by_kind(codes: &[StoredCode]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for code in codes {
        groups
            .entry(code.kind.clone())
            .or_default()
            .push(code.value.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: &str, kind: &str) -> StoredCode {
        StoredCode {
            value: value.to_string(),
            kind: kind.to_string(),
            generated_at: None,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/history.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/history.json"));
        store
            .save(&[code("B001", "beef"), code("V002", "veggie")])
            .unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![code("B001", "beef"), code("V002", "veggie")]);
    }

    #[test]
    fn test_wire_format_uses_value_and_type() {
        let json = serde_json::to_value(code("B001", "beef")).unwrap();
        assert_eq!(json, serde_json::json!({ "value": "B001", "type": "beef" }));

        let parsed: StoredCode =
            serde_json::from_str(r#"{"value": "V9", "type": "veggie"}"#).unwrap();
        assert_eq!(parsed, code("V9", "veggie"));
    }

    #[test]
    fn test_prepend_puts_new_codes_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.save(&[code("OLD1", "beef")]).unwrap();

        let total = store
            .prepend(&[code("NEW1", "veggie"), code("NEW2", "veggie")])
            .unwrap();
        assert_eq!(total, 3);

        let values: Vec<_> = store.load().unwrap().into_iter().map(|c| c.value).collect();
        assert_eq!(values, vec!["NEW1", "NEW2", "OLD1"]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = HistoryStore::new(&path);
        assert!(matches!(store.load(), Err(HistoryError::Json { .. })));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.save(&[code("B1", "beef")]).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_group_by_kind_keeps_order() {
        let codes = vec![
            code("B1", "beef"),
            code("V1", "veggie"),
            code("B2", "beef"),
        ];
        let groups = group_by_kind(&codes);
        assert_eq!(groups["beef"], vec!["B1", "B2"]);
        assert_eq!(groups["veggie"], vec!["V1"]);
    }

    #[test]
    fn test_from_pair() {
        let pair = GeneratedCodePair {
            first_code: "B001abc".into(),
            second_code: "B002def".into(),
        };
        let now = Utc::now();
        let stored = StoredCode::from_pair(&pair, Choice::Beef, now);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].value, "B001abc");
        assert_eq!(stored[1].kind, "beef");
        assert_eq!(stored[1].generated_at, Some(now));
    }
}
