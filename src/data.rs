//! Caller data sources
//!
//! A data set maps insertion point names (and the reserved magic keys) to
//! JSON values. Loaders hand out data sets one at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// One data set: insertion point name -> value
pub type DataMap = Map<String, Value>;

/// Errors that can occur while loading data
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read data file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("data set {index} is a {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
}

/// A source of successive data sets
pub trait DataLoader {
    /// Next data set, or None once the source is exhausted
    fn load_data(&mut self) -> Result<Option<DataMap>, DataError>;
}

/// Hands out data sets held in memory, in order
#[derive(Debug, Clone, Default)]
pub struct MemoryDataLoader {
    pending: VecDeque<DataMap>,
}

impl MemoryDataLoader {
    pub fn new(data: impl IntoIterator<Item = DataMap>) -> Self {
        Self {
            pending: data.into_iter().collect(),
        }
    }

    /// Number of data sets not yet handed out
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl DataLoader for MemoryDataLoader {
    fn load_data(&mut self) -> Result<Option<DataMap>, DataError> {
        Ok(self.pending.pop_front())
    }
}

/// Data sets read from JSON holding one object or an array of objects
#[derive(Debug, Clone)]
pub struct JsonDataLoader {
    inner: MemoryDataLoader,
}

impl JsonDataLoader {
    /// Read a JSON data file
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse JSON data from a string
    pub fn from_json(content: &str) -> Result<Self, DataError> {
        let sets = match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(DataError::NotAnObject {
                        index,
                        found: crate::label::value_kind(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(DataError::NotAnObject {
                    index: 0,
                    found: crate::label::value_kind(&other),
                })
            }
        };
        Ok(Self {
            inner: MemoryDataLoader::new(sets),
        })
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }
}

impl DataLoader for JsonDataLoader {
    fn load_data(&mut self) -> Result<Option<DataMap>, DataError> {
        self.inner.load_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> DataMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("Should be an object"),
        }
    }

    #[test]
    fn test_memory_loader_drains_in_order() {
        let mut loader = MemoryDataLoader::new(vec![map(json!({"a": "1"})), map(json!({"a": "2"}))]);
        assert_eq!(loader.load_data().unwrap().unwrap()["a"], "1");
        assert_eq!(loader.remaining(), 1);
        assert_eq!(loader.load_data().unwrap().unwrap()["a"], "2");
        assert!(loader.load_data().unwrap().is_none());
        assert!(loader.load_data().unwrap().is_none());
    }

    #[test]
    fn test_json_single_object() {
        let mut loader = JsonDataLoader::from_json(r#"{"title": "Q3", "items": ["a", "b"]}"#).unwrap();
        let data = loader.load_data().unwrap().expect("Should have one data set");
        assert_eq!(data["items"], json!(["a", "b"]));
        assert!(loader.load_data().unwrap().is_none());
    }

    #[test]
    fn test_json_array_of_objects() {
        let loader = JsonDataLoader::from_json(r#"[{"a": "1"}, {"a": "2"}, {}]"#).unwrap();
        assert_eq!(loader.remaining(), 3);
    }

    #[test]
    fn test_json_rejects_non_objects() {
        assert!(matches!(
            JsonDataLoader::from_json(r#"[{"a": "1"}, 5]"#),
            Err(DataError::NotAnObject { index: 1, found: "number" })
        ));
        assert!(matches!(
            JsonDataLoader::from_json(r#""text""#),
            Err(DataError::NotAnObject { index: 0, found: "string" })
        ));
        assert!(matches!(JsonDataLoader::from_json("{"), Err(DataError::Parse(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonDataLoader::open(&dir.path().join("absent.json")),
            Err(DataError::Io { .. })
        ));
    }
}
