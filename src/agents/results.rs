//! On-disk store for analysis reports

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Saves reports as pretty JSON at `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        let file = if name.ends_with(".json") {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        self.dir.join(file)
    }

    pub fn save<T: Serialize>(&self, name: &str, report: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, report)?;
        info!(path = %path.display(), "Results saved");
        Ok(path)
    }

    /// Load a saved report; a missing file is `Ok(None)`
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path_for(name);
        if !path.exists() {
            warn!(path = %path.display(), "Results file not found");
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path().join("results"));

        let mut report = BTreeMap::new();
        report.insert("gender_ratio".to_string(), 0.4);
        let path = store.save("diversity", &report).unwrap();
        assert!(path.ends_with("diversity.json"));

        let loaded: BTreeMap<String, f64> = store.load("diversity.json").unwrap().unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let loaded: Option<serde_json::Value> = store.load("nothing").unwrap();
        assert!(loaded.is_none());
    }
}
