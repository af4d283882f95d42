use super::{read_keyed, write_keyed, ProjectStore};
use crate::error::{ReportError, Result};
use indexmap::IndexMap;
use photo_report_common::ProjectRecord;
use std::path::{Path, PathBuf};
use tracing::info;

/// キーごとにJSONエンコード済み文字列を値として持つストア
///
/// OSの設定レジストリに `key = "<JSON>"` で書き込む形式と同じ構造。
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_raw(&self) -> Result<IndexMap<String, String>> {
        read_keyed(&self.path)
    }
}

impl ProjectStore for SettingsStore {
    fn load(&self) -> Result<IndexMap<String, ProjectRecord>> {
        let mut projects = IndexMap::new();
        for (key, value) in self.load_raw()? {
            let record = ProjectRecord::from_json(&value).map_err(|e| ReportError::StoreCorrupted {
                path: self.path.display().to_string(),
                reason: format!("{}: {}", key, e),
            })?;
            projects.insert(key, record);
        }
        Ok(projects)
    }

    fn save(&self, key: &str, record: &ProjectRecord) -> Result<()> {
        let mut raw = self.load_raw()?;
        raw.insert(key.to_string(), record.to_json()?);
        write_keyed(&self.path, &raw)?;
        info!("project saved: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut raw = self.load_raw()?;
        if raw.shift_remove(key).is_none() {
            return Ok(false);
        }
        write_keyed(&self.path, &raw)?;
        info!("project removed: {}", key);
        Ok(true)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
