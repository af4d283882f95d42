use super::{read_keyed, write_keyed, ProjectStore};
use crate::error::Result;
use indexmap::IndexMap;
use photo_report_common::ProjectRecord;
use std::path::{Path, PathBuf};
use tracing::info;

/// 1つのJSON文書に全案件を入れ子で保存するストア
///
/// ```json
/// { "A1-台北市": { "id": "A1", "locationOrDate": "台北市", "items": [...] } }
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProjectStore for JsonFileStore {
    fn load(&self) -> Result<IndexMap<String, ProjectRecord>> {
        read_keyed(&self.path)
    }

    fn save(&self, key: &str, record: &ProjectRecord) -> Result<()> {
        let mut projects = self.load()?;
        projects.insert(key.to_string(), record.clone());
        write_keyed(&self.path, &projects)?;
        info!("project saved: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut projects = self.load()?;
        if projects.shift_remove(key).is_none() {
            return Ok(false);
        }
        write_keyed(&self.path, &projects)?;
        info!("project removed: {}", key);
        Ok(true)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
