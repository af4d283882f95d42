//! 案件ストア
//!
//! 案件キー `"{id}-{locationOrDate}"` → ProjectRecord をファイルに保存する。
//! 2種類の保存形式を同じトレイトで扱う:
//! - JsonFileStore: 1つのJSON文書にレコードを入れ子で保存
//! - SettingsStore: キーごとの値にJSONエンコード済み文字列を保存（設定レジストリ形式）

mod json_file;
mod settings;

pub use json_file::JsonFileStore;
pub use settings::SettingsStore;

use crate::error::{ReportError, Result};
use indexmap::IndexMap;
use photo_report_common::ProjectRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// 案件ストアの共通インターフェース
pub trait ProjectStore {
    /// 全案件を読み込む（ファイルがなければ空）
    fn load(&self) -> Result<IndexMap<String, ProjectRecord>>;

    /// キーにレコードを保存（既存は上書き）
    fn save(&self, key: &str, record: &ProjectRecord) -> Result<()>;

    /// キーを削除。存在しなければ何もせず `false`
    fn remove(&self, key: &str) -> Result<bool>;

    /// 保存順のキー一覧
    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    fn get(&self, key: &str) -> Result<Option<ProjectRecord>> {
        Ok(self.load()?.shift_remove(key))
    }

    /// 保存先ファイル
    fn path(&self) -> &Path;
}

/// 保存形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    JsonFile,
    Settings,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "json-file" => Ok(StoreBackend::JsonFile),
            "settings" => Ok(StoreBackend::Settings),
            _ => Err(format!("Unknown store backend: {}. Use json-file or settings", s)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::JsonFile => write!(f, "json-file"),
            StoreBackend::Settings => write!(f, "settings"),
        }
    }
}

/// 保存形式に応じたストアを開く
pub fn open_store(backend: StoreBackend, path: &Path) -> Box<dyn ProjectStore> {
    match backend {
        StoreBackend::JsonFile => Box::new(JsonFileStore::new(path)),
        StoreBackend::Settings => Box::new(SettingsStore::new(path)),
    }
}

/// キー付きJSON文書を読み込む
fn read_keyed<V: DeserializeOwned>(path: &Path) -> Result<IndexMap<String, V>> {
    if !path.exists() {
        debug!("store file not found, starting empty: {}", path.display());
        return Ok(IndexMap::new());
    }

    let mut content = String::new();
    BufReader::new(File::open(path)?).read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    serde_json::from_str(&content).map_err(|e| ReportError::StoreCorrupted {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// キー付きJSON文書を書き込む（同じフォルダの一時ファイルから置き換え）
fn write_keyed<V: Serialize>(path: &Path, map: &IndexMap<String, V>) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, map)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| ReportError::Io(e.error))?;
    debug!("store written: {} ({} projects)", path.display(), map.len());
    Ok(())
}
