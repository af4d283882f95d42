use crate::error::{ReportError, Result};
use crate::session::SavePolicy;
use crate::store::StoreBackend;
use photo_report_common::{ReportVariant, DEFAULT_STAMP_DPI};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 受け付けるdpiの上限
pub const MAX_DPI: u32 = 2400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 時間標記に使うTrueTypeフォント
    pub font_path: Option<PathBuf>,
    /// 時間標記時の想定解像度
    pub dpi: u32,
    pub jpeg_quality: u8,
    pub save_policy: SavePolicy,
    pub store_backend: StoreBackend,
    /// 案件ストアの保存先（省略時は設定ディレクトリ）
    pub store_dir: Option<PathBuf>,
    /// テンプレートの置き場所（省略時はカレント）
    pub template_dir: Option<PathBuf>,
    /// 文書の出力先（省略時はカレント）
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_path: None,
            dpi: DEFAULT_STAMP_DPI,
            jpeg_quality: 90,
            save_policy: SavePolicy::default(),
            store_backend: StoreBackend::default(),
            store_dir: None,
            template_dir: None,
            output_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.check()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.check()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.json"))
    }

    fn app_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-report"))
    }

    fn check(&self) -> Result<()> {
        if !(1..=MAX_DPI).contains(&self.dpi) {
            return Err(ReportError::Config(format!(
                "dpiは1-{}で指定してください: {}",
                MAX_DPI, self.dpi
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ReportError::Config(format!(
                "JPEG品質は1-100で指定してください: {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// バリアントの案件ストアのパス
    pub fn store_path(&self, variant: &ReportVariant) -> Result<PathBuf> {
        let dir = match &self.store_dir {
            Some(dir) => dir.clone(),
            None => Self::app_dir()?,
        };
        Ok(dir.join(format!("{}.json", variant.store_name)))
    }

    /// バリアントのテンプレートのパス
    pub fn template_path(&self, variant: &ReportVariant) -> PathBuf {
        match &self.template_dir {
            Some(dir) => dir.join(&variant.template_file),
            None => PathBuf::from(&variant.template_file),
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
