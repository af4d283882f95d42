//! 報告書データの型定義
//!
//! CLIと対話編集で共有される型:
//! - ItemRecord: 写真1枚分の入力（説明・時間・画像・時間標記）
//! - ProjectRecord: 案件/駅ごとの保存単位

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 写真1枚分の入力項目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// 施工説明
    #[serde(default, alias = "施工說明")]
    pub description: String,

    /// 時間ラベル（画像に焼き込む文字列）
    #[serde(default, alias = "時間")]
    pub time: String,

    /// 画像ファイルのパス
    #[serde(default, alias = "圖片路徑")]
    pub image_path: String,

    /// 画像に時間を標記するか
    #[serde(default, alias = "標註時間")]
    pub stamp_time: bool,
}

impl ItemRecord {
    pub fn new(
        description: impl Into<String>,
        time: impl Into<String>,
        image_path: impl Into<String>,
        stamp_time: bool,
    ) -> Self {
        Self {
            description: description.into(),
            time: time.into(),
            image_path: image_path.into(),
            stamp_time,
        }
    }

    /// 未入力の必須項目名を返す
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.time.trim().is_empty() {
            missing.push("time");
        }
        if self.image_path.trim().is_empty() {
            missing.push("imagePath");
        }
        missing
    }
}

/// 保存単位となる案件（駅）レコード
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    /// 案件編號 / 站別
    #[serde(alias = "案件編號", alias = "站別")]
    pub id: String,

    /// 案件地址 / 施工日期
    #[serde(alias = "案件地址", alias = "施工日期")]
    pub location_or_date: String,

    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

impl ProjectRecord {
    pub fn new(id: impl Into<String>, location_or_date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location_or_date: location_or_date.into(),
            items: Vec::new(),
        }
    }

    /// ストアのキー `"{id}-{locationOrDate}"`
    pub fn key(&self) -> String {
        project_key(&self.id, &self.location_or_date)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(json)?;
        Ok(record)
    }

    /// JSON文字列へ書き出し（設定ストアの値形式）
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// idと場所/日付の両方が入力済みか
    pub fn has_identity(&self) -> bool {
        !self.id.trim().is_empty() && !self.location_or_date.trim().is_empty()
    }
}

/// 案件キーを組み立てる
pub fn project_key(id: &str, location_or_date: &str) -> String {
    format!("{}-{}", id, location_or_date)
}
