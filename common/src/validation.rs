//! 文書生成前の入力検証
//!
//! 検証に失敗した場合は生成全体を中止する（出力もアーカイブも作らない）。

use crate::types::{ItemRecord, ProjectRecord};
use crate::variant::ReportVariant;
use std::path::Path;
use thiserror::Error;

/// 検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{label}を入力してください")]
    MissingProjectField { label: String },

    #[error("写真項目を1つ以上追加してください")]
    NoItems,

    #[error("項目{index}: {field}を入力してください")]
    MissingItemField { index: usize, field: &'static str },

    #[error("項目{index}: 画像ファイルが見つかりません: {path}")]
    ImageNotFound { index: usize, path: String },
}

/// 項目フィールド名 → 表示ラベル
fn item_field_label(field: &str) -> &'static str {
    match field {
        "description" => "施工說明",
        "time" => "時間",
        _ => "圖片",
    }
}

/// 案件情報と全項目を検証する
pub fn validate_project(
    project: &ProjectRecord,
    variant: &ReportVariant,
) -> Result<(), ValidationError> {
    if project.id.trim().is_empty() {
        return Err(ValidationError::MissingProjectField {
            label: variant.id_field_label.clone(),
        });
    }
    if project.location_or_date.trim().is_empty() {
        return Err(ValidationError::MissingProjectField {
            label: variant.location_field_label.clone(),
        });
    }
    if project.items.is_empty() {
        return Err(ValidationError::NoItems);
    }

    for (i, item) in project.items.iter().enumerate() {
        validate_item(i + 1, item)?;
    }

    Ok(())
}

/// 1項目を検証（indexは1始まり）
pub fn validate_item(index: usize, item: &ItemRecord) -> Result<(), ValidationError> {
    if let Some(field) = item.missing_fields().first() {
        return Err(ValidationError::MissingItemField {
            index,
            field: item_field_label(field),
        });
    }

    if !Path::new(item.image_path.trim()).is_file() {
        return Err(ValidationError::ImageNotFound {
            index,
            path: item.image_path.clone(),
        });
    }

    Ok(())
}
