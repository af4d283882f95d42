//! 報告書バリアント定義
//!
//! 案件版と捷運（駅）版は同一の生成パイプラインを共有し、
//! ラベル・出力ファイル名規則・写真サイズ・テンプレートだけが異なる。

use crate::naming::OutputFilenameRule;

// ============================================
// 変換係数
// ============================================

/// 1インチ = 2.54cm
pub const CM_PER_INCH: f64 = 2.54;

/// 時間標記時に想定する解像度（dpi）
pub const DEFAULT_STAMP_DPI: u32 = 300;

/// 1cm = 360000 EMU（Office の長さ単位）
pub const EMU_PER_CM: f64 = 360_000.0;

/// 切り捨て前の誤差吸収
const FLOOR_EPSILON: f64 = 1e-9;

/// cm → px 変換（切り捨て）
#[inline]
pub fn cm_to_px(cm: f64, dpi: u32) -> u32 {
    (cm * dpi as f64 / CM_PER_INCH + FLOOR_EPSILON).floor() as u32
}

/// cm → EMU 変換
#[inline]
pub fn cm_to_emu(cm: f64) -> u64 {
    (cm * EMU_PER_CM).round() as u64
}

/// テンプレート内で各写真項目を参照するキー
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateKeys {
    /// 案件編號 / 站別
    pub id: String,
    pub description: String,
    pub time: String,
    pub image: String,
}

impl TemplateKeys {
    fn with_id_label(id_label: &str) -> Self {
        Self {
            id: id_label.to_string(),
            description: "內容".to_string(),
            time: "時間".to_string(),
            image: "圖片".to_string(),
        }
    }
}

/// 報告書バリアント
#[derive(Debug, Clone, PartialEq)]
pub struct ReportVariant {
    /// CLIで指定する識別名
    pub name: String,
    /// 画面表示用タイトル
    pub title: String,
    pub id_field_label: String,
    pub location_field_label: String,
    pub filename_rule: OutputFilenameRule,
    /// 写真幅（cm）
    pub photo_width_cm: f64,
    /// 写真高さ（cm）
    pub photo_height_cm: f64,
    /// テンプレートファイル名
    pub template_file: String,
    /// 案件ストアのファイル名（拡張子なし）
    pub store_name: String,
    pub keys: TemplateKeys,
}

impl ReportVariant {
    /// 案件版: `{id}.docx`、写真 10 × 6.5 cm
    pub fn case_report() -> Self {
        Self {
            name: "case".into(),
            title: "案件版".into(),
            id_field_label: "案件編號".into(),
            location_field_label: "案件地址".into(),
            filename_rule: OutputFilenameRule::Id,
            photo_width_cm: 10.0,
            photo_height_cm: 6.5,
            template_file: "施工照片.docx".into(),
            store_name: "saved_data".into(),
            keys: TemplateKeys::with_id_label("案件編號"),
        }
    }

    /// 捷運版: `{施工日期}({站別}).docx`、写真 8.3 × 5.4 cm
    pub fn station_report() -> Self {
        Self {
            name: "station".into(),
            title: "捷運版".into(),
            id_field_label: "站別".into(),
            location_field_label: "施工日期".into(),
            filename_rule: OutputFilenameRule::LocationWithId,
            photo_width_cm: 8.3,
            photo_height_cm: 5.4,
            template_file: "照片.docx".into(),
            store_name: "saved_data_station".into(),
            keys: TemplateKeys::with_id_label("站別"),
        }
    }

    /// 識別名からバリアントを取得
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "case" | "案件" | "案件版" => Some(Self::case_report()),
            "station" | "mrt" | "捷運" | "捷運版" => Some(Self::station_report()),
            _ => None,
        }
    }

    /// 組み込みバリアント一覧
    pub fn all() -> Vec<Self> {
        vec![Self::case_report(), Self::station_report()]
    }

    /// 出力ファイル名
    pub fn output_file_name(&self, id: &str, location_or_date: &str) -> String {
        self.filename_rule.file_name(id, location_or_date)
    }

    /// 写真の配置サイズ（EMU）
    pub fn photo_extent_emu(&self) -> (u64, u64) {
        (cm_to_emu(self.photo_width_cm), cm_to_emu(self.photo_height_cm))
    }

    /// 指定dpiでの写真ピクセルサイズ
    pub fn photo_size_px(&self, dpi: u32) -> (u32, u32) {
        (
            cm_to_px(self.photo_width_cm, dpi),
            cm_to_px(self.photo_height_cm, dpi),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion() {
        assert_eq!(cm_to_px(2.54, 96), 96);
        assert_eq!(cm_to_px(10.0, 96), 377);
        assert_eq!(cm_to_px(6.5, 96), 245);
        assert_eq!(cm_to_px(2.54, 300), 300);
        assert_eq!(cm_to_px(5.08, 254), 508);
        assert_eq!(cm_to_emu(1.0), 360_000);
        assert_eq!(cm_to_emu(6.5), 2_340_000);
    }

    #[test]
    fn test_variant_presets() {
        let case = ReportVariant::case_report();
        assert_eq!(case.output_file_name("A1", "2024-01-01"), "A1.docx");
        assert_eq!(case.photo_size_px(300), (1181, 767));

        let station = ReportVariant::station_report();
        assert_eq!(station.output_file_name("A1", "2024-01-01"), "2024-01-01(A1).docx");
        assert_eq!(station.keys.id, "站別");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ReportVariant::from_name("CASE").map(|v| v.name), Some("case".into()));
        assert_eq!(ReportVariant::from_name("捷運").map(|v| v.name), Some("station".into()));
        assert!(ReportVariant::from_name("unknown").is_none());
    }
}
