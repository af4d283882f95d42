use clap::{Parser, Subcommand};
use crate::session::SavePolicy;
use photo_report_common::ReportVariant;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-report")]
#[command(about = "施工照片報告書（Word）生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力（-vv でさらに詳細）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// 報告書の種類 (case/station)
    #[arg(long, default_value = "case", global = true)]
    pub variant: VariantName,

    /// 案件ストアのファイル（省略時は設定ディレクトリ）
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 保存済み案件の管理
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },

    /// 写真項目の管理
    Item {
        #[command(subcommand)]
        action: ItemCommand,
    },

    /// 写真フォルダから案件を作成して保存
    Import {
        /// 写真フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 案件編號 / 站別
        #[arg(long)]
        id: String,

        /// 案件地址 / 施工日期
        #[arg(long)]
        location: String,

        /// 全項目に時間を標記
        #[arg(long)]
        stamp: bool,
    },

    /// 保存済み案件から報告書を生成
    Generate {
        /// 案件キー（`{id}-{場所/日付}`）
        #[arg(required = true)]
        key: String,

        /// 元画像を写真フォルダにも書き出す（燒光碟）
        #[arg(long)]
        burn_disc: bool,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// テンプレート（省略時はバリアント既定）
        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// 画像1枚に時間を標記
    Stamp {
        /// 入力画像
        #[arg(required = true)]
        image: PathBuf,

        /// 標記する文字列
        #[arg(long)]
        time: String,

        /// 出力JPEG
        #[arg(short, long)]
        output: PathBuf,
    },

    /// テンプレート管理
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },

    /// 対話的に案件を編集
    Edit {
        /// 開く案件キー
        key: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 時間標記用のTrueTypeフォント
        #[arg(long)]
        set_font: Option<PathBuf>,

        /// 終了時の保存方針 (explicit/on-close)
        #[arg(long)]
        save_policy: Option<SavePolicy>,

        /// 時間標記の想定dpi
        #[arg(long)]
        dpi: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// 案件キーの一覧
    List,

    /// 案件の内容を表示
    Show { key: String },

    /// 空の案件を作成
    New {
        #[arg(long)]
        id: String,

        #[arg(long)]
        location: String,
    },

    /// 案件を削除
    Remove { key: String },
}

#[derive(Subcommand)]
pub enum ItemCommand {
    /// 写真項目を追加
    Add {
        key: String,

        /// 施工說明
        #[arg(long)]
        description: String,

        /// 時間（省略時はEXIFの撮影日時）
        #[arg(long)]
        time: Option<String>,

        /// 画像ファイル
        #[arg(long)]
        image: PathBuf,

        /// 画像に時間を標記
        #[arg(long)]
        stamp: bool,
    },

    /// 写真項目を削除（番号は1始まり）
    Remove {
        key: String,

        #[arg(required = true)]
        numbers: Vec<usize>,
    },

    /// 写真項目を移動（番号は1始まり）
    Move { key: String, from: usize, to: usize },
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    /// 空テンプレートを書き出す
    Init {
        /// 出力先（省略時はバリアント既定のファイル名）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `--variant` の値
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VariantName {
    #[default]
    Case,
    Station,
}

impl VariantName {
    pub fn variant(&self) -> ReportVariant {
        match self {
            VariantName::Case => ReportVariant::case_report(),
            VariantName::Station => ReportVariant::station_report(),
        }
    }
}

impl std::str::FromStr for VariantName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ReportVariant::from_name(s) {
            Some(variant) if variant.name == "station" => Ok(VariantName::Station),
            Some(_) => Ok(VariantName::Case),
            None => Err(format!("Unknown variant: {}. Use case or station", s)),
        }
    }
}

impl std::fmt::Display for VariantName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariantName::Case => write!(f, "case"),
            VariantName::Station => write!(f, "station"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_name_parse() {
        assert_eq!("case".parse::<VariantName>().unwrap(), VariantName::Case);
        assert_eq!("MRT".parse::<VariantName>().unwrap(), VariantName::Station);
        assert!("pdf".parse::<VariantName>().is_err());
        assert_eq!(VariantName::Station.variant().template_file, "照片.docx");
    }

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "photo-report",
            "--variant",
            "station",
            "generate",
            "G03-113.05.02",
            "--burn-disc",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.variant, VariantName::Station);
        assert!(matches!(
            cli.command,
            Commands::Generate { burn_disc: true, ref key, .. } if key == "G03-113.05.02"
        ));
    }

    #[test]
    fn test_cli_item_remove_numbers() {
        let cli = Cli::try_parse_from(["photo-report", "-v", "item", "remove", "A1-x", "2", "3"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Item { action: ItemCommand::Remove { numbers, .. } } => assert_eq!(numbers, vec![2, 3]),
            _ => panic!("item remove として解析されない"),
        }
    }
}
