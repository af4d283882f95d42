use photo_report_common::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {path}: {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("画像エンコードエラー: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error("案件データが破損しています: {path}: {reason}")]
    StoreCorrupted { path: String, reason: String },

    #[error("案件が見つかりません: {0}")]
    ProjectNotFound(String),

    #[error("項目番号が範囲外です: {index}（項目数 {len}）")]
    ItemIndex { index: usize, len: usize },

    #[error("テンプレートエラー: {0}")]
    Template(String),

    #[error("Word文書パッケージエラー: {0}")]
    DocxPackage(#[from] zip::result::ZipError),

    #[error("入力エラー: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("対話入力エラー: {0}")]
    Interactive(String),

    #[error(transparent)]
    Common(#[from] photo_report_common::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
