//! Photo Report Common Library
//!
//! 報告書生成CLIと対話編集で共有される型とユーティリティ

pub mod types;
pub mod variant;
pub mod naming;
pub mod validation;
pub mod error;

pub use types::{project_key, ItemRecord, ProjectRecord};
pub use variant::{cm_to_emu, cm_to_px, ReportVariant, TemplateKeys, DEFAULT_STAMP_DPI};
pub use naming::{archive_dir_name, archive_file_name, sanitize_file_component, OutputFilenameRule};
pub use validation::{validate_project, ValidationError};
pub use error::{Error, Result};
