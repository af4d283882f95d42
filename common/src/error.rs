//! 共通クレートのエラー型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// 案件レコードのJSON変換に失敗
    #[error("案件データのJSON変換エラー: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectRecord;

    #[test]
    fn test_invalid_record_json() {
        let err = ProjectRecord::from_json("{\"id\": 1}").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(format!("{}", err).starts_with("案件データのJSON変換エラー"));
    }
}
