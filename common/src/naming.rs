//! 出力ファイル・アーカイブの命名規則

/// ファイル名に使えない文字を置き換える
pub fn sanitize_file_component(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// 出力ファイル名規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFilenameRule {
    /// `{id}.docx`
    Id,
    /// `{locationOrDate}({id}).docx`
    LocationWithId,
}

impl OutputFilenameRule {
    pub fn file_name(&self, id: &str, location_or_date: &str) -> String {
        let id = sanitize_file_component(id);
        let location = sanitize_file_component(location_or_date);
        match self {
            OutputFilenameRule::Id => format!("{}.docx", id),
            OutputFilenameRule::LocationWithId => format!("{}({}).docx", location, id),
        }
    }
}

/// 写真アーカイブ（燒光碟）フォルダ名
pub fn archive_dir_name(id: &str, location_or_date: &str) -> String {
    format!(
        "照片-{}-{}",
        sanitize_file_component(id),
        sanitize_file_component(location_or_date)
    )
}

/// アーカイブ内のファイル名（indexは1始まり）
pub fn archive_file_name(index: usize, description: &str, id: &str, location_or_date: &str) -> String {
    format!(
        "{:02}-{}-{}-{}.jpg",
        index,
        sanitize_file_component(description),
        sanitize_file_component(id),
        sanitize_file_component(location_or_date)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_component("2024/01/01"), "2024_01_01");
        assert_eq!(sanitize_file_component(" 開挖\n完成 "), "開挖_完成");
        assert_eq!(sanitize_file_component("A1"), "A1");
    }

    #[test]
    fn test_archive_names() {
        assert_eq!(archive_dir_name("A1", "2024-01-01"), "照片-A1-2024-01-01");
        assert_eq!(archive_file_name(1, "x", "A1", "2024-01-01"), "01-x-A1-2024-01-01.jpg");
        assert_eq!(archive_file_name(12, "y", "A1", "2024-01-01"), "12-y-A1-2024-01-01.jpg");
    }

    #[test]
    fn test_output_rule() {
        assert_eq!(OutputFilenameRule::Id.file_name("C-7", "x"), "C-7.docx");
        assert_eq!(
            OutputFilenameRule::LocationWithId.file_name("G03", "113/05/02"),
            "113_05_02(G03).docx"
        );
    }
}
