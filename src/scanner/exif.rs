use chrono::NaiveDateTime;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 撮影日時を `YYYY/MM/DD HH:MM` 形式で取得（DateTimeOriginal → DateTime）
pub fn extract_time(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader).ok()?;

    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, exif::In::PRIMARY))
        .find_map(|field| match &field.value {
            exif::Value::Ascii(values) => values
                .first()
                .and_then(|raw| format_exif_datetime(&String::from_utf8_lossy(raw))),
            _ => None,
        })
}

/// EXIFの `2024:01:31 09:05:00` を `2024/01/31 09:05` に変換
pub fn format_exif_datetime(raw: &str) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    Some(parsed.format("%Y/%m/%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exif_datetime() {
        assert_eq!(
            format_exif_datetime("2024:01:31 09:05:00"),
            Some("2024/01/31 09:05".to_string())
        );
        assert_eq!(format_exif_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(format_exif_datetime(""), None);
    }

    #[test]
    fn test_extract_time_without_exif() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        image::RgbImage::new(2, 2).save(&path).unwrap();
        assert_eq!(extract_time(&path), None);
    }
}
