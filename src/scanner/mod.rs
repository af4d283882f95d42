//! 写真フォルダの読み込み

mod exif;

pub use self::exif::{extract_time, format_exif_datetime};

use crate::error::{ReportError, Result};
use photo_report_common::ItemRecord;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// EXIFの撮影日時（`YYYY/MM/DD HH:MM`）
    pub time: Option<String>,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(ReportError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(ext) = path.extension() else {
            continue;
        };
        if !is_image_extension(&ext.to_string_lossy()) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        images.push(ImageInfo {
            path: path.to_path_buf(),
            file_name,
            time: extract_time(path),
        });
    }

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// 画像一覧から写真項目を作る（説明はファイル名、時間はEXIF）
pub fn items_from_images(images: &[ImageInfo], stamp_time: bool) -> Vec<ItemRecord> {
    images
        .iter()
        .map(|image| {
            let description = image
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| image.file_name.clone());
            ItemRecord::new(
                description,
                image.time.clone().unwrap_or_default(),
                image.path.display().to_string(),
                stamp_time,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(is_image_extension("Bmp"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
        assert!(!is_image_extension("gif"));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(ReportError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_empty() {
        let temp_dir = tempdir().unwrap();
        let result = scan_folder(temp_dir.path()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scan_folder_with_images() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();

        File::create(dir.join("test1.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.join("test2.JPG")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.join("test3.png")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.join("test4.bmp")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.join("readme.txt")).unwrap().write_all(b"text").unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();
        File::create(dir.join("sub").join("nested.jpg")).unwrap();

        let result = scan_folder(dir).unwrap();
        let names: Vec<_> = result.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["test1.jpg", "test2.JPG", "test3.png", "test4.bmp"]);
        assert!(result.iter().all(|i| i.time.is_none()));
    }

    #[test]
    fn test_images_sorted_by_filename() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();

        File::create(dir.join("c.jpg")).unwrap();
        File::create(dir.join("a.jpg")).unwrap();
        File::create(dir.join("b.jpg")).unwrap();

        let result = scan_folder(dir).unwrap();
        assert_eq!(result[0].file_name, "a.jpg");
        assert_eq!(result[1].file_name, "b.jpg");
        assert_eq!(result[2].file_name, "c.jpg");
    }

    #[test]
    fn test_items_from_images() {
        let images = vec![
            ImageInfo {
                path: PathBuf::from("/photos/開挖.jpg"),
                file_name: "開挖.jpg".into(),
                time: Some("2024/01/31 09:05".into()),
            },
            ImageInfo {
                path: PathBuf::from("/photos/b.png"),
                file_name: "b.png".into(),
                time: None,
            },
        ];

        let items = items_from_images(&images, true);
        assert_eq!(items[0].description, "開挖");
        assert_eq!(items[0].time, "2024/01/31 09:05");
        assert!(items[0].stamp_time);
        assert_eq!(items[1].time, "");
        assert_eq!(items[1].image_path, "/photos/b.png");
    }
}
