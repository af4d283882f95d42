//! 燒光碟用の写真アーカイブ
//!
//! 各項目の元画像（時間標記なし）を不透明RGBのJPEGに変換し、
//! `照片-{id}-{場所/日付}` フォルダへ番号付きで書き出す。
//! 途中で失敗した項目は記録して続行する。

use crate::error::Result;
use crate::stamp::{encode_jpeg, load_image};
use photo_report_common::{archive_dir_name, archive_file_name, ProjectRecord};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// アーカイブ結果
#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    pub dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// (1始まりの項目番号, エラー内容)
    pub failed: Vec<(usize, String)>,
}

/// 案件の元画像をアーカイブする
pub fn archive_originals(
    project: &ProjectRecord,
    output_dir: &Path,
    jpeg_quality: u8,
) -> Result<ArchiveReport> {
    let dir = output_dir.join(archive_dir_name(&project.id, &project.location_or_date));
    std::fs::create_dir_all(&dir)?;

    let mut report = ArchiveReport {
        dir: dir.clone(),
        ..Default::default()
    };

    for (i, item) in project.items.iter().enumerate() {
        let index = i + 1;
        let dest = dir.join(archive_file_name(
            index,
            &item.description,
            &project.id,
            &project.location_or_date,
        ));

        match write_opaque_jpeg(Path::new(&item.image_path), &dest, jpeg_quality) {
            Ok(()) => report.written.push(dest),
            Err(err) => {
                warn!("archive: item {} ({}) failed: {}", index, item.image_path, err);
                report.failed.push((index, err.to_string()));
            }
        }
    }

    info!(
        "archived {} of {} photo(s) into {}",
        report.written.len(),
        project.items.len(),
        dir.display()
    );
    Ok(report)
}

fn write_opaque_jpeg(source: &Path, dest: &Path, jpeg_quality: u8) -> Result<()> {
    let image = load_image(source)?;
    let bytes = encode_jpeg(&image.to_rgb8(), jpeg_quality)?;
    std::fs::write(dest, bytes)?;
    Ok(())
}
