//! 報告書生成パイプライン
//!
//! 検証 → テンプレート読込 → 時間標記 → 差し込み・保存 → （燒光碟）アーカイブ。
//! 検証かテンプレート・画像の読み込みに失敗した場合は何も出力しない。

use crate::archive::{archive_originals, ArchiveReport};
use crate::error::Result;
use crate::render::{DocumentRenderer, ImageRef, RenderEntry, ReportContent};
use crate::stamp::Stamper;
use indicatif::{ProgressBar, ProgressStyle};
use photo_report_common::{validate_project, ProjectRecord, ReportVariant};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub output_dir: PathBuf,
    pub template_path: PathBuf,
    /// 元画像を `照片-{id}-{場所/日付}` に書き出す
    pub burn_disc: bool,
    /// 進捗バーを表示する
    pub show_progress: bool,
    /// アーカイブのJPEG品質
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub document_path: PathBuf,
    /// 時間標記した項目数
    pub stamped: usize,
    pub archive: Option<ArchiveReport>,
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

/// 案件から報告書を生成する
pub fn generate_report(
    project: &ProjectRecord,
    variant: &ReportVariant,
    stamper: &Stamper,
    options: &GenerateOptions,
) -> Result<GenerateReport> {
    validate_project(project, variant)?;

    let renderer = DocumentRenderer::load(&options.template_path)?;
    debug!("template: {}", renderer.template_path().display());
    let bar = progress_bar(project.items.len(), options.show_progress);

    let mut entries = Vec::with_capacity(project.items.len());
    let mut stamped = 0;
    for (i, item) in project.items.iter().enumerate() {
        let image_path = Path::new(item.image_path.trim());
        bar.set_message(item.description.clone());

        let image = if item.stamp_time {
            let result = stamper.stamp(
                image_path,
                &item.time,
                variant.photo_width_cm,
                variant.photo_height_cm,
            );
            let stamped_image = match result {
                Ok(image) => image,
                Err(err) => {
                    bar.abandon();
                    return Err(err);
                }
            };
            debug!(
                "item {}: stamped {}x{} ({} bytes)",
                i + 1,
                stamped_image.width,
                stamped_image.height,
                stamped_image.bytes.len()
            );
            stamped += 1;
            ImageRef::Encoded(stamped_image.bytes)
        } else {
            ImageRef::File(image_path.to_path_buf())
        };

        entries.push(RenderEntry {
            id: project.id.clone(),
            description: item.description.clone(),
            time: item.time.clone(),
            image,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    let content = ReportContent {
        id: project.id.clone(),
        location_or_date: project.location_or_date.clone(),
        entries,
    };
    let file_name = variant.output_file_name(&project.id, &project.location_or_date);
    let document_path = renderer.render(variant, content, &options.output_dir.join(file_name))?;
    info!("saved {}", document_path.display());

    let archive = if options.burn_disc {
        Some(archive_originals(project, &options.output_dir, options.jpeg_quality)?)
    } else {
        None
    };

    Ok(GenerateReport {
        document_path,
        stamped,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::render::write_blank_template;
    use crate::stamp::{StampFont, StampSettings};
    use image::{Rgb, RgbImage};
    use photo_report_common::{ItemRecord, ValidationError};
    use tempfile::tempdir;

    fn stamper() -> Stamper {
        Stamper::new(StampSettings { dpi: 96, jpeg_quality: 90 }, StampFont::Builtin)
    }

    fn setup(dir: &Path, variant: &ReportVariant) -> (GenerateOptions, PathBuf) {
        let template_path = dir.join("template.docx");
        write_blank_template(variant, &template_path).unwrap();
        let photo = dir.join("valid.png");
        RgbImage::from_pixel(30, 20, Rgb([90, 90, 90])).save(&photo).unwrap();

        let options = GenerateOptions {
            output_dir: dir.join("out"),
            template_path,
            burn_disc: false,
            show_progress: false,
            jpeg_quality: 90,
        };
        (options, photo)
    }

    #[test]
    fn test_stamped_item_is_embedded_as_jpeg() {
        let dir = tempdir().unwrap();
        let variant = ReportVariant::station_report();
        let (options, photo) = setup(dir.path(), &variant);

        let mut project = ProjectRecord::new("G03", "113.05.02");
        project.items.push(ItemRecord::new("x", "09:00", photo.display().to_string(), true));

        let report = generate_report(&project, &variant, &stamper(), &options).unwrap();
        assert_eq!(report.stamped, 1);
        assert_eq!(report.document_path, options.output_dir.join("113.05.02(G03).docx"));
        assert!(report.archive.is_none());

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&report.document_path).unwrap()).unwrap();
        assert!(archive.by_name("word/media/photo_report_1.jpeg").is_ok());
    }

    #[test]
    fn test_validation_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let variant = ReportVariant::case_report();
        let (options, _) = setup(dir.path(), &variant);

        let project = ProjectRecord::new("A1", "2024-01-01");
        let err = generate_report(&project, &variant, &stamper(), &options).unwrap_err();
        assert!(matches!(err, ReportError::Validation(ValidationError::NoItems)));
        assert!(!options.output_dir.exists());
    }

    #[test]
    fn test_corrupt_stamp_source_aborts() {
        let dir = tempdir().unwrap();
        let variant = ReportVariant::case_report();
        let (options, _) = setup(dir.path(), &variant);
        let broken = dir.path().join("broken.jpg");
        std::fs::write(&broken, b"nope").unwrap();

        let mut project = ProjectRecord::new("A1", "2024-01-01");
        project.items.push(ItemRecord::new("x", "09:00", broken.display().to_string(), true));

        let err = generate_report(&project, &variant, &stamper(), &options).unwrap_err();
        assert!(matches!(err, ReportError::ImageLoad { .. }));
        assert!(!options.output_dir.join("A1.docx").exists());
    }
}
