//! Word文書への差し込み
//!
//! テンプレートの `items` 繰り返しブロックに写真項目を並べ、1回の置換と
//! 1回の保存で出力する。`DocumentRenderer` は `render` で消費される。

mod blank;
mod package;
mod template;

pub use blank::write_blank_template;
pub use package::DocxPackage;
pub use template::{escape_xml, Context, InlineImage, Template, Value};

use crate::error::{ReportError, Result};
use image::ImageFormat;
use photo_report_common::ReportVariant;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// docPr の id はテンプレート内の既存図形と衝突しないよう大きめから振る
const DOC_PR_ID_BASE: u32 = 5000;

/// 差し込む画像
#[derive(Debug, Clone)]
pub enum ImageRef {
    /// 元画像ファイル
    File(PathBuf),
    /// エンコード済みの画像（時間標記済みJPEGなど）
    Encoded(Vec<u8>),
}

/// 1項目分の差し込みデータ
#[derive(Debug, Clone)]
pub struct RenderEntry {
    pub id: String,
    pub description: String,
    pub time: String,
    pub image: ImageRef,
}

/// 報告書1件分の差し込みデータ
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub id: String,
    pub location_or_date: String,
    pub entries: Vec<RenderEntry>,
}

#[derive(Debug)]
pub struct DocumentRenderer {
    template_path: PathBuf,
    package: DocxPackage,
    template: Template,
}

impl DocumentRenderer {
    /// テンプレートを読み込んで解析する
    pub fn load(template_path: &Path) -> Result<Self> {
        let package = DocxPackage::open(template_path)?;
        let template = Template::parse(&package.document_xml()?)?;
        debug!(
            "loaded template {} ({} nodes)",
            template_path.display(),
            template.nodes().len()
        );
        Ok(Self {
            template_path: template_path.to_path_buf(),
            package,
            template,
        })
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// 差し込んで `output_path` に保存する
    pub fn render(
        mut self,
        variant: &ReportVariant,
        content: ReportContent,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let (cx, cy) = variant.photo_extent_emu();
        let keys = &variant.keys;

        let mut items = Vec::with_capacity(content.entries.len());
        for (i, entry) in content.entries.into_iter().enumerate() {
            let (data, extension, content_type) = embeddable_image(entry.image)?;
            let rel_id = self.package.add_image(data, extension, content_type)?;
            let image = InlineImage {
                name: format!("{}.{}", rel_id, extension),
                rel_id,
                doc_pr_id: DOC_PR_ID_BASE + i as u32 + 1,
                cx,
                cy,
            };

            let mut item = Context::new();
            item.insert(keys.id.clone(), Value::Text(entry.id));
            item.insert(keys.description.clone(), Value::Text(entry.description));
            item.insert(keys.time.clone(), Value::Text(entry.time));
            item.insert(keys.image.clone(), Value::Image(image));
            items.push(item);
        }

        let count = items.len();
        let mut context = Context::new();
        context.insert(variant.id_field_label.clone(), Value::Text(content.id));
        context.insert(
            variant.location_field_label.clone(),
            Value::Text(content.location_or_date),
        );
        context.insert("items".to_string(), Value::List(items));

        let xml = self.template.render(&context)?;
        self.package.set_document_xml(&xml);
        self.package.write_to(output_path)?;

        info!("rendered {} item(s) into {}", count, output_path.display());
        Ok(output_path.to_path_buf())
    }
}

/// 埋め込み用のバイト列・拡張子・Content-Type を返す
fn embeddable_image(image: ImageRef) -> Result<(Vec<u8>, &'static str, &'static str)> {
    let (data, origin) = match image {
        ImageRef::File(path) => {
            if !path.is_file() {
                return Err(ReportError::FileNotFound(path.display().to_string()));
            }
            let data = std::fs::read(&path)?;
            (data, path.display().to_string())
        }
        ImageRef::Encoded(data) => (data, "<memory>".to_string()),
    };

    let format = image::guess_format(&data).map_err(|source| ReportError::ImageLoad {
        path: origin.clone(),
        source,
    })?;

    match format {
        ImageFormat::Png => Ok((data, "png", "image/png")),
        ImageFormat::Jpeg => Ok((data, "jpeg", "image/jpeg")),
        ImageFormat::Gif => Ok((data, "gif", "image/gif")),
        ImageFormat::Bmp => Ok((data, "bmp", "image/bmp")),
        other => {
            debug!("re-encoding {:?} image {} as PNG", other, origin);
            let decoded = image::load_from_memory_with_format(&data, other)
                .map_err(|source| ReportError::ImageLoad { path: origin, source })?;
            let mut png = Vec::new();
            decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            Ok((png, "png", "image/png"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Read;
    use tempfile::tempdir;

    fn read_entry(docx: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(docx).unwrap()).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_render_blank_template() {
        let dir = tempdir().unwrap();
        let variant = ReportVariant::case_report();
        let template_path = dir.path().join("template.docx");
        write_blank_template(&variant, &template_path).unwrap();

        let photo = dir.path().join("p.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 128, 0])).save(&photo).unwrap();

        let content = ReportContent {
            id: "A1".into(),
            location_or_date: "2024-01-01".into(),
            entries: vec![
                RenderEntry {
                    id: "A1".into(),
                    description: "開挖 & 整地".into(),
                    time: "09:00".into(),
                    image: ImageRef::File(photo.clone()),
                },
                RenderEntry {
                    id: "A1".into(),
                    description: "回填".into(),
                    time: "10:30".into(),
                    image: ImageRef::File(photo),
                },
            ],
        };

        let output = dir.path().join("A1.docx");
        DocumentRenderer::load(&template_path)
            .unwrap()
            .render(&variant, content, &output)
            .unwrap();

        let document = read_entry(&output, "word/document.xml");
        assert!(document.contains("開挖 &amp; 整地"));
        assert!(document.contains("09:00"));
        assert!(document.contains("10:30"));
        assert_eq!(document.matches("<w:drawing>").count(), 2);
        assert!(document.contains(r#"cx="3600000" cy="2340000""#));
        assert!(!document.contains("{{") && !document.contains("{%"));

        let rels = read_entry(&output, "word/_rels/document.xml.rels");
        assert!(rels.contains("media/photo_report_2.png"));
        let types = read_entry(&output, "[Content_Types].xml");
        assert!(types.contains(r#"Extension="png""#));
    }

    #[test]
    fn test_missing_template_writes_nothing() {
        let dir = tempdir().unwrap();
        let err = DocumentRenderer::load(&dir.path().join("none.docx")).unwrap_err();
        assert!(matches!(err, ReportError::Template(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_non_embeddable_format_becomes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("p.tiff");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        let (data, extension, _) = embeddable_image(ImageRef::File(path)).unwrap();
        assert_eq!(extension, "png");
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_encoded_jpeg_kept_as_is() {
        let mut jpeg = Vec::new();
        RgbImage::from_pixel(4, 4, Rgb([200, 0, 0]))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let (data, extension, content_type) = embeddable_image(ImageRef::Encoded(jpeg.clone())).unwrap();
        assert_eq!((extension, content_type), ("jpeg", "image/jpeg"));
        assert_eq!(data, jpeg);
    }
}
