//! .docx（ZIP）パッケージの読み書き

use crate::error::{ReportError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_XML: &str = "word/document.xml";
pub const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const EMPTY_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

/// 描画要素が使う名前空間
const DRAWING_NAMESPACES: [(&str, &str); 2] = [
    (
        "xmlns:wp",
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
    ),
    (
        "xmlns:r",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    ),
];

/// メモリ上に展開したパッケージ（エントリ順を保持）
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    entries: Vec<(String, Vec<u8>)>,
    media_count: usize,
}

impl DocxPackage {
    /// テンプレートを開く
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ReportError::Template(format!(
                "テンプレートが見つかりません: {}",
                path.display()
            )));
        }
        let not_docx = |e: zip::result::ZipError| {
            ReportError::Template(format!("{} はWord文書ではありません: {}", path.display(), e))
        };

        let mut archive = ZipArchive::new(File::open(path)?).map_err(not_docx)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(not_docx)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        let package = Self::from_entries(entries);
        if package.entry(DOCUMENT_XML).is_none() {
            return Err(ReportError::Template(format!(
                "{} に {} がありません",
                path.display(),
                DOCUMENT_XML
            )));
        }
        debug!("opened template {} ({} entries)", path.display(), package.entries.len());
        Ok(package)
    }

    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            entries,
            media_count: 0,
        }
    }

    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn set_entry(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    fn entry_text(&self, name: &str) -> Result<Option<String>> {
        match self.entry(name) {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|_| ReportError::Template(format!("{} がUTF-8ではありません", name))),
            None => Ok(None),
        }
    }

    pub fn document_xml(&self) -> Result<String> {
        self.entry_text(DOCUMENT_XML)?
            .ok_or_else(|| ReportError::Template(format!("{} がありません", DOCUMENT_XML)))
    }

    /// 本文を差し替える（描画用の名前空間を補う）
    pub fn set_document_xml(&mut self, xml: &str) {
        let xml = ensure_namespaces(xml);
        self.set_entry(DOCUMENT_XML, xml.into_bytes());
    }

    /// 画像をメディアとして追加し、リレーションIDを返す
    pub fn add_image(&mut self, data: Vec<u8>, extension: &str, content_type: &str) -> Result<String> {
        let mut rels = self
            .entry_text(DOCUMENT_RELS)?
            .unwrap_or_else(|| EMPTY_RELS.to_string());

        self.media_count += 1;
        let mut n = self.media_count;
        while rels.contains(&format!("Id=\"rIdPhoto{}\"", n)) {
            n += 1;
        }
        self.media_count = n;

        let file_name = format!("photo_report_{}.{}", n, extension);
        let rel_id = format!("rIdPhoto{}", n);
        let relationship = format!(
            r#"<Relationship Id="{}" Type="{}" Target="media/{}"/>"#,
            rel_id, IMAGE_REL_TYPE, file_name
        );
        let close = rels
            .rfind("</Relationships>")
            .ok_or_else(|| ReportError::Template(format!("{} が不正です", DOCUMENT_RELS)))?;
        rels.insert_str(close, &relationship);
        self.set_entry(DOCUMENT_RELS, rels.into_bytes());

        self.register_content_type(extension, content_type)?;
        self.set_entry(&format!("word/media/{}", file_name), data);
        Ok(rel_id)
    }

    fn register_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let mut types = self
            .entry_text(CONTENT_TYPES)?
            .ok_or_else(|| ReportError::Template(format!("{} がありません", CONTENT_TYPES)))?;

        let lower = types.to_lowercase();
        if lower.contains(&format!("extension=\"{}\"", extension.to_lowercase())) {
            return Ok(());
        }
        let close = types
            .rfind("</Types>")
            .ok_or_else(|| ReportError::Template(format!("{} が不正です", CONTENT_TYPES)))?;
        types.insert_str(
            close,
            &format!(r#"<Default Extension="{}" ContentType="{}"/>"#, extension, content_type),
        );
        self.set_entry(CONTENT_TYPES, types.into_bytes());
        Ok(())
    }

    /// 出力先へ書き出す（一時ファイル経由で置き換え）
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let temp = NamedTempFile::new_in(dir)?;
        let mut zip = ZipWriter::new(temp.as_file());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        zip.finish()?;

        temp.persist(path).map_err(|e| ReportError::Io(e.error))?;
        debug!("wrote {} ({} entries)", path.display(), self.entries.len());
        Ok(())
    }
}

/// `<w:document>` 開始タグに wp / r の名前空間宣言がなければ追加
fn ensure_namespaces(xml: &str) -> String {
    let Some(start) = xml.find("<w:document") else {
        return xml.to_string();
    };
    let Some(end) = xml[start..].find('>').map(|i| start + i) else {
        return xml.to_string();
    };

    let tag = &xml[start..end];
    let missing: String = DRAWING_NAMESPACES
        .iter()
        .filter(|(prefix, _)| !tag.contains(&format!("{}=", prefix)))
        .map(|(prefix, uri)| format!(" {}=\"{}\"", prefix, uri))
        .collect();
    if missing.is_empty() {
        return xml.to_string();
    }

    // 自己終了タグ `/>` の場合は `/` の前に入れる
    let insert_at = if xml[..end].ends_with('/') { end - 1 } else { end };
    let mut out = String::with_capacity(xml.len() + missing.len());
    out.push_str(&xml[..insert_at]);
    out.push_str(&missing);
    out.push_str(&xml[insert_at..]);
    out
}
