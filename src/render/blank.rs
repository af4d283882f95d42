//! 空テンプレートの生成
//!
//! 見出し段落と、1行を `{%tr for item in items %}` で囲んだ表だけを持つ
//! 最小の .docx を書き出す。

use super::package::{DocxPackage, CONTENT_TYPES, DOCUMENT_RELS, DOCUMENT_XML};
use super::template::escape_xml;
use crate::error::Result;
use photo_report_common::ReportVariant;
use std::path::Path;
use tracing::info;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#
);

const DOCUMENT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

/// 表の列幅（twip）
const PHOTO_COL_TWIPS: u32 = 6200;
const TEXT_COL_TWIPS: u32 = 3400;

/// バリアント用の空テンプレートを書き出す
pub fn write_blank_template(variant: &ReportVariant, path: &Path) -> Result<()> {
    let package = DocxPackage::from_entries(vec![
        (CONTENT_TYPES.to_string(), CONTENT_TYPES_XML.as_bytes().to_vec()),
        ("_rels/.rels".to_string(), ROOT_RELS_XML.as_bytes().to_vec()),
        (DOCUMENT_XML.to_string(), document_xml(variant).into_bytes()),
        (DOCUMENT_RELS.to_string(), DOCUMENT_RELS_XML.as_bytes().to_vec()),
    ]);
    package.write_to(path)?;
    info!("wrote blank {} template to {}", variant.name, path.display());
    Ok(())
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

fn cell(width: u32, span: Option<u32>, paragraphs: &[String]) -> String {
    let span = span
        .map(|n| format!(r#"<w:gridSpan w:val="{}"/>"#, n))
        .unwrap_or_default();
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>{}</w:tcPr>{}</w:tc>"#,
        width,
        span,
        paragraphs.concat()
    )
}

/// タグだけを置く行（展開時に行ごと置き換わる）
fn tag_row(tag: &str) -> String {
    format!(
        "<w:tr>{}</w:tr>",
        cell(PHOTO_COL_TWIPS + TEXT_COL_TWIPS, Some(2), &[paragraph(tag)])
    )
}

fn document_xml(variant: &ReportVariant) -> String {
    let keys = &variant.keys;
    let var = |name: &str| format!("{{{{ {} }}}}", name);
    let item_var = |name: &str| format!("{{{{ item.{} }}}}", name);

    let heading = paragraph(&format!(
        "{} {}：{}　{}：{}",
        variant.title,
        variant.id_field_label,
        var(&variant.id_field_label),
        variant.location_field_label,
        var(&variant.location_field_label),
    ));

    let item_row = format!(
        "<w:tr>{}{}</w:tr>",
        cell(PHOTO_COL_TWIPS, None, &[paragraph(&item_var(&keys.image))]),
        cell(
            TEXT_COL_TWIPS,
            None,
            &[
                paragraph(&format!("{}：{}", keys.id, item_var(&keys.id))),
                paragraph(&format!("{}：{}", keys.description, item_var(&keys.description))),
                paragraph(&format!("{}：{}", keys.time, item_var(&keys.time))),
            ],
        ),
    );

    let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|side| format!(r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#, side))
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}"><w:body>"#,
            "{heading}",
            r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>{borders}</w:tblBorders></w:tblPr>"#,
            r#"<w:tblGrid><w:gridCol w:w="{photo}"/><w:gridCol w:w="{text}"/></w:tblGrid>"#,
            "{open}{row}{close}",
            "</w:tbl>",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="567" w:footer="567" w:gutter="0"/></w:sectPr>"#,
            "</w:body></w:document>"
        ),
        w = W_NS,
        r = R_NS,
        wp = WP_NS,
        heading = heading,
        borders = borders,
        photo = PHOTO_COL_TWIPS,
        text = TEXT_COL_TWIPS,
        open = tag_row("{%tr for item in items %}"),
        row = item_row,
        close = tag_row("{%tr endfor %}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Template;
    use tempfile::tempdir;

    #[test]
    fn test_blank_template_parses() {
        let xml = document_xml(&ReportVariant::station_report());
        assert!(xml.contains("{{ item.站別 }}"));
        assert!(xml.contains("{{ 施工日期 }}"));

        let template = Template::parse(&xml).unwrap();
        let rendered = template.render(&Default::default()).unwrap();
        // 項目が無ければ表の行は出力されない
        assert!(!rendered.contains("<w:tr>"));
        assert!(rendered.contains("<w:tbl>"));
    }

    #[test]
    fn test_write_blank_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates").join("施工照片.docx");
        write_blank_template(&ReportVariant::case_report(), &path).unwrap();

        let package = DocxPackage::open(&path).unwrap();
        assert!(package.document_xml().unwrap().contains("{%tr for item in items %}"));
        assert!(package.entry("_rels/.rels").is_some());
    }
}
