//! Word文書XMLのテンプレート処理
//!
//! 対応する書式:
//! - `{{ name }}` / `{{ item.name }}` 変数
//! - `{% for item in items %}` ... `{% endfor %}` 繰り返し
//! - `{%p ... %}` `{%tr ... %}` `{%tc ... %}` `{%r ... %}` は、タグを含む
//!   段落 / 表の行 / セル / ランごとタグに置き換える
//!
//! Wordは入力中の文字列を複数のランに分割するため、解析前にタグ内部に
//! 紛れ込んだXMLマークアップを取り除く。

use crate::error::{ReportError, Result};
use regex::Regex;
use std::collections::HashMap;

/// テンプレートに渡す値
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Image(InlineImage),
    List(Vec<Context>),
}

pub type Context = HashMap<String, Value>;

/// 文書に埋め込み済みの画像への参照
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub rel_id: String,
    pub doc_pr_id: u32,
    pub name: String,
    /// 幅（EMU）
    pub cx: u64,
    /// 高さ（EMU）
    pub cy: u64,
}

impl InlineImage {
    /// インライン画像のランXML
    pub fn to_run_xml(&self) -> String {
        format!(
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/>"#,
                r#"<wp:docPr id="{id}" name="{name}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
                r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
            ),
            cx = self.cx,
            cy = self.cy,
            id = self.doc_pr_id,
            name = escape_xml(&self.name),
            rid = self.rel_id,
        )
    }
}

/// テンプレートの構文木
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Var(String),
    For {
        var: String,
        collection: String,
        body: Vec<Node>,
    },
}

/// 解析済みテンプレート
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// document.xml を解析する
    pub fn parse(xml: &str) -> Result<Self> {
        let patched = patch_xml(xml)?;
        let tokens = tokenize(&patched)?;
        let mut iter = tokens.into_iter();
        let nodes = parse_nodes(&mut iter, false)?;
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// コンテキストを差し込んだXMLを返す
    pub fn render(&self, context: &Context) -> Result<String> {
        let mut out = String::new();
        let mut scopes = Vec::new();
        render_nodes(&self.nodes, context, &mut scopes, &mut out)?;
        Ok(out)
    }
}

pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 文字列値を `<w:t>` 内に入れる形へ変換（改行は改行要素に）
fn text_to_run_content(value: &str) -> String {
    let normalized = value.replace("\r\n", "\n");
    normalized
        .split('\n')
        .map(escape_xml)
        .collect::<Vec<_>>()
        .join(r#"</w:t><w:br/><w:t xml:space="preserve">"#)
}

/// 分割されたタグを結合し、ブロックタグを展開する
pub fn patch_xml(xml: &str) -> Result<String> {
    lazy_static::lazy_static! {
        // `{` と `{`/`%` の間のマークアップ
        static ref OPEN_SPLIT_RE: Regex = Regex::new(r"\{(?:<[^>]*>)+([{%])").unwrap();
        // `}`/`%` と `}` の間のマークアップ
        static ref CLOSE_SPLIT_RE: Regex = Regex::new(r"([}%])(?:<[^>]*>)+\}").unwrap();
        static ref TAG_RE: Regex = Regex::new(r"(?s)\{%.*?%\}|\{\{.*?\}\}").unwrap();
        static ref MARKUP_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    }

    let joined = OPEN_SPLIT_RE.replace_all(xml, "{$1");
    let joined = CLOSE_SPLIT_RE.replace_all(&joined, "${1}}");
    let cleaned = TAG_RE.replace_all(&joined, |caps: &regex::Captures| {
        MARKUP_RE.replace_all(&caps[0], "").into_owned()
    });

    let mut xml = cleaned.into_owned();
    for element in ["tr", "tc", "p", "r"] {
        xml = expand_block_tags(&xml, element)?;
    }
    Ok(xml)
}

/// `{%tr ... %}` などを含む要素全体を `{% ... %}` に置き換える
fn expand_block_tags(xml: &str, element: &str) -> Result<String> {
    let marker = format!("{{%{} ", element);
    let open_plain = format!("<w:{}>", element);
    let open_attr = format!("<w:{} ", element);
    let close = format!("</w:{}>", element);

    let mut xml = xml.to_string();
    while let Some(tag_start) = xml.find(&marker) {
        let tag_end = xml[tag_start..]
            .find("%}")
            .map(|i| tag_start + i + 2)
            .ok_or_else(|| ReportError::Template(format!("閉じていないタグ: {}", marker)))?;
        let inner = xml[tag_start + marker.len()..tag_end - 2].trim().to_string();

        let before = &xml[..tag_start];
        let elem_start = match (before.rfind(&open_plain), before.rfind(&open_attr)) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => {
                return Err(ReportError::Template(format!(
                    "{{%{} {} %}} が <w:{}> の中にありません",
                    element, inner, element
                )))
            }
        };
        let elem_end = xml[tag_end..]
            .find(&close)
            .map(|i| tag_end + i + close.len())
            .ok_or_else(|| {
                ReportError::Template(format!("</w:{}> が見つかりません", element))
            })?;

        xml.replace_range(elem_start..elem_end, &format!("{{% {} %}}", inner));
    }
    Ok(xml)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Var(String),
    Tag(String),
}

fn tokenize(xml: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = xml;

    loop {
        let next_var = rest.find("{{");
        let next_tag = rest.find("{%");
        let (start, is_var) = match (next_var, next_tag) {
            (Some(v), Some(t)) if v < t => (v, true),
            (Some(_), Some(t)) => (t, false),
            (Some(v), None) => (v, true),
            (None, Some(t)) => (t, false),
            (None, None) => break,
        };

        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }

        let closing = if is_var { "}}" } else { "%}" };
        let body_start = start + 2;
        let end = rest[body_start..]
            .find(closing)
            .map(|i| body_start + i)
            .ok_or_else(|| {
                ReportError::Template(format!("閉じていないタグ: {}", truncate(&rest[start..], 40)))
            })?;

        let content = rest[body_start..end].trim().to_string();
        tokens.push(if is_var { Token::Var(content) } else { Token::Tag(content) });
        rest = &rest[end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn parse_nodes(tokens: &mut impl Iterator<Item = Token>, in_loop: bool) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Var(expr) => nodes.push(Node::Var(expr)),
            Token::Tag(tag) => {
                let words: Vec<&str> = tag.split_whitespace().collect();
                match words.as_slice() {
                    ["for", var, "in", collection] => {
                        let body = parse_nodes(tokens, true)?;
                        nodes.push(Node::For {
                            var: var.to_string(),
                            collection: collection.to_string(),
                            body,
                        });
                    }
                    ["endfor"] if in_loop => return Ok(nodes),
                    ["endfor"] => {
                        return Err(ReportError::Template("対応する for のない endfor".into()))
                    }
                    _ => {
                        return Err(ReportError::Template(format!("未対応のタグ: {{% {} %}}", tag)))
                    }
                }
            }
        }
    }

    if in_loop {
        return Err(ReportError::Template("endfor がありません".into()));
    }
    Ok(nodes)
}

/// `name` / `item.name` を解決する
fn lookup<'a>(expr: &str, root: &'a Context, scopes: &[(String, &'a Context)]) -> Option<&'a Value> {
    let (head, field) = match expr.split_once('.') {
        Some((head, field)) => (head, Some(field)),
        None => (expr, None),
    };

    let scope: Option<&'a Context> = scopes
        .iter()
        .rev()
        .find(|(name, _)| name.as_str() == head)
        .map(|(_, scope)| *scope);
    if let Some(scope) = scope {
        return scope.get(field?);
    }
    match field {
        None => root.get(head),
        Some(_) => None,
    }
}

fn render_nodes<'a>(
    nodes: &[Node],
    root: &'a Context,
    scopes: &mut Vec<(String, &'a Context)>,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(expr) => match lookup(expr, root, scopes) {
                Some(Value::Text(text)) => out.push_str(&text_to_run_content(text)),
                Some(Value::Image(image)) => {
                    // 現在のランを閉じて画像ランを挟む
                    out.push_str("</w:t></w:r>");
                    out.push_str(&image.to_run_xml());
                    out.push_str(r#"<w:r><w:t xml:space="preserve">"#);
                }
                Some(Value::List(_)) => {
                    return Err(ReportError::Template(format!(
                        "リストは直接表示できません: {{{{ {} }}}}",
                        expr
                    )))
                }
                None => {}
            },
            Node::For { var, collection, body } => {
                let list = match lookup(collection, root, scopes) {
                    Some(Value::List(list)) => list,
                    Some(_) => {
                        return Err(ReportError::Template(format!(
                            "{} はリストではありません",
                            collection
                        )))
                    }
                    None => continue,
                };
                for entry in list {
                    scopes.push((var.clone(), entry));
                    render_nodes(body, root, scopes, out)?;
                    scopes.pop();
                }
            }
        }
    }
    Ok(())
}
