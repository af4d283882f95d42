//! 時間標記用フォント
//!
//! 設定されたTrueTypeフォント → システムの既知フォント → 組み込み8x8ビットマップ
//! の順に解決する。どれも使えなくても標記自体は失敗させない。

use crate::error::{ReportError, Result};
use ab_glyph::{point, Font, FontVec, GlyphId, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, warn};

/// 探索するシステムフォント
const FONT_CANDIDATES: &[&str] = &[
    "arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

/// 組み込みビットマップの1文字の大きさ（ドット）
const BITMAP_CELL: u32 = 8;

pub enum StampFont {
    TrueType(FontVec),
    /// font8x8 の基本ラテン文字
    Builtin,
}

impl std::fmt::Debug for StampFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StampFont::TrueType(_) => write!(f, "StampFont::TrueType"),
            StampFont::Builtin => write!(f, "StampFont::Builtin"),
        }
    }
}

impl StampFont {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data).map_err(|e| {
            ReportError::Config(format!("フォントを読み込めません: {}: {}", path.display(), e))
        })?;
        Ok(StampFont::TrueType(font))
    }

    /// フォントを解決する（失敗時は組み込みフォント）
    pub fn resolve(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_file(path) {
                Ok(font) => return font,
                Err(e) => warn!("configured font unusable, falling back: {}", e),
            }
        }

        for candidate in FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            if let Ok(font) = Self::from_file(path) {
                debug!("stamp font: {}", path.display());
                return font;
            }
        }

        warn!("no TrueType font found, using built-in bitmap font");
        StampFont::Builtin
    }

    /// 描画原点から見た実際の描画範囲の右端・下端（px）
    ///
    /// TrueTypeはグリフが原点より下にずれて描かれるため、
    /// `draw_text_mut` と同じ配置でグリフの外接矩形を求める。
    pub fn ink_extent(&self, px: f32, text: &str) -> (i32, i32) {
        match self {
            StampFont::TrueType(font) => truetype_ink_extent(font, px, text),
            StampFont::Builtin => bitmap_ink_extent(px, text),
        }
    }

    /// (x, y) を左上として描画
    pub fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str) {
        match self {
            StampFont::TrueType(font) => draw_text_mut(canvas, color, x, y, px, font, text),
            StampFont::Builtin => draw_bitmap_text(canvas, color, x, y, px, text),
        }
    }
}

/// ビットマップ1ドットの一辺（px）
fn bitmap_dot(px: f32) -> u32 {
    ((px / BITMAP_CELL as f32).round() as u32).max(1)
}

fn truetype_ink_extent(font: &FontVec, px: f32, text: &str) -> (i32, i32) {
    let scaled = font.as_scaled(px);
    let mut caret = 0f32;
    let mut last: Option<GlyphId> = None;
    let (mut right, mut bottom) = (0, 0);

    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(px, point(caret, scaled.ascent()));
        caret += scaled.h_advance(glyph_id);
        let Some(outlined) = scaled.outline_glyph(glyph) else {
            continue;
        };
        if let Some(last) = last {
            caret += scaled.kern(glyph_id, last);
        }
        last = Some(glyph_id);

        let bounds = outlined.px_bounds();
        right = right.max(bounds.min.x.round() as i32 + bounds.width() as i32);
        bottom = bottom.max(bounds.min.y.round() as i32 + bounds.height() as i32);
    }
    (right, bottom)
}

fn bitmap_ink_extent(px: f32, text: &str) -> (i32, i32) {
    let dot = bitmap_dot(px) as i32;
    let advance = BITMAP_CELL as i32 * dot;
    let (mut right, mut bottom) = (0, 0);

    for (n, ch) in text.chars().enumerate() {
        for (row, &bits) in bitmap_glyph(ch).iter().enumerate() {
            if bits == 0 {
                continue;
            }
            // 最上位の立っているビットが最も右の列
            let last_col = (7 - bits.leading_zeros()) as i32;
            right = right.max(advance * n as i32 + (last_col + 1) * dot);
            bottom = bottom.max((row as i32 + 1) * dot);
        }
    }
    (right, bottom)
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    let index = if ch.is_ascii() { ch as usize } else { '?' as usize };
    font8x8::legacy::BASIC_LEGACY[index]
}

fn draw_bitmap_text(canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, px: f32, text: &str) {
    let dot = bitmap_dot(px);
    let advance = (BITMAP_CELL * dot) as i32;

    for (n, ch) in text.chars().enumerate() {
        let origin_x = x + advance * n as i32;
        for (row, &bits) in bitmap_glyph(ch).iter().enumerate() {
            for col in 0..BITMAP_CELL {
                // bit 0 が左端
                if bits >> col & 1 == 0 {
                    continue;
                }
                let dx = origin_x + (col * dot) as i32;
                let dy = y + (row as u32 * dot) as i32;
                draw_filled_rect_mut(canvas, Rect::at(dx, dy).of_size(dot, dot), color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ink_extent() {
        let font = StampFont::Builtin;
        // '0' は7行目（0始まり）が空白、右端の列も空白
        let (right, bottom) = font.ink_extent(16.0, "0");
        assert!(right > 0 && right <= 16);
        assert!(bottom > 0 && bottom <= 16);
        assert_eq!(font.ink_extent(16.0, "  "), (0, 0));
        assert!(font.ink_extent(16.0, "00").0 > 16);
    }

    #[test]
    fn test_builtin_draw_marks_pixels() {
        let mut canvas = RgbImage::from_pixel(64, 32, Rgb([255, 255, 255]));
        StampFont::Builtin.draw(&mut canvas, Rgb([255, 0, 0]), 0, 0, 16.0, "8");

        let red = canvas.pixels().filter(|p| p.0 == [255, 0, 0]).count();
        assert!(red > 0);
        // 描画範囲外は変化しない
        assert_eq!(canvas.get_pixel(40, 20).0, [255, 255, 255]);
    }

    #[test]
    fn test_missing_configured_font_falls_back() {
        let font = StampFont::resolve(Some(Path::new("/nonexistent/font.ttf")));
        // 候補フォントがあればそれ、なければ組み込み
        let (right, bottom) = font.ink_extent(24.0, "09:00");
        assert!(right > 0 && bottom > 0);
    }
}
