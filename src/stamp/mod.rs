//! 画像への時間標記
//!
//! 指定の物理サイズ（cm）と想定dpiからピクセルサイズを求め、縦横比を無視して
//! そのサイズへ強制リサイズし、右下に赤字で時間を焼き込んでJPEGで返す。

mod font;

pub use font::StampFont;

use crate::config::Config;
use crate::error::{ReportError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageReader, Rgb, RgbImage};
use photo_report_common::{cm_to_px, DEFAULT_STAMP_DPI};
use std::path::Path;
use tracing::debug;

/// 標記文字の色
pub const STAMP_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// 標記の解像度・品質設定
///
/// 文字サイズは `dpi / 6` px、余白は `dpi / 20` px（縦横とも）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampSettings {
    pub dpi: u32,
    pub jpeg_quality: u8,
}

impl Default for StampSettings {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_STAMP_DPI,
            jpeg_quality: 90,
        }
    }
}

impl StampSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dpi: config.dpi,
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn font_px(&self) -> f32 {
        self.dpi as f32 / 6.0
    }

    pub fn margin_px(&self) -> i32 {
        (self.dpi / 20) as i32
    }
}

/// 標記済み画像（JPEGエンコード済み）
#[derive(Debug, Clone)]
pub struct StampedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug)]
pub struct Stamper {
    settings: StampSettings,
    font: StampFont,
}

impl Stamper {
    pub fn new(settings: StampSettings, font: StampFont) -> Self {
        Self { settings, font }
    }

    /// 設定ファイルのフォント・dpiで作成
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            StampSettings::from_config(config),
            StampFont::resolve(config.font_path.as_deref()),
        )
    }

    pub fn settings(&self) -> &StampSettings {
        &self.settings
    }

    /// 画像ファイルに時間を標記する
    pub fn stamp(
        &self,
        image_path: &Path,
        time_text: &str,
        width_cm: f64,
        height_cm: f64,
    ) -> Result<StampedImage> {
        let image = load_image(image_path)?;
        let width_px = cm_to_px(width_cm, self.settings.dpi);
        let height_px = cm_to_px(height_cm, self.settings.dpi);
        self.stamp_image(image, time_text, width_px, height_px)
    }

    /// デコード済み画像に時間を標記する
    pub fn stamp_image(
        &self,
        image: DynamicImage,
        time_text: &str,
        width_px: u32,
        height_px: u32,
    ) -> Result<StampedImage> {
        if width_px == 0 || height_px == 0 {
            return Err(ReportError::Config(format!(
                "標記サイズが0pxになります: {}x{}",
                width_px, height_px
            )));
        }

        let resized = image.resize_exact(width_px, height_px, FilterType::Lanczos3);
        // JPEGは透過非対応なのでアルファは捨てる
        let mut canvas = resized.to_rgb8();
        self.burn_text(&mut canvas, time_text);

        let bytes = encode_jpeg(&canvas, self.settings.jpeg_quality)?;
        Ok(StampedImage {
            bytes,
            width: width_px,
            height: height_px,
        })
    }

    /// 右下に文字を描く。描画範囲の右端・下端から余白だけ離す
    pub fn burn_text(&self, canvas: &mut RgbImage, text: &str) -> (i32, i32) {
        let px = self.settings.font_px();
        let margin = self.settings.margin_px();
        let (ink_right, ink_bottom) = self.font.ink_extent(px, text);
        let x = canvas.width() as i32 - margin - ink_right;
        let y = canvas.height() as i32 - margin - ink_bottom;
        self.font.draw(canvas, STAMP_COLOR, x, y, px, text);

        debug!(
            "stamped '{}' at ({}, {}) on {}x{}",
            text,
            x,
            y,
            canvas.width(),
            canvas.height()
        );
        (x, y)
    }
}

/// 画像ファイルを読み込む（拡張子ではなく内容で形式判定）
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    if !path.is_file() {
        return Err(ReportError::FileNotFound(path.display().to_string()));
    }
    let load_err = |source: image::ImageError| ReportError::ImageLoad {
        path: path.display().to_string(),
        source,
    };
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.decode().map_err(load_err)
}

/// RGB画像をJPEGへエンコード
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}
