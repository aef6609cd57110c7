//! Card Renderer
//!
//! Layout is computed as plain data first, then composited onto an RGB
//! canvas. Glyph rasterization is delegated to a `TextPainter`.

use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::PersonRecord;

pub const BACKGROUND: Rgb<u8> = Rgb([135, 206, 235]);
pub const BORDER: Rgb<u8> = Rgb([255, 255, 255]);
pub const INK: Rgb<u8> = Rgb([0, 0, 0]);

pub const BORDER_THICKNESS: u32 = 3;
pub const PHOTO_SIZE: u32 = 100;
pub const PHOTO_TOP: i32 = 20;
pub const TEXT_LEFT: i32 = 20;
pub const TEXT_TOP: i32 = 140;
pub const LINE_STEP: i32 = 40;
pub const SIGNATURE_INSET: i32 = 140;
pub const SIGNATURE_LENGTH: i32 = 120;
pub const SIGNATURE_RISE: i32 = 30;
pub const CAPTION_DROP: i32 = 20;

const FIELD_SCALE: f32 = 0.7;
const SIGNATURE_SCALE: f32 = 0.5;
const KIND_SCALE: f32 = 0.6;
/// Pixel height of one font-scale unit.
const PX_PER_UNIT: f32 = 30.0;
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("Font error: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}

/// One run of text anchored at its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: i32,
    pub baseline: i32,
    pub scale: f32,
}

impl TextItem {
    fn new(text: impl Into<String>, x: i32, baseline: i32, scale: f32) -> Self {
        Self {
            text: text.into(),
            x,
            baseline,
            scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    /// Top-left corner of the square photo slot.
    pub photo_origin: (i32, i32),
    pub fields: Vec<TextItem>,
    pub signature_line: ((i32, i32), (i32, i32)),
    pub signature_caption: TextItem,
    pub kind_caption: TextItem,
}

impl CardLayout {
    pub fn for_record(record: &PersonRecord) -> Self {
        let kind = record.kind();
        let (width, height) = kind.canvas_size();
        let (w, h) = (width as i32, height as i32);

        let fields = record
            .card_lines()
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                TextItem::new(line, TEXT_LEFT, TEXT_TOP + LINE_STEP * (i as i32 + 1), FIELD_SCALE)
            })
            .collect();

        let sig_x = w - SIGNATURE_INSET;
        let sig_y = h - SIGNATURE_RISE;

        Self {
            width,
            height,
            photo_origin: ((w - PHOTO_SIZE as i32) / 2, PHOTO_TOP),
            fields,
            signature_line: ((sig_x, sig_y), (sig_x + SIGNATURE_LENGTH, sig_y)),
            signature_caption: TextItem::new("Signature", sig_x, sig_y + CAPTION_DROP, SIGNATURE_SCALE),
            kind_caption: TextItem::new(kind.caption(), 10, h - 10, KIND_SCALE),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextItem> {
        self.fields
            .iter()
            .chain([&self.signature_caption, &self.kind_caption])
    }
}

/// Glyph rasterization capability.
pub trait TextPainter {
    fn draw(&self, canvas: &mut RgbImage, item: &TextItem);
}

/// Draws nothing; used when no font is available.
pub struct NoText;

impl TextPainter for NoText {
    fn draw(&self, _canvas: &mut RgbImage, _item: &TextItem) {}
}

pub struct FontPainter {
    font: FontVec,
}

impl FontPainter {
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let data = fs::read(path)?;
        Ok(Self {
            font: FontVec::try_from_vec(data)?,
        })
    }
}

impl TextPainter for FontPainter {
    fn draw(&self, canvas: &mut RgbImage, item: &TextItem) {
        let scale = PxScale::from(item.scale * PX_PER_UNIT);
        let ascent = self.font.as_scaled(scale).ascent();
        let top = item.baseline - ascent.round() as i32;
        draw_text_mut(canvas, INK, item.x, top, scale, &self.font, &item.text);
    }
}

pub struct CardRenderer {
    painter: Box<dyn TextPainter>,
}

impl CardRenderer {
    pub fn new(painter: Box<dyn TextPainter>) -> Self {
        Self { painter }
    }

    /// Composite the card. A photo that cannot be read is left out.
    pub fn render(&self, record: &PersonRecord, photo: Option<&Path>) -> RgbImage {
        let layout = CardLayout::for_record(record);
        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND);

        for inset in 0..BORDER_THICKNESS {
            let rect = Rect::at(inset as i32, inset as i32)
                .of_size(layout.width - 2 * inset, layout.height - 2 * inset);
            draw_hollow_rect_mut(&mut canvas, rect, BORDER);
        }

        if let Some(path) = photo {
            match load_thumbnail(path) {
                Ok(thumb) => {
                    let (x, y) = layout.photo_origin;
                    image::imageops::replace(&mut canvas, &thumb, x as i64, y as i64);
                }
                Err(e) => warn!(photo = %path.display(), error = %e, "photo omitted"),
            }
        }

        let ((x1, y1), (x2, y2)) = layout.signature_line;
        draw_line_segment_mut(&mut canvas, (x1 as f32, y1 as f32), (x2 as f32, y2 as f32), INK);

        for item in layout.texts() {
            self.painter.draw(&mut canvas, item);
        }

        debug!(kind = %record.kind(), width = layout.width, height = layout.height, "card rendered");
        canvas
    }
}

impl Default for CardRenderer {
    fn default() -> Self {
        Self::new(Box::new(NoText))
    }
}

/// Decode an image file and scale it to the square photo slot.
pub fn load_thumbnail(path: &Path) -> Result<RgbImage, RenderError> {
    let src = DynamicImage::ImageRgb8(image::open(path)?.to_rgb8());
    let mut dst = DynamicImage::new(PHOTO_SIZE, PHOTO_SIZE, ColorType::Rgb8);

    let mut resizer = Resizer::new();
    resizer.resize(
        &src,
        &mut dst,
        Some(&ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))),
    )?;

    Ok(dst.to_rgb8())
}

pub fn encode_jpeg(canvas: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(canvas)?;
    Ok(bytes)
}
