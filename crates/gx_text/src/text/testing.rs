//! Deterministic rasterizer for tests
//!
//! Produces procedurally generated glyphs for printable ASCII so cache,
//! layout and rendering can be checked without a font file. Glyph rows are
//! stored with a pitch wider than the glyph to catch pitch/width mix-ups.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::raster::{
    Bitmap, GlyphFormat, GlyphMetrics, RasterError, RasterResult, Rasterizer, RenderedGlyph,
    SizeMetrics,
};
use crate::foundation::fixed::from_pixels;

/// Code that loads as an outline instead of a bitmap
pub const OUTLINE_ONLY: u32 = 0x2603;

/// Extra bytes appended to every bitmap row
pub const PITCH_PADDING: u32 = 3;

/// Kerning between `A` and `V`, pixels
pub const AV_KERNING: i32 = -2;

#[derive(Debug)]
pub struct SyntheticRasterizer {
    pixel_size: u32,
    kerning: bool,
    slot: Vec<u8>,
    loads: Arc<AtomicUsize>,
}

impl SyntheticRasterizer {
    pub fn new() -> Self {
        Self {
            pixel_size: 0,
            kerning: true,
            slot: Vec::new(),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_kerning() -> Self {
        Self { kerning: false, ..Self::new() }
    }

    /// Counter of `load_glyph` calls, shared so tests can read it after the
    /// rasterizer moved into a service
    pub fn load_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }

    fn supported(code: u32) -> bool {
        (0x20..=0x7E).contains(&code) || code == OUTLINE_ONLY
    }

    /// `(width, rows, top, left, advance)` in pixels
    pub fn shape(code: u32, pixel_size: u32) -> (u32, u32, i32, i32, i32) {
        if code == u32::from(' ') {
            return (0, 0, 0, 0, 4 + pixel_size as i32 / 12);
        }
        let width = 6 + code % 5;
        let rows = 8 + code % 7;
        // Every third glyph descends below the baseline
        let top = rows as i32 - (code % 3) as i32;
        let left = (code % 2) as i32;
        let advance = width as i32 + 2 + pixel_size as i32 / 12;
        (width, rows, top, left, advance)
    }

    pub fn expected_advance(code: u32, pixel_size: u32) -> i32 {
        Self::shape(code, pixel_size).4
    }

    pub fn texel(code: u32, x: u32, y: u32) -> u8 {
        ((x * 16 + y * 8 + code) as u8) | 1
    }
}

impl Rasterizer for SyntheticRasterizer {
    fn set_pixel_size(&mut self, pixels: u32) {
        self.pixel_size = pixels;
    }

    fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    fn has_kerning(&self) -> bool {
        self.kerning
    }

    fn size_metrics(&self) -> SizeMetrics {
        let px = self.pixel_size as i32;
        SizeMetrics {
            ascender: from_pixels(px * 4 / 5),
            descender: -from_pixels(px / 5),
        }
    }

    fn char_index(&self, code: u32) -> u32 {
        if Self::supported(code) {
            code - 0x1F
        } else {
            0
        }
    }

    fn load_glyph(&mut self, code: u32) -> RasterResult<RenderedGlyph<'_>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !Self::supported(code) {
            return Err(RasterError::GlyphNotFound(code));
        }

        let (width, rows, top, left, advance) = Self::shape(code, self.pixel_size);
        let pitch = if width == 0 { 0 } else { width + PITCH_PADDING };

        self.slot.clear();
        for y in 0..rows {
            for x in 0..pitch {
                // Padding bytes are deliberately loud
                self.slot.push(if x < width { Self::texel(code, x, y) } else { 0xEE });
            }
        }

        let format = if code == OUTLINE_ONLY {
            GlyphFormat::Outline
        } else {
            GlyphFormat::Bitmap
        };

        Ok(RenderedGlyph {
            glyph_index: self.char_index(code),
            format,
            bitmap: Bitmap {
                width,
                rows,
                pitch,
                buffer: &self.slot,
            },
            bitmap_left: left,
            bitmap_top: top,
            advance_x: from_pixels(advance),
            metrics: GlyphMetrics {
                width: from_pixels(width as i32),
                height: from_pixels(rows as i32),
                hori_bearing_x: from_pixels(left),
                hori_bearing_y: from_pixels(top),
                hori_advance: from_pixels(advance),
            },
        })
    }

    fn kerning(&self, left: u32, right: u32) -> (i32, i32) {
        let a = self.char_index(u32::from('A'));
        let v = self.char_index(u32::from('V'));
        if left == a && right == v {
            (from_pixels(AV_KERNING), 0)
        } else {
            (0, 0)
        }
    }

    fn first_char(&self) -> (u32, u32) {
        (0x20, self.char_index(0x20))
    }

    fn next_char(&self, code: u32) -> (u32, u32) {
        if code < 0x7E {
            (code + 1, self.char_index(code + 1))
        } else {
            (0, 0)
        }
    }
}
