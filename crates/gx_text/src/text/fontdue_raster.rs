//! Rasterizer backed by `fontdue`
//!
//! Pure Rust TrueType/OpenType rasterization. fontdue reports metrics in
//! floating point pixels with y pointing up; they are converted to the 26.6
//! fixed point the [`Rasterizer`] interface uses.

use fontdue::{Font, FontSettings};

use super::raster::{
    Bitmap, GlyphFormat, GlyphMetrics, RasterError, RasterResult, Rasterizer, RenderedGlyph,
    SizeMetrics,
};
use crate::foundation::fixed::from_f32;

/// fontdue font plus the single glyph slot
pub struct FontdueRasterizer {
    font: Font,
    pixel_size: u32,
    /// `(code, glyph_index)` sorted by code
    charmap: Vec<(u32, u32)>,
    kerning: bool,
    slot: Vec<u8>,
}

impl std::fmt::Debug for FontdueRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueRasterizer")
            .field("pixel_size", &self.pixel_size)
            .field("glyphs", &self.charmap.len())
            .field("kerning", &self.kerning)
            .finish_non_exhaustive()
    }
}

impl FontdueRasterizer {
    /// Parse a TrueType/OpenType face from memory
    pub fn from_bytes(font_data: &[u8], pixel_size: u32) -> RasterResult<Self> {
        let scale = pixel_size.max(1) as f32;
        let settings = FontSettings {
            scale,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(font_data, settings)
            .map_err(|e| RasterError::InvalidFont(format!("fontdue error: {e}")))?;

        let mut charmap: Vec<(u32, u32)> = font
            .chars()
            .iter()
            .map(|(ch, index)| (u32::from(*ch), u32::from(index.get())))
            .collect();
        charmap.sort_unstable_by_key(|&(code, _)| code);

        let sample = kerning_sample(&charmap);
        let kerning = has_kern_pairs(&sample, |left, right| {
            font.horizontal_kern_indexed(left, right, scale)
        });

        log::info!(
            "Loaded font face with {} mapped characters (kerning: {})",
            charmap.len(),
            kerning
        );

        Ok(Self {
            font,
            pixel_size,
            charmap,
            kerning,
            slot: Vec::new(),
        })
    }

    fn px(&self) -> f32 {
        self.pixel_size as f32
    }
}

/// Glyphs checked for kern pairs: printable ASCII, or the first mapped
/// glyphs when the face has none of those
fn kerning_sample(charmap: &[(u32, u32)]) -> Vec<u16> {
    const FALLBACK: usize = 96;

    let indices = |entries: &[(u32, u32)]| -> Vec<u16> {
        entries
            .iter()
            .filter_map(|&(_, index)| u16::try_from(index).ok())
            .filter(|&index| index != 0)
            .collect()
    };

    let start = charmap.partition_point(|&(code, _)| code < 0x20);
    let end = charmap.partition_point(|&(code, _)| code <= 0x7E);
    let ascii = indices(&charmap[start..end]);
    if ascii.is_empty() {
        indices(&charmap[..charmap.len().min(FALLBACK)])
    } else {
        ascii
    }
}

/// Whether any ordered pair of `glyphs` has a kerning entry
///
/// fontdue answers `None` both for faces without kerning data and for pairs
/// the face does not list, so the face counts as kerned once any pair is found.
fn has_kern_pairs(glyphs: &[u16], lookup: impl Fn(u16, u16) -> Option<f32>) -> bool {
    glyphs
        .iter()
        .any(|&left| glyphs.iter().any(|&right| lookup(left, right).is_some()))
}

impl Rasterizer for FontdueRasterizer {
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
        self.font
            .horizontal_line_metrics(self.px())
            .map(|m| SizeMetrics {
                ascender: from_f32(m.ascent),
                descender: from_f32(m.descent),
            })
            .unwrap_or_default()
    }

    fn char_index(&self, code: u32) -> u32 {
        char::from_u32(code).map_or(0, |ch| u32::from(self.font.lookup_glyph_index(ch)))
    }

    fn load_glyph(&mut self, code: u32) -> RasterResult<RenderedGlyph<'_>> {
        let ch = char::from_u32(code).ok_or(RasterError::InvalidCharCode(code))?;
        let index = self.font.lookup_glyph_index(ch);

        let (metrics, bitmap) = self.font.rasterize_indexed(index, self.px());
        self.slot = bitmap;

        let bitmap_top = metrics.ymin + metrics.height as i32;
        Ok(RenderedGlyph {
            glyph_index: u32::from(index),
            format: GlyphFormat::Bitmap,
            bitmap: Bitmap {
                width: metrics.width as u32,
                rows: metrics.height as u32,
                pitch: metrics.width as u32,
                buffer: &self.slot,
            },
            bitmap_left: metrics.xmin,
            bitmap_top,
            advance_x: from_f32(metrics.advance_width),
            metrics: GlyphMetrics {
                width: from_f32(metrics.bounds.width),
                height: from_f32(metrics.bounds.height),
                hori_bearing_x: from_f32(metrics.bounds.xmin),
                hori_bearing_y: from_f32(metrics.bounds.ymin + metrics.bounds.height),
                hori_advance: from_f32(metrics.advance_width),
            },
        })
    }

    fn kerning(&self, left: u32, right: u32) -> (i32, i32) {
        let (Ok(left), Ok(right)) = (u16::try_from(left), u16::try_from(right)) else {
            return (0, 0);
        };
        let dx = self
            .font
            .horizontal_kern_indexed(left, right, self.px())
            .map_or(0, from_f32);
        (dx, 0)
    }

    fn first_char(&self) -> (u32, u32) {
        self.charmap.first().copied().unwrap_or((0, 0))
    }

    fn next_char(&self, code: u32) -> (u32, u32) {
        let next = self.charmap.partition_point(|&(c, _)| c <= code);
        self.charmap.get(next).copied().unwrap_or((0, 0))
    }
}
