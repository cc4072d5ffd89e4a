//! String measurement
//!
//! Width, height and vertical extent of a string at one font size, plus the
//! justification and alignment offsets derived from them. Measuring caches
//! any glyph it has not seen yet, so measuring before drawing warms the
//! cache for the draw.

use std::sync::Arc;

use super::glyph_cache::FontInstance;
use super::raster::RasterSession;
use super::style::{Justify, TextStyle, VerticalAlign};
use crate::foundation::fixed::to_pixels;
use crate::foundation::utf8::str_codes;
use crate::render::device::GraphicsDevice;

/// Vertical metrics of a string, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutExtent {
    /// Face ascender
    pub ascender: i32,
    /// Face descender (negative below the baseline)
    pub descender: i32,
    /// Largest `render_offset_max` of the string's glyphs
    pub max: i32,
    /// Smallest `render_offset_min` of the string's glyphs
    pub min: i32,
}

impl LayoutExtent {
    /// `max - min`
    pub const fn height(&self) -> i32 {
        self.max - self.min
    }
}

/// Horizontal offset that places a string of `width` pixels per `style`
pub fn resolve_justification(width: i32, style: TextStyle) -> i32 {
    match style.justify() {
        Justify::Left | Justify::None => 0,
        Justify::Center => -(width >> 1),
        Justify::Right => -width,
    }
}

/// Vertical offset that places a string with `extent` per `style`
pub fn resolve_vertical_alignment(extent: &LayoutExtent, style: TextStyle) -> i32 {
    match style.vertical_align() {
        VerticalAlign::Top => extent.ascender,
        VerticalAlign::Middle => (extent.ascender + extent.descender + 1) >> 1,
        VerticalAlign::Bottom => extent.descender,
        VerticalAlign::Baseline => 0,
        VerticalAlign::GlyphTop => extent.max,
        VerticalAlign::GlyphMiddle => (extent.max + extent.min + 1) >> 1,
        VerticalAlign::GlyphBottom => extent.min,
    }
}

/// Horizontal kerning in pixels between two glyph indices
///
/// Zero when kerning is off or there is no previous glyph.
pub(crate) fn kerning_offset(
    session: &RasterSession<'_>,
    enabled: bool,
    previous: Option<u32>,
    current: u32,
) -> i32 {
    match previous {
        Some(previous) if enabled => to_pixels(session.kerning(previous, current).0),
        _ => 0,
    }
}

impl FontInstance {
    /// Width of `text` in pixels, including kerning
    pub fn measure_width<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, text: &str) -> i32 {
        self.measure_width_codes(device, &str_codes(text))
    }

    /// [`measure_width`](Self::measure_width) over character codes
    pub fn measure_width_codes<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, codes: &[u32]) -> i32 {
        let raster = Arc::clone(&self.raster);
        let Some(mut session) = self.open_session(&raster) else {
            return 0;
        };
        self.width_with(&mut session, device, codes)
    }

    /// Vertical extent of `text`
    pub fn measure_extent<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, text: &str) -> LayoutExtent {
        self.measure_extent_codes(device, &str_codes(text))
    }

    /// [`measure_extent`](Self::measure_extent) over character codes
    pub fn measure_extent_codes<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        codes: &[u32],
    ) -> LayoutExtent {
        let raster = Arc::clone(&self.raster);
        let Some(mut session) = self.open_session(&raster) else {
            return LayoutExtent::default();
        };
        self.extent_with(&mut session, device, codes)
    }

    /// Height of `text`: glyph extent maximum minus minimum
    pub fn measure_height<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, text: &str) -> i32 {
        self.measure_extent(device, text).height()
    }

    /// [`measure_height`](Self::measure_height) over character codes
    pub fn measure_height_codes<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, codes: &[u32]) -> i32 {
        self.measure_extent_codes(device, codes).height()
    }

    pub(crate) fn width_with<D: GraphicsDevice + ?Sized>(
        &mut self,
        session: &mut RasterSession<'_>,
        device: &mut D,
        codes: &[u32],
    ) -> i32 {
        let kerning = self.kerning_enabled;
        let mut width = 0;
        let mut previous = None;

        for &code in codes {
            let Some(glyph) = self.resolve(session, device, code) else {
                previous = None;
                continue;
            };
            let (index, advance) = (glyph.glyph_index, glyph.advance_x);

            width += kerning_offset(session, kerning, previous, index) + advance;
            previous = Some(index);
        }
        width
    }

    pub(crate) fn extent_with<D: GraphicsDevice + ?Sized>(
        &mut self,
        session: &mut RasterSession<'_>,
        device: &mut D,
        codes: &[u32],
    ) -> LayoutExtent {
        let mut max = 0;
        let mut min = i32::MAX;

        for &code in codes {
            if let Some(glyph) = self.resolve(session, device, code) {
                max = max.max(glyph.render_offset_max);
                min = min.min(glyph.render_offset_min);
            }
        }

        let size = session.size_metrics();
        LayoutExtent {
            ascender: to_pixels(size.ascender),
            descender: to_pixels(size.descender),
            max,
            min: if min == i32::MAX { 0 } else { min },
        }
    }
}
