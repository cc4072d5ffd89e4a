//! Rasterizer interface and the shared rasterization slot
//!
//! An outline rasterizer renders one glyph at a time into a single internal
//! slot that the next call overwrites. [`RasterService`] owns the rasterizer
//! behind a mutex: every cache operation opens a [`RasterSession`], which
//! holds the lock and applies the caller's pixel size. A [`RenderedGlyph`]
//! borrows the slot through the session, so it cannot outlive the next
//! `load_glyph` call or leak across sessions.
//!
//! Metrics cross this interface in 26.6 fixed point (see
//! [`foundation::fixed`](crate::foundation::fixed)).

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};

/// Result type for rasterizer operations
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors that can occur while rasterizing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    /// The font data could not be parsed
    #[error("Failed to load font: {0}")]
    InvalidFont(String),

    /// The character code is not a Unicode scalar value
    #[error("Invalid character code U+{0:04X}")]
    InvalidCharCode(u32),

    /// The face has no glyph for this code
    #[error("No glyph for U+{0:04X}")]
    GlyphNotFound(u32),

    /// The rendered glyph is not a bitmap
    #[error("Glyph for U+{code:04X} has unsupported format {format:?}")]
    UnsupportedFormat {
        /// Requested character code
        code: u32,
        /// Format the rasterizer produced
        format: GlyphFormat,
    },

    /// A previous holder of the slot panicked
    #[error("Rasterizer slot poisoned by a panic")]
    SlotPoisoned,
}

/// Representation a glyph was loaded as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphFormat {
    /// Rendered coverage bitmap
    Bitmap,
    /// Unrendered outline
    Outline,
    /// Composite of other glyphs
    Composite,
}

/// 8-bit grayscale coverage bitmap borrowed from the rasterizer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<'a> {
    /// Pixels per row
    pub width: u32,
    /// Number of rows
    pub rows: u32,
    /// Bytes per row in `buffer`, at least `width`
    pub pitch: u32,
    /// `rows * pitch` coverage bytes
    pub buffer: &'a [u8],
}

impl<'a> Bitmap<'a> {
    /// Bitmap with no pixels
    pub const EMPTY: Bitmap<'static> = Bitmap {
        width: 0,
        rows: 0,
        pitch: 0,
        buffer: &[],
    };

    /// True when there is nothing to upload
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.rows == 0
    }

    /// The `width` coverage bytes of row `y`, clipped to the buffer
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = (y as usize * self.pitch as usize).min(self.buffer.len());
        let end = (start + self.width as usize).min(self.buffer.len());
        &self.buffer[start..end]
    }
}

/// Per-glyph metrics in 26.6 fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Outline width
    pub width: i32,
    /// Outline height
    pub height: i32,
    /// Origin to left edge
    pub hori_bearing_x: i32,
    /// Baseline to top edge
    pub hori_bearing_y: i32,
    /// Horizontal advance
    pub hori_advance: i32,
}

/// Face metrics at the current pixel size, 26.6 fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeMetrics {
    /// Maximum extent above the baseline
    pub ascender: i32,
    /// Maximum extent below the baseline (negative)
    pub descender: i32,
}

/// Glyph currently held in the rasterizer slot
#[derive(Debug, Clone, Copy)]
pub struct RenderedGlyph<'a> {
    /// Glyph index inside the face
    pub glyph_index: u32,
    /// What the slot holds
    pub format: GlyphFormat,
    /// Coverage bitmap (valid when `format` is `Bitmap`)
    pub bitmap: Bitmap<'a>,
    /// Origin to bitmap left edge, pixels
    pub bitmap_left: i32,
    /// Baseline to bitmap top edge, pixels (up is positive)
    pub bitmap_top: i32,
    /// Horizontal advance, 26.6
    pub advance_x: i32,
    /// Outline metrics, 26.6
    pub metrics: GlyphMetrics,
}

/// Outline-font rasterization engine
///
/// Implementations hold a single glyph slot that each `load_glyph` call
/// overwrites.
pub trait Rasterizer: Send {
    /// Select the pixel size used by subsequent calls
    fn set_pixel_size(&mut self, pixels: u32);

    /// Currently selected pixel size
    fn pixel_size(&self) -> u32;

    /// Whether the face carries pair kerning data
    fn has_kerning(&self) -> bool;

    /// Face ascender/descender at the current size
    fn size_metrics(&self) -> SizeMetrics;

    /// Glyph index for a character code, 0 when missing
    fn char_index(&self, code: u32) -> u32;

    /// Load and render the glyph for `code` into the slot
    fn load_glyph(&mut self, code: u32) -> RasterResult<RenderedGlyph<'_>>;

    /// Kerning between two glyph indices as a 26.6 `(dx, dy)` vector
    fn kerning(&self, left: u32, right: u32) -> (i32, i32);

    /// First `(code, glyph_index)` of the face charmap; index 0 when empty
    fn first_char(&self) -> (u32, u32);

    /// Next `(code, glyph_index)` after `code`; index 0 terminates
    fn next_char(&self, code: u32) -> (u32, u32);
}

/// Owner of the process-wide rasterizer slot
pub struct RasterService {
    rasterizer: Mutex<Box<dyn Rasterizer>>,
}

impl std::fmt::Debug for RasterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterService").finish_non_exhaustive()
    }
}

impl RasterService {
    /// Take ownership of a rasterizer
    pub fn new(rasterizer: impl Rasterizer + 'static) -> Self {
        Self {
            rasterizer: Mutex::new(Box::new(rasterizer)),
        }
    }

    /// Acquire exclusive use of the slot at `pixel_size`
    pub fn session(&self, pixel_size: u32) -> RasterResult<RasterSession<'_>> {
        let mut guard = self.rasterizer.lock().map_err(|_| RasterError::SlotPoisoned)?;
        if guard.pixel_size() != pixel_size {
            guard.set_pixel_size(pixel_size);
        }
        Ok(RasterSession { guard })
    }

    /// Change the current pixel size without keeping the slot
    pub fn set_pixel_size(&self, pixel_size: u32) -> RasterResult<()> {
        self.session(pixel_size).map(drop)
    }
}

/// Exclusive access to the rasterizer for the duration of one operation
pub struct RasterSession<'a> {
    guard: MutexGuard<'a, Box<dyn Rasterizer>>,
}

impl RasterSession<'_> {
    /// Walk the face charmap as `(code, glyph_index)` pairs
    pub fn char_codes(&self) -> CharCodes<'_> {
        CharCodes {
            rasterizer: &**self.guard,
            next: Some(self.guard.first_char()),
        }
    }
}

impl Deref for RasterSession<'_> {
    type Target = dyn Rasterizer;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for RasterSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

/// Iterator over a face charmap
pub struct CharCodes<'a> {
    rasterizer: &'a dyn Rasterizer,
    next: Option<(u32, u32)>,
}

impl Iterator for CharCodes<'_> {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let (code, index) = self.next?;
        if index == 0 {
            self.next = None;
            return None;
        }
        self.next = Some(self.rasterizer.next_char(code));
        Some((code, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::testing::SyntheticRasterizer;

    #[test]
    fn test_session_applies_pixel_size() {
        let service = RasterService::new(SyntheticRasterizer::new());
        {
            let session = service.session(12).unwrap();
            assert_eq!(session.pixel_size(), 12);
        }
        let session = service.session(36).unwrap();
        assert_eq!(session.pixel_size(), 36);
    }

    #[test]
    fn test_char_codes_enumerates_charmap() {
        let service = RasterService::new(SyntheticRasterizer::new());
        let session = service.session(24).unwrap();
        let codes: Vec<u32> = session.char_codes().map(|(code, _)| code).collect();

        assert_eq!(codes.first(), Some(&0x20));
        assert!(codes.contains(&u32::from('A')));
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert!(session.char_codes().all(|(_, index)| index != 0));
    }

    #[test]
    fn test_bitmap_row_respects_pitch() {
        let buffer = [1, 2, 0, 3, 4, 0];
        let bitmap = Bitmap { width: 2, rows: 2, pitch: 3, buffer: &buffer };
        assert_eq!(bitmap.row(0), &[1, 2]);
        assert_eq!(bitmap.row(1), &[3, 4]);
        assert!(bitmap.row(5).is_empty());
        assert!(Bitmap::EMPTY.is_empty());
    }
}
