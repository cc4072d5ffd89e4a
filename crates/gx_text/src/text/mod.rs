//! # Text System
//!
//! Glyph caching and text drawing on top of an outline-font rasterizer.
//!
//! ## Architecture
//!
//! - **Raster**: the rasterizer seam and the mutex-guarded single glyph slot
//! - **Packer**: copies coverage bitmaps into tiled texture surfaces
//! - **Glyph cache**: per-size [`FontInstance`] mapping character codes to
//!   textured [`GlyphRecord`]s
//! - **Layout / renderer**: measurement, justification, alignment and
//!   per-glyph quad draws
//! - **Text texture**: whole-string rendering into one texture
//! - **Font system**: registry of instances indexed by pixel size
//!
//! Every operation takes the graphics device explicitly. Public text
//! operations never fail; characters that cannot be cached are skipped and
//! the cause is logged at debug level.

pub mod font_system;
pub mod fontdue_raster;
pub mod glyph_cache;
pub mod layout;
pub mod packer;
pub mod raster;
pub mod renderer;
pub mod style;
pub mod text_texture;

#[cfg(test)]
pub(crate) mod testing;

pub use font_system::{FontError, FontResult, FontSystem};
pub use fontdue_raster::FontdueRasterizer;
pub use glyph_cache::{FontInstance, GlyphRecord};
pub use layout::{resolve_justification, resolve_vertical_alignment, LayoutExtent};
pub use raster::{
    Bitmap, GlyphFormat, GlyphMetrics, RasterError, RasterResult, RasterService, RasterSession,
    Rasterizer, RenderedGlyph, SizeMetrics,
};
pub use style::{Justify, TextStyle, VerticalAlign};
pub use text_texture::TextTexture;
