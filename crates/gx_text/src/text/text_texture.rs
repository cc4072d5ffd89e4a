//! Whole-string textures
//!
//! Renders a string into one texture instead of one quad per glyph. Glyphs
//! are rasterized straight into the shared surface; the per-glyph cache is
//! only touched by the measurement pass that sizes the texture.
//!
//! Placement here is not the renderer's: each glyph lands at the running sum
//! of the previous glyphs' bearings (`bitmap_left` horizontally, vertical
//! bearing vertically) rather than at a pen position. Multi-character strings
//! therefore do not match [`FontInstance::draw`] output.

use std::sync::Arc;

use super::glyph_cache::FontInstance;
use super::layout::{resolve_justification, resolve_vertical_alignment};
use super::packer;
use super::raster::GlyphFormat;
use super::style::TextStyle;
use crate::foundation::fixed::to_pixels;
use crate::foundation::utf8::str_codes;
use crate::render::device::{
    create_aligned_texture, with_locked_surface, Color, GraphicsDevice, LockRegion, OwnedTexture,
    TexturedQuad,
};

/// A string rendered into a single filtered texture
#[derive(Debug)]
#[must_use = "the texture must be released through TextTexture::release"]
pub struct TextTexture {
    texture: OwnedTexture,
    /// Measured string width, pixels
    pub width: u32,
    /// Measured string height, pixels
    pub height: u32,
    /// Justification offset to apply when drawing
    pub x_offset: i32,
    /// Alignment offset to apply when drawing
    pub y_offset: i32,
    /// Tint requested at build time
    pub color: Color,
    vertex_format: u8,
}

impl TextTexture {
    /// The backing texture
    pub const fn texture(&self) -> &OwnedTexture {
        &self.texture
    }

    /// Draw the texture with the string origin at `(x, y)`
    pub fn draw<D: GraphicsDevice + ?Sized>(&self, device: &mut D, x: i32, y: i32) {
        device.draw_quad(&TexturedQuad {
            texture: self.texture.handle(),
            x: x + self.x_offset,
            y: y + self.y_offset,
            width: self.texture.width(),
            height: self.texture.height(),
            color: self.color,
            filtered: self.texture.filtered(),
            vertex_format: self.vertex_format,
        });
    }

    /// Destroy the texture
    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        self.texture.release(device);
    }
}

impl FontInstance {
    /// Render `text` into a newly allocated texture
    ///
    /// Returns `None` when nothing measurable resolves or the texture cannot
    /// be allocated.
    pub fn build_text_texture<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        text: &str,
        color: Color,
        style: TextStyle,
    ) -> Option<TextTexture> {
        self.build_text_texture_codes(device, &str_codes(text), color, style)
    }

    /// [`build_text_texture`](Self::build_text_texture) over character codes
    pub fn build_text_texture_codes<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        codes: &[u32],
        color: Color,
        style: TextStyle,
    ) -> Option<TextTexture> {
        let raster = Arc::clone(&self.raster);
        let mut session = self.open_session(&raster)?;

        let width = self.width_with(&mut session, device, codes);
        let extent = self.extent_with(&mut session, device, codes);
        let height = extent.height();
        if width <= 0 || height <= 0 {
            log::debug!("Text texture for {} characters has empty extent {}x{}", codes.len(), width, height);
            return None;
        }

        let x_offset = if style.has_justification() { resolve_justification(width, style) } else { 0 };
        let y_offset = if style.has_alignment() { resolve_vertical_alignment(&extent, style) } else { 0 };

        let mut guard =
            match create_aligned_texture(device, width as u32, height as u32, self.texture_alignment, true) {
                Ok(guard) => guard,
                Err(e) => {
                    log::debug!("Text texture allocation failed: {}", e);
                    return None;
                }
            };
        let handle = guard.texture().handle();
        if let Err(e) = with_locked_surface(guard.device(), handle, None, |surface| surface.clear()) {
            log::debug!("Cannot clear text texture: {}", e);
            return None;
        }

        let mut offset_x = 0;
        let mut offset_y = 0;
        for &code in codes {
            let glyph = match session.load_glyph(code) {
                Ok(glyph) if glyph.format == GlyphFormat::Bitmap => glyph,
                Ok(glyph) => {
                    log::debug!("Skipping U+{:04X}: glyph format {:?} is not a bitmap", code, glyph.format);
                    continue;
                }
                Err(e) => {
                    log::debug!("Skipping U+{:04X} in text texture: {}", code, e);
                    continue;
                }
            };

            offset_y += to_pixels(glyph.metrics.hori_bearing_y);
            offset_x += glyph.bitmap_left;

            let region = LockRegion {
                x: offset_x.max(0) as u32,
                y: offset_y.max(0) as u32,
                width: glyph.bitmap.width,
                height: glyph.bitmap.rows,
            };
            let bitmap = glyph.bitmap;
            if let Err(e) = with_locked_surface(guard.device(), handle, Some(region), |surface| {
                packer::blit(&bitmap, surface, offset_x, offset_y);
            }) {
                log::debug!("Cannot write U+{:04X} into text texture: {}", code, e);
                return None;
            }
        }

        log::debug!("Built {}x{} text texture for {} characters", width, height, codes.len());
        Some(TextTexture {
            texture: guard.into_inner(),
            width: width as u32,
            height: height as u32,
            x_offset,
            y_offset,
            color,
            vertex_format: self.vertex_format,
        })
    }
}
