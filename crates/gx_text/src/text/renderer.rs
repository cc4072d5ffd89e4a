//! Per-glyph text drawing

use std::sync::Arc;

use super::glyph_cache::FontInstance;
use super::layout::{kerning_offset, resolve_justification, resolve_vertical_alignment};
use super::style::TextStyle;
use crate::foundation::utf8::str_codes;
use crate::render::device::{Color, GraphicsDevice, TexturedQuad};

impl FontInstance {
    /// Draw `text` with its origin at `(x, y)`, one quad per visible glyph
    ///
    /// Returns the number of characters whose glyph resolved, drawn or not.
    /// Characters that cannot be cached are skipped.
    pub fn draw<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        x: i32,
        y: i32,
        text: &str,
        color: Color,
        style: TextStyle,
    ) -> usize {
        self.draw_codes(device, x, y, &str_codes(text), color, style)
    }

    /// [`draw`](Self::draw) over character codes
    pub fn draw_codes<D: GraphicsDevice + ?Sized>(
        &mut self,
        device: &mut D,
        x: i32,
        y: i32,
        codes: &[u32],
        color: Color,
        style: TextStyle,
    ) -> usize {
        let raster = Arc::clone(&self.raster);
        let Some(mut session) = self.open_session(&raster) else {
            return 0;
        };

        let x_offset = if style.has_justification() {
            resolve_justification(self.width_with(&mut session, device, codes), style)
        } else {
            0
        };
        let y_offset = if style.has_alignment() {
            let extent = self.extent_with(&mut session, device, codes);
            resolve_vertical_alignment(&extent, style)
        } else {
            0
        };

        let kerning = self.kerning_enabled;
        let vertex_format = self.vertex_format;
        let mut x_pos = x;
        let mut previous = None;
        let mut printed = 0;

        for &code in codes {
            let Some(glyph) = self.resolve(&mut session, device, code) else {
                previous = None;
                continue;
            };

            x_pos += kerning_offset(&session, kerning, previous, glyph.glyph_index);

            if let Some(texture) = glyph.texture() {
                device.draw_quad(&TexturedQuad {
                    texture: texture.handle(),
                    x: x_pos + glyph.render_offset_x + x_offset,
                    y: y - glyph.vertical_bearing() + y_offset,
                    width: texture.width(),
                    height: texture.height(),
                    color,
                    filtered: texture.filtered(),
                    vertex_format,
                });
            }

            x_pos += glyph.advance_x;
            previous = Some(glyph.glyph_index);
            printed += 1;
        }

        log::trace!("Drew {} of {} characters at {}px", printed, codes.len(), self.pixel_size);
        printed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::software::SoftwareDevice;
    use crate::text::layout::LayoutExtent;
    use crate::text::raster::RasterService;
    use crate::text::testing::{SyntheticRasterizer, AV_KERNING, OUTLINE_ONLY};
    use image::Rgba;

    fn setup() -> (FontInstance, SoftwareDevice) {
        let font = FontInstance::new(Arc::new(RasterService::new(SyntheticRasterizer::new())), 24);
        (font, SoftwareDevice::new())
    }

    #[test]
    fn test_draw_positions_glyphs_along_baseline() {
        let (mut font, mut device) = setup();
        let printed = font.draw(&mut device, 10, 50, "AV", Color::WHITE, TextStyle::empty());

        assert_eq!(printed, 2);
        let quads = device.draw_calls();
        assert_eq!(quads.len(), 2);

        let (_, _, a_top, a_left, a_advance) = SyntheticRasterizer::shape(u32::from('A'), 24);
        let (_, _, v_top, v_left, _) = SyntheticRasterizer::shape(u32::from('V'), 24);
        assert_eq!((quads[0].x, quads[0].y), (10 + a_left, 50 - a_top));
        assert_eq!((quads[1].x, quads[1].y), (10 + a_advance + AV_KERNING + v_left, 50 - v_top));
        assert_eq!((quads[0].width, quads[0].height), (32, 32));
        assert!(!quads[0].filtered);
        assert_eq!(quads[0].vertex_format, 1);
        font.destroy(&mut device);
    }

    #[test]
    fn test_whitespace_advances_without_drawing() {
        let (mut font, mut device) = setup();
        let printed = font.draw(&mut device, 0, 0, "a b", Color::WHITE, TextStyle::empty());

        assert_eq!(printed, 3);
        assert_eq!(device.draw_calls().len(), 2);

        let (_, _, _, b_left, _) = SyntheticRasterizer::shape(u32::from('b'), 24);
        let expected = SyntheticRasterizer::expected_advance(u32::from('a'), 24)
            + SyntheticRasterizer::expected_advance(u32::from(' '), 24)
            + b_left;
        assert_eq!(device.draw_calls()[1].x, expected);
        font.destroy(&mut device);
    }

    #[test]
    fn test_unresolved_characters_are_not_counted() {
        let (mut font, mut device) = setup();
        let codes = [u32::from('x'), OUTLINE_ONLY, 0x1F600, u32::from('y')];
        let printed = font.draw_codes(&mut device, 0, 0, &codes, Color::WHITE, TextStyle::empty());

        assert_eq!(printed, 2);
        // Every counted character has a cached record
        assert_eq!(font.cached_glyph_count(), printed);
        assert!(font.cached_glyph(OUTLINE_ONLY).is_none());
        font.destroy(&mut device);
    }

    #[test]
    fn test_centered_middle_offsets() {
        let (mut font, mut device) = setup();
        let text = "Centered";
        let width = font.measure_width(&mut device, text);
        let extent: LayoutExtent = font.measure_extent(&mut device, text);

        let style = TextStyle::JUSTIFY_CENTER | TextStyle::ALIGN_MIDDLE;
        font.draw(&mut device, 100, 40, text, Color::WHITE, style);

        let (_, _, c_top, c_left, _) = SyntheticRasterizer::shape(u32::from('C'), 24);
        let first = device.draw_calls()[0];
        assert_eq!(first.x, 100 + c_left - (width >> 1));
        assert_eq!(first.y, 40 - c_top + ((extent.ascender + extent.descender + 1) >> 1));
        font.destroy(&mut device);
    }

    #[test]
    fn test_draw_agrees_with_measured_width() {
        let (mut font, mut device) = setup();
        let text = "WAVE";
        let width = font.measure_width(&mut device, text);

        font.draw(&mut device, 0, 0, text, Color::WHITE, TextStyle::JUSTIFY_RIGHT);
        let last = *device.draw_calls().last().unwrap();
        let (_, _, _, e_left, e_advance) = SyntheticRasterizer::shape(u32::from('E'), 24);

        // The pen ends exactly at the right edge
        assert_eq!(last.x - e_left + e_advance, 0);
        assert!(width > 0);
        font.destroy(&mut device);
    }

    #[test]
    fn test_color_and_frame_composition() {
        let (mut font, mut device) = setup();
        let red = Color::rgba(255, 0, 0, 255);
        font.draw(&mut device, 4, 20, "I", red, TextStyle::empty());

        let quad = device.draw_calls()[0];
        assert_eq!(quad.color, red);
        let frame = device.compose_rgba(64, 64, Rgba([0, 0, 0, 255]));
        let pixel = frame.get_pixel(quad.x as u32, quad.y as u32);
        assert!(pixel.0[0] > 0);
        assert_eq!(pixel.0[1], 0);
        font.destroy(&mut device);
    }
}
