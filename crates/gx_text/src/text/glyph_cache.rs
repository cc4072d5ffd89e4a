//! Per-size glyph cache
//!
//! A [`FontInstance`] maps character codes to [`GlyphRecord`]s for one pixel
//! size. Glyphs are rasterized on first use and uploaded into their own
//! aligned texture; later lookups return the stored record without touching
//! the rasterizer.
//!
//! The instance owns every glyph texture. They are released when a glyph is
//! re-cached, on [`FontInstance::unload`], or on [`FontInstance::destroy`].
//! Textures cannot be released from `Drop` because the device is not owned
//! here, so dropping a loaded instance logs the leak.

use std::collections::HashMap;
use std::sync::Arc;

use super::packer;
use super::raster::{GlyphFormat, GlyphMetrics, RasterService, RasterSession};
use crate::config::DEFAULT_TEXTURE_ALIGNMENT;
use crate::foundation::fixed::to_pixels;
use crate::render::device::{GraphicsDevice, OwnedTexture};

/// Cached glyph metrics and texture
#[derive(Debug, PartialEq, Eq)]
pub struct GlyphRecord {
    /// Character code this record is keyed by
    pub char_code: u32,
    /// Glyph index inside the face
    pub glyph_index: u32,
    /// Origin to bitmap left edge, pixels
    pub bitmap_left: i32,
    /// Horizontal advance, whole pixels
    pub advance_x: i32,
    /// Bitmap width, pixels
    pub texture_width: u32,
    /// Bitmap height, pixels
    pub texture_height: u32,
    /// Extent above the baseline (`bitmap_top`)
    pub render_offset_max: i32,
    /// Extent below the baseline (`rows - bitmap_top`)
    pub render_offset_min: i32,
    /// Horizontal draw offset
    pub render_offset_x: i32,
    /// Vertical draw offset (`bitmap_top`)
    pub render_offset_y: i32,
    /// Rasterizer metrics, 26.6
    pub metrics: GlyphMetrics,
    texture: Option<OwnedTexture>,
}

impl GlyphRecord {
    /// Texture holding the glyph, `None` for blank glyphs such as spaces
    pub const fn texture(&self) -> Option<&OwnedTexture> {
        self.texture.as_ref()
    }

    /// Baseline to top edge in whole pixels
    pub const fn vertical_bearing(&self) -> i32 {
        to_pixels(self.metrics.hori_bearing_y)
    }

    fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        if let Some(texture) = self.texture {
            texture.release(device);
        }
    }
}

/// Glyph cache and text operations for one pixel size
#[derive(Debug)]
pub struct FontInstance {
    pub(crate) raster: Arc<RasterService>,
    pub(crate) pixel_size: u32,
    pub(crate) kerning_enabled: bool,
    pub(crate) vertex_format: u8,
    pub(crate) texture_alignment: u32,
    glyphs: HashMap<u32, GlyphRecord>,
}

impl FontInstance {
    /// Create an empty cache for `pixel_size`
    ///
    /// Kerning is enabled when the face supports it.
    pub fn new(raster: Arc<RasterService>, pixel_size: u32) -> Self {
        let kerning_enabled = match raster.session(pixel_size) {
            Ok(session) => session.has_kerning(),
            Err(e) => {
                log::warn!("Rasterizer unavailable while creating {}px font: {}", pixel_size, e);
                false
            }
        };

        log::info!("Created {}px font instance (kerning: {})", pixel_size, kerning_enabled);

        Self {
            raster,
            pixel_size,
            kerning_enabled,
            vertex_format: 1,
            texture_alignment: DEFAULT_TEXTURE_ALIGNMENT,
            glyphs: HashMap::new(),
        }
    }

    /// Select the vertex format passed through to quad draws
    #[must_use]
    pub const fn with_vertex_format(mut self, vertex_format: u8) -> Self {
        self.vertex_format = vertex_format;
        self
    }

    /// Round glyph textures up to `alignment` (a power of two)
    #[must_use]
    pub fn with_texture_alignment(mut self, alignment: u32) -> Self {
        debug_assert!(alignment.is_power_of_two(), "texture alignment must be a power of two");
        self.texture_alignment = alignment;
        self
    }

    /// Turn kerning off even if the face supports it
    #[must_use]
    pub const fn with_kerning(mut self, enabled: bool) -> Self {
        self.kerning_enabled = self.kerning_enabled && enabled;
        self
    }

    /// Pixel size of this instance
    pub const fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Whether pair kerning is applied
    pub const fn kerning_enabled(&self) -> bool {
        self.kerning_enabled
    }

    /// Vertex format selector
    pub const fn vertex_format(&self) -> u8 {
        self.vertex_format
    }

    /// Number of cached glyphs
    pub fn cached_glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Cached record for `code`, without caching on a miss
    pub fn cached_glyph(&self, code: u32) -> Option<&GlyphRecord> {
        self.glyphs.get(&code)
    }

    /// Record for `code`, rasterizing it on a miss
    pub fn glyph<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, code: u32) -> Option<&GlyphRecord> {
        let raster = Arc::clone(&self.raster);
        let mut session = self.open_session(&raster)?;
        self.resolve(&mut session, device, code)
    }

    /// Rasterize `code` and (re)place its record
    ///
    /// Any texture previously cached for `code` is destroyed first.
    pub fn cache_glyph<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, code: u32) -> Option<&GlyphRecord> {
        let raster = Arc::clone(&self.raster);
        let mut session = self.open_session(&raster)?;
        self.cache_with(&mut session, device, code)
    }

    /// Cache every character the face maps, returning how many succeeded
    pub fn cache_all<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) -> usize {
        let raster = Arc::clone(&self.raster);
        let Some(mut session) = self.open_session(&raster) else {
            return 0;
        };

        let codes: Vec<u32> = session.char_codes().map(|(code, _)| code).collect();
        let mut cached = 0;
        for code in codes {
            if self.cache_with(&mut session, device, code).is_some() {
                cached += 1;
            }
        }

        log::info!("Precached {} glyphs at {}px", cached, self.pixel_size);
        cached
    }

    /// Release every glyph texture and empty the cache
    pub fn unload<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D) {
        if self.glyphs.is_empty() {
            return;
        }
        let count = self.glyphs.len();
        for (_, record) in self.glyphs.drain() {
            record.release(device);
        }
        log::debug!("Unloaded {} glyphs at {}px", count, self.pixel_size);
    }

    /// Unload and consume the instance
    pub fn destroy<D: GraphicsDevice + ?Sized>(mut self, device: &mut D) {
        self.unload(device);
        log::info!("Destroyed {}px font instance", self.pixel_size);
    }

    pub(crate) fn open_session<'r>(&self, raster: &'r RasterService) -> Option<RasterSession<'r>> {
        match raster.session(self.pixel_size) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Rasterizer unavailable: {}", e);
                None
            }
        }
    }

    /// Cache hit or rasterize
    pub(crate) fn resolve<D: GraphicsDevice + ?Sized>(
        &mut self,
        session: &mut RasterSession<'_>,
        device: &mut D,
        code: u32,
    ) -> Option<&GlyphRecord> {
        if self.glyphs.contains_key(&code) {
            return self.glyphs.get(&code);
        }
        self.cache_with(session, device, code)
    }

    fn cache_with<D: GraphicsDevice + ?Sized>(
        &mut self,
        session: &mut RasterSession<'_>,
        device: &mut D,
        code: u32,
    ) -> Option<&GlyphRecord> {
        let glyph = match session.load_glyph(code) {
            Ok(glyph) => glyph,
            Err(e) => {
                log::debug!("Cannot cache U+{:04X} at {}px: {}", code, self.pixel_size, e);
                return None;
            }
        };
        if glyph.format != GlyphFormat::Bitmap {
            log::debug!("Skipping U+{:04X}: glyph format {:?} is not a bitmap", code, glyph.format);
            return None;
        }

        if let Some(previous) = self.glyphs.remove(&code) {
            previous.release(device);
        }

        // The slot is consumed here; nothing below borrows it
        let texture = match packer::upload_bitmap(device, &glyph.bitmap, self.texture_alignment) {
            Ok(texture) => texture,
            Err(e) => {
                log::debug!("Texture upload for U+{:04X} failed: {}", code, e);
                return None;
            }
        };

        let record = GlyphRecord {
            char_code: code,
            glyph_index: glyph.glyph_index,
            bitmap_left: glyph.bitmap_left,
            advance_x: to_pixels(glyph.advance_x),
            texture_width: glyph.bitmap.width,
            texture_height: glyph.bitmap.rows,
            render_offset_max: glyph.bitmap_top,
            render_offset_min: glyph.bitmap.rows as i32 - glyph.bitmap_top,
            render_offset_x: glyph.bitmap_left,
            render_offset_y: glyph.bitmap_top,
            metrics: glyph.metrics,
            texture,
        };

        self.glyphs.insert(code, record);
        self.glyphs.get(&code)
    }
}

impl Drop for FontInstance {
    fn drop(&mut self) {
        let owned = self.glyphs.values().filter(|g| g.texture.is_some()).count();
        if owned > 0 {
            log::warn!(
                "{}px font instance dropped with {} live glyph textures; call unload() or destroy() first",
                self.pixel_size,
                owned
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::software::SoftwareDevice;
    use crate::text::testing::{SyntheticRasterizer, OUTLINE_ONLY};
    use std::sync::atomic::Ordering;

    fn setup(pixel_size: u32) -> (FontInstance, SoftwareDevice, Arc<std::sync::atomic::AtomicUsize>) {
        let raster = SyntheticRasterizer::new();
        let loads = raster.load_counter();
        let font = FontInstance::new(Arc::new(RasterService::new(raster)), pixel_size);
        (font, SoftwareDevice::new(), loads)
    }

    #[test]
    fn test_cache_glyph_a_at_24px() {
        let (mut font, mut device, _) = setup(24);
        let record = font.glyph(&mut device, u32::from('A')).unwrap();

        assert!(record.texture().is_some());
        assert!(record.advance_x > 0);
        assert!(record.render_offset_max >= record.render_offset_min);
        assert_eq!(record.advance_x, SyntheticRasterizer::expected_advance(u32::from('A'), 24));
        font.destroy(&mut device);
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_record_fields_follow_bitmap() {
        let (mut font, mut device, _) = setup(24);
        let code = u32::from('g');
        let (width, rows, top, left, _) = SyntheticRasterizer::shape(code, 24);
        let record = font.glyph(&mut device, code).unwrap();

        assert_eq!(record.texture_width, width);
        assert_eq!(record.texture_height, rows);
        assert_eq!(record.render_offset_max, top);
        assert_eq!(record.render_offset_min, rows as i32 - top);
        assert_eq!(record.bitmap_left, left);
        assert_eq!(record.render_offset_x, left);
        assert_eq!(record.vertical_bearing(), top);

        let texture = record.texture().unwrap();
        assert_eq!((texture.width(), texture.height()), (32, 32));
        let image = device.texture_to_image(texture.handle()).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [SyntheticRasterizer::texel(code, 0, 0)]);
        assert_eq!(image.get_pixel(width - 1, rows - 1).0, [SyntheticRasterizer::texel(code, width - 1, rows - 1)]);
        // Source row padding must not bleed into the texture
        assert_eq!(image.get_pixel(width, 0).0, [0]);
        font.destroy(&mut device);
    }

    #[test]
    fn test_cache_hit_does_not_rasterize() {
        let (mut font, mut device, loads) = setup(24);
        font.glyph(&mut device, u32::from('x')).unwrap();
        font.glyph(&mut device, u32::from('x')).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(device.stats().created, 1);
        font.destroy(&mut device);
    }

    #[test]
    fn test_recache_replaces_texture() {
        let (mut font, mut device, _) = setup(24);
        let code = u32::from('Q');

        let (first_handle, first_advance, first_max, first_min) = {
            let r = font.cache_glyph(&mut device, code).unwrap();
            (r.texture().unwrap().handle(), r.advance_x, r.render_offset_max, r.render_offset_min)
        };
        let second = font.cache_glyph(&mut device, code).unwrap();

        assert_ne!(second.texture().unwrap().handle(), first_handle);
        assert_eq!(second.advance_x, first_advance);
        assert_eq!(second.render_offset_max, first_max);
        assert_eq!(second.render_offset_min, first_min);
        assert!(!device.is_live(first_handle));
        assert_eq!(device.live_texture_count(), 1);
        font.destroy(&mut device);
    }

    #[test]
    fn test_space_has_no_texture() {
        let (mut font, mut device, _) = setup(24);
        let record = font.glyph(&mut device, u32::from(' ')).unwrap();

        assert!(record.texture().is_none());
        assert!(record.advance_x > 0);
        assert_eq!(device.stats().created, 0);
        font.destroy(&mut device);
    }

    #[test]
    fn test_unsupported_glyphs_are_not_cached() {
        let (mut font, mut device, _) = setup(24);

        assert!(font.glyph(&mut device, OUTLINE_ONLY).is_none());
        assert!(font.glyph(&mut device, 0x4E2D).is_none());
        assert_eq!(font.cached_glyph_count(), 0);
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_allocation_failure_skips_glyph() {
        let (mut font, mut device, _) = setup(24);
        device.set_memory_budget(Some(0));

        assert!(font.glyph(&mut device, u32::from('A')).is_none());
        assert!(font.cached_glyph(u32::from('A')).is_none());

        device.set_memory_budget(None);
        assert!(font.glyph(&mut device, u32::from('A')).is_some());
        font.destroy(&mut device);
    }

    #[test]
    fn test_cache_all_counts_printable_ascii() {
        let (mut font, mut device, _) = setup(16);
        let cached = font.cache_all(&mut device);

        assert_eq!(cached, 0x7E - 0x20 + 1);
        assert_eq!(font.cached_glyph_count(), cached);
        // Every glyph except the space owns a texture
        assert_eq!(device.live_texture_count(), cached - 1);

        font.unload(&mut device);
        assert_eq!(font.cached_glyph_count(), 0);
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_instances_keep_their_own_size() {
        let service = Arc::new(RasterService::new(SyntheticRasterizer::new()));
        let mut device = SoftwareDevice::new();
        let mut small = FontInstance::new(Arc::clone(&service), 12);
        let mut large = FontInstance::new(Arc::clone(&service), 36);
        let code = u32::from('m');

        let small_advance = small.glyph(&mut device, code).unwrap().advance_x;
        let large_advance = large.glyph(&mut device, code).unwrap().advance_x;
        // Interleave to make sure the shared slot is re-sized every time
        let small_again = small.cache_glyph(&mut device, code).unwrap().advance_x;

        assert_eq!(small_advance, SyntheticRasterizer::expected_advance(code, 12));
        assert_eq!(large_advance, SyntheticRasterizer::expected_advance(code, 36));
        assert_eq!(small_again, small_advance);

        small.destroy(&mut device);
        large.destroy(&mut device);
        assert_eq!(device.live_texture_count(), 0);
    }
}
