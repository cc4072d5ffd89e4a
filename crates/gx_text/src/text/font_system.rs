//! Font system lifecycle and the per-size instance registry
//!
//! [`FontSystem`] owns the graphics device, the shared rasterizer and one
//! optional [`FontInstance`] per pixel size in `0..=max_font_size`. Instances
//! are created on first use. Clearing the registry, deinitializing, or
//! dropping the system destroys every instance together with its textures.

use std::sync::Arc;

use super::fontdue_raster::FontdueRasterizer;
use super::glyph_cache::FontInstance;
use super::layout::LayoutExtent;
use super::raster::{RasterError, RasterService, Rasterizer};
use super::style::TextStyle;
use super::text_texture::TextTexture;
use crate::config::{ConfigError, TextConfig};
use crate::render::device::{Color, GraphicsDevice};

/// Result type for font system lifecycle operations
pub type FontResult<T> = Result<T, FontError>;

/// Errors from loading fonts and configuring the font system
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// The rasterizer rejected the font or its slot is unusable
    #[error("Rasterizer error: {0}")]
    Raster(#[from] RasterError),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The font file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pixel size outside the registry
    #[error("Pixel size {size} outside 1..={max}")]
    SizeOutOfRange {
        /// Requested size
        size: u32,
        /// Largest registered size
        max: u32,
    },

    /// The system was deinitialized
    #[error("Font system is not initialized")]
    NotInitialized,
}

/// Registry of font instances sharing one rasterizer and one device
pub struct FontSystem<D: GraphicsDevice> {
    device: D,
    raster: Option<Arc<RasterService>>,
    fonts: Vec<Option<FontInstance>>,
    current_size: u32,
    config: TextConfig,
}

impl<D: GraphicsDevice> std::fmt::Debug for FontSystem<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSystem")
            .field("initialized", &self.raster.is_some())
            .field("current_size", &self.current_size)
            .field("loaded_sizes", &self.loaded_sizes())
            .finish_non_exhaustive()
    }
}

impl<D: GraphicsDevice> FontSystem<D> {
    /// Load a TrueType/OpenType face from memory
    pub fn init(font_data: &[u8], device: D, config: TextConfig) -> FontResult<Self> {
        config.validate()?;
        let rasterizer = FontdueRasterizer::from_bytes(font_data, config.default_pixel_size)?;
        Self::with_rasterizer(rasterizer, device, config)
    }

    /// Load the face named by `config.font_path`
    pub fn from_config(device: D, config: TextConfig) -> FontResult<Self> {
        let font_data = std::fs::read(&config.font_path)?;
        log::info!("Read {} bytes of font data from {}", font_data.len(), config.font_path.display());
        Self::init(&font_data, device, config)
    }

    /// Build the system around an existing rasterizer
    pub fn with_rasterizer(
        rasterizer: impl Rasterizer + 'static,
        device: D,
        config: TextConfig,
    ) -> FontResult<Self> {
        config.validate()?;

        let raster = Arc::new(RasterService::new(rasterizer));
        raster.set_pixel_size(config.default_pixel_size)?;

        let mut fonts = Vec::new();
        fonts.resize_with(config.max_font_size as usize + 1, || None);

        log::info!(
            "Font system initialized (default size {}px, sizes up to {}px)",
            config.default_pixel_size,
            config.max_font_size
        );

        Ok(Self {
            device,
            raster: Some(raster),
            fonts,
            current_size: config.default_pixel_size,
            config,
        })
    }

    /// Destroy every instance and drop the rasterizer
    pub fn deinit(&mut self) {
        self.clear_font_data();
        if self.raster.take().is_some() {
            log::info!("Font system deinitialized");
        }
    }

    /// Whether a rasterizer is loaded
    pub const fn is_initialized(&self) -> bool {
        self.raster.is_some()
    }

    /// Make `pixel_size` the current size
    ///
    /// [`Self::current_font`] resolves to this size afterwards. The
    /// rasterizer is switched to it as well; instances still apply their own
    /// size whenever they rasterize.
    pub fn change_font_size(&mut self, pixel_size: u32) -> FontResult<()> {
        self.check_size(pixel_size)?;
        let raster = self.raster.as_ref().ok_or(FontError::NotInitialized)?;
        raster.set_pixel_size(pixel_size)?;
        self.current_size = pixel_size;
        Ok(())
    }

    /// Size selected by the last successful [`Self::change_font_size`],
    /// initially `default_pixel_size`
    pub const fn current_font_size(&self) -> u32 {
        self.current_size
    }

    /// Instance for the current size, creating it on first use
    pub fn current_font(&mut self) -> Option<&mut FontInstance> {
        self.font(self.current_size)
    }

    /// Destroy every registered instance and its textures
    pub fn clear_font_data(&mut self) {
        let mut destroyed = 0;
        for slot in &mut self.fonts {
            if let Some(font) = slot.take() {
                font.destroy(&mut self.device);
                destroyed += 1;
            }
        }
        if destroyed > 0 {
            log::info!("Cleared {} font instances", destroyed);
        }
    }

    /// Destroy the instance for `pixel_size`, if any
    pub fn destroy_font(&mut self, pixel_size: u32) {
        let Some(index) = self.index_of(pixel_size) else {
            return;
        };
        if let Some(font) = self.fonts[index].take() {
            font.destroy(&mut self.device);
        }
    }

    /// Instance for `pixel_size`, creating it on first use
    pub fn font(&mut self, pixel_size: u32) -> Option<&mut FontInstance> {
        self.font_and_device(pixel_size).map(|(font, _)| font)
    }

    /// Instance for `pixel_size` together with the device it draws on
    pub fn font_and_device(&mut self, pixel_size: u32) -> Option<(&mut FontInstance, &mut D)> {
        let index = self.index_of(pixel_size)?;
        if self.fonts[index].is_none() {
            let font = self.create_instance(pixel_size)?;
            self.fonts[index] = Some(font);
        }
        let font = self.fonts[index].as_mut()?;
        Some((font, &mut self.device))
    }

    /// Sizes that currently have an instance
    pub fn loaded_sizes(&self) -> Vec<u32> {
        self.fonts
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(size, _)| size as u32)
            .collect()
    }

    /// Cache one glyph at `pixel_size`
    pub fn cache_glyph(&mut self, pixel_size: u32, code: u32) -> bool {
        self.font_and_device(pixel_size)
            .is_some_and(|(font, device)| font.cache_glyph(device, code).is_some())
    }

    /// Cache every glyph of the face at `pixel_size`
    pub fn cache_all(&mut self, pixel_size: u32) -> usize {
        self.font_and_device(pixel_size)
            .map_or(0, |(font, device)| font.cache_all(device))
    }

    /// Draw `text` at `pixel_size`; see [`FontInstance::draw`]
    pub fn draw(&mut self, pixel_size: u32, x: i32, y: i32, text: &str, color: Color, style: TextStyle) -> usize {
        self.font_and_device(pixel_size)
            .map_or(0, |(font, device)| font.draw(device, x, y, text, color, style))
    }

    /// Width of `text` at `pixel_size`
    pub fn measure_width(&mut self, pixel_size: u32, text: &str) -> i32 {
        self.font_and_device(pixel_size)
            .map_or(0, |(font, device)| font.measure_width(device, text))
    }

    /// Height of `text` at `pixel_size`
    pub fn measure_height(&mut self, pixel_size: u32, text: &str) -> i32 {
        self.font_and_device(pixel_size)
            .map_or(0, |(font, device)| font.measure_height(device, text))
    }

    /// Vertical extent of `text` at `pixel_size`
    pub fn measure_extent(&mut self, pixel_size: u32, text: &str) -> LayoutExtent {
        self.font_and_device(pixel_size)
            .map(|(font, device)| font.measure_extent(device, text))
            .unwrap_or_default()
    }

    /// Render `text` into one texture at `pixel_size`
    ///
    /// The caller owns the result and must release it on [`Self::device_mut`].
    pub fn build_text_texture(
        &mut self,
        pixel_size: u32,
        text: &str,
        color: Color,
        style: TextStyle,
    ) -> Option<TextTexture> {
        let (font, device) = self.font_and_device(pixel_size)?;
        font.build_text_texture(device, text, color, style)
    }

    /// Active configuration
    pub const fn config(&self) -> &TextConfig {
        &self.config
    }

    /// Graphics device
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Graphics device, mutably
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn check_size(&self, pixel_size: u32) -> FontResult<()> {
        if pixel_size == 0 || pixel_size > self.config.max_font_size {
            return Err(FontError::SizeOutOfRange {
                size: pixel_size,
                max: self.config.max_font_size,
            });
        }
        Ok(())
    }

    fn index_of(&self, pixel_size: u32) -> Option<usize> {
        match self.check_size(pixel_size) {
            Ok(()) => Some(pixel_size as usize),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn create_instance(&mut self, pixel_size: u32) -> Option<FontInstance> {
        let Some(raster) = self.raster.as_ref() else {
            log::warn!("Font size {}px requested before init", pixel_size);
            return None;
        };

        let mut font = FontInstance::new(Arc::clone(raster), pixel_size)
            .with_vertex_format(self.config.vertex_format)
            .with_texture_alignment(self.config.texture_alignment)
            .with_kerning(self.config.kerning);

        if self.config.precache {
            font.cache_all(&mut self.device);
        }
        Some(font)
    }
}

impl<D: GraphicsDevice> Drop for FontSystem<D> {
    fn drop(&mut self) {
        self.clear_font_data();
    }
}
