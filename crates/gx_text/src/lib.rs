//! # GX Text
//!
//! Glyph texture cache and text layout for real-time renderers.
//!
//! ## Features
//!
//! - **Glyph Cache**: rasterize once per character and pixel size, keep the
//!   result in an aligned GPU texture
//! - **Tiled Packing**: bitmap rows are written at the surface's own pitch
//! - **Layout**: width, height, kerning, justification and vertical alignment
//! - **Text Textures**: render a whole string into a single texture
//! - **Pluggable Backends**: any [`render::GraphicsDevice`] and
//!   [`text::Rasterizer`]; a software device and a `fontdue` rasterizer ship
//!   with the crate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gx_text::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TextConfig::load_from_file("text.toml")?;
//!     let mut fonts = FontSystem::from_config(SoftwareDevice::new(), config)?;
//!
//!     let style = TextStyle::JUSTIFY_CENTER | TextStyle::ALIGN_MIDDLE;
//!     fonts.draw(24, 320, 240, "Hello", Color::WHITE, style);
//!
//!     fonts.deinit();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;
pub mod text;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, TextConfig},
        foundation::utf8::{decode_utf8, Utf8DecodeError},
        render::{Color, GraphicsDevice, SoftwareDevice, TextureHandle, TexturedQuad},
        text::{
            FontError, FontInstance, FontSystem, FontdueRasterizer, GlyphRecord, LayoutExtent,
            RasterService, Rasterizer, TextStyle, TextTexture,
        },
    };
}
