//! Text demo application
//!
//! Loads a font, draws a line of text through the glyph cache, renders a
//! second string into a standalone texture, and writes the composited frame
//! to a PNG.
//!
//! Usage: `text_demo [config.toml|config.ron] [output.png]`

use gx_text::foundation::logging;
use gx_text::prelude::*;
use image::Rgba;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 240;
const BACKGROUND: Rgba<u8> = Rgba([16, 16, 24, 255]);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("Failed to write frame: {0}")]
    Image(#[from] image::ImageError),
}

fn load_config(path: Option<&str>) -> Result<TextConfig, DemoError> {
    let config = match path {
        Some(path) => TextConfig::load_from_file(path)?,
        None => TextConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run(config: TextConfig, output: &str) -> Result<(), DemoError> {
    let size = config.default_pixel_size;
    let mut fonts = FontSystem::from_config(SoftwareDevice::new(), config)?;
    fonts.change_font_size(size)?;

    let headline = "The quick brown fox jumps over the lazy dog";
    log::info!(
        "Headline measures {}x{} px at {}px",
        fonts.measure_width(size, headline),
        fonts.measure_height(size, headline),
        size
    );

    let centered = TextStyle::JUSTIFY_CENTER | TextStyle::ALIGN_MIDDLE;
    let cx = (FRAME_WIDTH / 2) as i32;
    let printed = fonts.draw(size, cx, (FRAME_HEIGHT / 3) as i32, headline, Color::WHITE, centered);
    log::info!("Drew {} characters through the glyph cache", printed);

    let caption = fonts.build_text_texture(size, "gx_text", Color::rgba(255, 200, 64, 255), centered);
    if let Some(caption) = &caption {
        caption.draw(fonts.device_mut(), cx, (FRAME_HEIGHT * 2 / 3) as i32);
        log::info!("Caption texture is {}x{} px", caption.width, caption.height);
    } else {
        log::warn!("Caption texture could not be built");
    }

    let frame = fonts.device().compose_rgba(FRAME_WIDTH, FRAME_HEIGHT, BACKGROUND);
    frame.save(output)?;
    log::info!("Wrote {}", output);

    if let Some(caption) = caption {
        caption.release(fonts.device_mut());
    }
    fonts.deinit();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let output = args.get(2).map_or("text_demo.png", String::as_str);

    logging::init_with_level(&config.log_level);
    log::info!("Starting text demo with font {}", config.font_path.display());

    if let Err(e) = run(config, output) {
        log::error!("Text demo failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}
