//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Honors `RUST_LOG` when it is set.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default level filter
///
/// `level` is any `env_logger` filter string (`"info"`, `"gx_text=debug"`, ...).
/// `RUST_LOG` still takes precedence. Calling this twice is harmless.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
