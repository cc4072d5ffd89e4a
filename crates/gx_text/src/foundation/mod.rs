//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Logging bootstrap
//! - UTF-8 decoding into character codes
//! - 26.6 fixed-point conversions used by the rasterizer interface

pub mod fixed;
pub mod logging;
pub mod utf8;
