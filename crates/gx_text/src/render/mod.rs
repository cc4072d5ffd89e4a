//! Rendering primitives consumed by the text system
//!
//! - [`device`]: the graphics device seam, texture ownership helpers
//! - [`software`]: an in-memory device for tests and offline rendering

pub mod device;
pub mod software;

pub use device::{
    align_up, create_aligned_texture, with_locked_surface, AddressMode, Color, DeviceError,
    DeviceResult, GraphicsDevice, LockRegion, LockedSurface, OwnedTexture, TextureDesc,
    TextureFormat, TextureGuard, TextureHandle, TexturedQuad,
};
pub use software::{DeviceStats, SoftTextureInfo, SoftwareDevice, SurfaceLayout};
