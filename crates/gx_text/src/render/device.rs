//! Graphics device abstraction
//!
//! The text system only needs a handful of device primitives: create and
//! destroy a texture, lock its surface for CPU writes, and draw a textured
//! quad with a color tint. Backends implement [`GraphicsDevice`]; the crate
//! ships [`SoftwareDevice`](super::software::SoftwareDevice) for tests and
//! offline rendering.
//!
//! Textures are not reference counted across this boundary. Whoever holds an
//! [`OwnedTexture`] must hand it back through [`OwnedTexture::release`], and
//! allocation paths that can fail halfway use a [`TextureGuard`] so the
//! texture is destroyed on every early return.

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a graphics device
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device could not allocate texture memory
    #[error("Texture allocation failed ({width}x{height}): {reason}")]
    AllocationFailed {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
        /// Backend specific reason
        reason: String,
    },

    /// The handle does not name a live texture
    #[error("Invalid texture handle {0:?}")]
    InvalidHandle(TextureHandle),

    /// The surface is already locked
    #[error("Surface of texture {0:?} is already locked")]
    SurfaceLocked(TextureHandle),

    /// Zero width or height was requested
    #[error("Zero-sized texture requested ({width}x{height})")]
    ZeroSized {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
}

/// Handle for a GPU texture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Pixel formats used for text textures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single 8-bit intensity channel; color comes from the draw tint
    L8,
}

impl TextureFormat {
    /// Bytes per texel
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::L8 => 1,
        }
    }
}

/// Texture coordinate addressing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Clamp to edge
    Clamp,
    /// Repeat the texture
    Wrap,
}

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Allocated width in pixels
    pub width: u32,
    /// Allocated height in pixels
    pub height: u32,
    /// Texel format
    pub format: TextureFormat,
    /// Bilinear filtering when sampled
    pub filtering: bool,
    /// Horizontal addressing
    pub address_u: AddressMode,
    /// Vertical addressing
    pub address_v: AddressMode,
}

impl TextureDesc {
    /// Intensity texture with clamp addressing on both axes
    pub const fn intensity(width: u32, height: u32, filtering: bool) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::L8,
            filtering,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
        }
    }
}

/// Rectangle of a surface requested for writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockRegion {
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Width in pixels (0 = to the right edge)
    pub width: u32,
    /// Height in pixels (0 = to the bottom edge)
    pub height: u32,
}

/// CPU view of a locked texture surface
///
/// `wpitch` is the byte stride of one row and `hpitch` the number of rows the
/// device actually allocated. Both may exceed the logical `width`/`height`
/// because of tiling, so `data.len() == wpitch * hpitch`.
#[derive(Debug)]
pub struct LockedSurface<'a> {
    /// Raw surface bytes
    pub data: &'a mut [u8],
    /// Logical width in pixels
    pub width: u32,
    /// Logical height in pixels
    pub height: u32,
    /// Row stride in bytes
    pub wpitch: u32,
    /// Allocated rows
    pub hpitch: u32,
    /// Region the caller asked for
    pub region: LockRegion,
}

impl LockedSurface<'_> {
    /// Total byte extent of the surface
    pub fn byte_len(&self) -> usize {
        self.wpitch as usize * self.hpitch as usize
    }

    /// Zero the whole surface, padding included
    pub fn clear(&mut self) {
        let len = self.byte_len().min(self.data.len());
        self.data[..len].fill(0);
    }
}

/// 8-bit RGBA color tint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgba(0xff, 0xff, 0xff, 0xff);
    /// Opaque black
    pub const BLACK: Self = Self::rgba(0, 0, 0, 0xff);

    /// Create a color from its channels
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One textured quad draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturedQuad {
    /// Texture to sample
    pub texture: TextureHandle,
    /// Screen x of the top-left corner
    pub x: i32,
    /// Screen y of the top-left corner
    pub y: i32,
    /// Quad width in pixels
    pub width: u32,
    /// Quad height in pixels
    pub height: u32,
    /// Tint multiplied with the texture intensity
    pub color: Color,
    /// Sample with filtering
    pub filtered: bool,
    /// Vertex format selector of the issuing font
    pub vertex_format: u8,
}

/// Device primitives consumed by the text system
pub trait GraphicsDevice {
    /// Allocate a texture
    fn create_texture(&mut self, desc: &TextureDesc) -> DeviceResult<TextureHandle>;

    /// Release a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Lock a texture surface for CPU writes
    fn lock_surface(
        &mut self,
        handle: TextureHandle,
        region: Option<LockRegion>,
    ) -> DeviceResult<LockedSurface<'_>>;

    /// Unlock a previously locked surface
    fn unlock_surface(&mut self, handle: TextureHandle);

    /// Issue a textured quad draw
    fn draw_quad(&mut self, quad: &TexturedQuad);
}

/// Lock a surface, run `write`, and unlock it again
pub fn with_locked_surface<D, R>(
    device: &mut D,
    handle: TextureHandle,
    region: Option<LockRegion>,
    write: impl FnOnce(&mut LockedSurface<'_>) -> R,
) -> DeviceResult<R>
where
    D: GraphicsDevice + ?Sized,
{
    let result = {
        let mut surface = device.lock_surface(handle, region)?;
        write(&mut surface)
    };
    device.unlock_surface(handle);
    Ok(result)
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub const fn align_up(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

/// A texture the holder is responsible for releasing
#[derive(Debug, PartialEq, Eq)]
#[must_use = "textures must be released through OwnedTexture::release"]
pub struct OwnedTexture {
    handle: TextureHandle,
    width: u32,
    height: u32,
    filtered: bool,
}

impl OwnedTexture {
    /// Device handle
    pub const fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Allocated width (aligned)
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Allocated height (aligned)
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the texture was created with filtering
    pub const fn filtered(&self) -> bool {
        self.filtered
    }

    /// Destroy the texture on `device`
    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        log::trace!("Releasing texture {:?}", self.handle);
        device.destroy_texture(self.handle);
    }
}

/// Scoped texture allocation
///
/// Destroys the texture on drop unless [`TextureGuard::into_inner`] claimed
/// it, so a failure between allocation and upload never leaks.
pub struct TextureGuard<'d, D: GraphicsDevice + ?Sized> {
    device: &'d mut D,
    texture: OwnedTexture,
    armed: bool,
}

impl<'d, D: GraphicsDevice + ?Sized> TextureGuard<'d, D> {
    /// The guarded texture
    pub const fn texture(&self) -> &OwnedTexture {
        &self.texture
    }

    /// Device the texture lives on
    pub fn device(&mut self) -> &mut D {
        self.device
    }

    /// Keep the texture
    pub fn into_inner(mut self) -> OwnedTexture {
        self.armed = false;
        OwnedTexture {
            handle: self.texture.handle,
            width: self.texture.width,
            height: self.texture.height,
            filtered: self.texture.filtered,
        }
    }
}

impl<D: GraphicsDevice + ?Sized> Drop for TextureGuard<'_, D> {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("Discarding partially initialized texture {:?}", self.texture.handle);
            self.device.destroy_texture(self.texture.handle);
        }
    }
}

/// Allocate an intensity texture whose dimensions are `width`x`height`
/// rounded up to `alignment`
///
/// This is the single place where the hardware alignment is applied.
pub fn create_aligned_texture<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    width: u32,
    height: u32,
    alignment: u32,
    filtering: bool,
) -> DeviceResult<TextureGuard<'_, D>> {
    if width == 0 || height == 0 {
        return Err(DeviceError::ZeroSized { width, height });
    }

    let desc = TextureDesc::intensity(align_up(width, alignment), align_up(height, alignment), filtering);
    let handle = device.create_texture(&desc)?;

    Ok(TextureGuard {
        device,
        texture: OwnedTexture {
            handle,
            width: desc.width,
            height: desc.height,
            filtered: filtering,
        },
        armed: true,
    })
}
