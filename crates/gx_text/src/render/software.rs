//! In-memory graphics device
//!
//! Keeps texture surfaces in CPU memory with a configurable tiled pitch,
//! records every quad draw, and can composite the recorded frame into an RGBA
//! image. Used by the demo application and by the test suite.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use slotmap::{DefaultKey, Key, KeyData, SlotMap};

use super::device::{
    align_up, DeviceError, DeviceResult, GraphicsDevice, LockRegion, LockedSurface, TextureDesc,
    TextureHandle, TexturedQuad,
};

/// Surface tiling of the software device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    /// Row stride is rounded up to a multiple of this many bytes
    pub pitch_alignment: u32,
    /// Allocated rows are rounded up to a multiple of this
    pub row_alignment: u32,
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self {
            pitch_alignment: 32,
            row_alignment: 32,
        }
    }
}

/// Allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Textures created
    pub created: usize,
    /// Textures destroyed
    pub destroyed: usize,
    /// Quads drawn since the last `clear_draw_calls`
    pub draws: usize,
}

/// Read-only description of a live texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftTextureInfo {
    /// Creation parameters
    pub desc: TextureDesc,
    /// Row stride in bytes
    pub wpitch: u32,
    /// Allocated rows
    pub hpitch: u32,
}

#[derive(Debug)]
struct SoftTexture {
    desc: TextureDesc,
    wpitch: u32,
    hpitch: u32,
    data: Vec<u8>,
    locked: bool,
}

/// CPU implementation of [`GraphicsDevice`]
#[derive(Debug, Default)]
pub struct SoftwareDevice {
    layout: SurfaceLayout,
    textures: SlotMap<DefaultKey, SoftTexture>,
    draw_calls: Vec<TexturedQuad>,
    stats: DeviceStats,
    memory_budget: Option<usize>,
}

impl SoftwareDevice {
    /// Create a device with the default 32-byte pitch tiling
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device with a specific surface tiling
    pub fn with_layout(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Limit the total bytes of live surfaces; allocations past it fail
    pub fn set_memory_budget(&mut self, budget: Option<usize>) {
        self.memory_budget = budget;
    }

    /// Bytes currently held by live surfaces
    pub fn memory_in_use(&self) -> usize {
        self.textures.values().map(|t| t.data.len()).sum()
    }

    /// Number of textures not yet destroyed
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Allocation and draw counters
    pub const fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Whether `handle` names a live texture
    pub fn is_live(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(key_of(handle))
    }

    /// Description of a live texture
    pub fn texture_info(&self, handle: TextureHandle) -> Option<SoftTextureInfo> {
        self.textures.get(key_of(handle)).map(|t| SoftTextureInfo {
            desc: t.desc,
            wpitch: t.wpitch,
            hpitch: t.hpitch,
        })
    }

    /// Raw surface bytes (`wpitch * hpitch`) of a live texture
    pub fn texture_bytes(&self, handle: TextureHandle) -> Option<&[u8]> {
        self.textures.get(key_of(handle)).map(|t| t.data.as_slice())
    }

    /// Quads drawn since the last clear
    pub fn draw_calls(&self) -> &[TexturedQuad] {
        &self.draw_calls
    }

    /// Start a new frame
    pub fn clear_draw_calls(&mut self) {
        self.draw_calls.clear();
        self.stats.draws = 0;
    }

    /// Export the logical area of a texture as a grayscale image
    pub fn texture_to_image(&self, handle: TextureHandle) -> Option<GrayImage> {
        let texture = self.textures.get(key_of(handle))?;
        let wpitch = texture.wpitch as usize;
        Some(GrayImage::from_fn(texture.desc.width, texture.desc.height, |x, y| {
            Luma([texture.data[y as usize * wpitch + x as usize]])
        }))
    }

    /// Composite the recorded draw calls over `background`
    ///
    /// Each quad samples its texture nearest-neighbour and blends the tint
    /// color using `intensity * tint.a` as coverage.
    pub fn compose_rgba(&self, width: u32, height: u32, background: Rgba<u8>) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(width, height, background);

        for quad in &self.draw_calls {
            let Some(texture) = self.textures.get(key_of(quad.texture)) else {
                log::warn!("Draw call references destroyed texture {:?}", quad.texture);
                continue;
            };
            if quad.width == 0 || quad.height == 0 {
                continue;
            }

            for qy in 0..quad.height {
                let sy = i64::from(quad.y) + i64::from(qy);
                if sy < 0 || sy >= i64::from(height) {
                    continue;
                }
                let ty = (qy * texture.desc.height / quad.height) as usize;

                for qx in 0..quad.width {
                    let sx = i64::from(quad.x) + i64::from(qx);
                    if sx < 0 || sx >= i64::from(width) {
                        continue;
                    }
                    let tx = (qx * texture.desc.width / quad.width) as usize;
                    let intensity = u32::from(texture.data[ty * texture.wpitch as usize + tx]);
                    let alpha = intensity * u32::from(quad.color.a) / 255;
                    if alpha == 0 {
                        continue;
                    }

                    let dst = canvas.get_pixel_mut(sx as u32, sy as u32);
                    let src = [quad.color.r, quad.color.g, quad.color.b];
                    for (channel, &value) in dst.0.iter_mut().zip(src.iter()) {
                        *channel = blend(*channel, value, alpha);
                    }
                    dst.0[3] = dst.0[3].max(alpha as u8);
                }
            }
        }

        canvas
    }
}

fn blend(dst: u8, src: u8, alpha: u32) -> u8 {
    ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha)) / 255) as u8
}

fn key_of(handle: TextureHandle) -> DefaultKey {
    KeyData::from_ffi(handle.0).into()
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> DeviceResult<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(DeviceError::ZeroSized {
                width: desc.width,
                height: desc.height,
            });
        }

        let wpitch = align_up(desc.width * desc.format.bytes_per_pixel(), self.layout.pitch_alignment);
        let hpitch = align_up(desc.height, self.layout.row_alignment);
        let bytes = wpitch as usize * hpitch as usize;

        if let Some(budget) = self.memory_budget {
            if self.memory_in_use() + bytes > budget {
                return Err(DeviceError::AllocationFailed {
                    width: desc.width,
                    height: desc.height,
                    reason: format!("memory budget of {budget} bytes exhausted"),
                });
            }
        }

        let key = self.textures.insert(SoftTexture {
            desc: *desc,
            wpitch,
            hpitch,
            // Fresh surfaces carry garbage on real hardware
            data: vec![0xCD; bytes],
            locked: false,
        });
        self.stats.created += 1;

        let handle = TextureHandle(key.data().as_ffi());
        log::trace!(
            "Created texture {:?} {}x{} (pitch {}x{})",
            handle, desc.width, desc.height, wpitch, hpitch
        );
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(key_of(handle)).is_some() {
            self.stats.destroyed += 1;
        } else {
            log::warn!("Destroy of unknown texture {:?}", handle);
        }
    }

    fn lock_surface(
        &mut self,
        handle: TextureHandle,
        region: Option<LockRegion>,
    ) -> DeviceResult<LockedSurface<'_>> {
        let texture = self
            .textures
            .get_mut(key_of(handle))
            .ok_or(DeviceError::InvalidHandle(handle))?;
        if texture.locked {
            return Err(DeviceError::SurfaceLocked(handle));
        }
        texture.locked = true;

        let region = region.unwrap_or(LockRegion {
            x: 0,
            y: 0,
            width: texture.desc.width,
            height: texture.desc.height,
        });

        Ok(LockedSurface {
            data: &mut texture.data,
            width: texture.desc.width,
            height: texture.desc.height,
            wpitch: texture.wpitch,
            hpitch: texture.hpitch,
            region,
        })
    }

    fn unlock_surface(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.get_mut(key_of(handle)) {
            texture.locked = false;
        }
    }

    fn draw_quad(&mut self, quad: &TexturedQuad) {
        log::trace!("Draw quad {:?} at ({}, {}) {}x{}", quad.texture, quad.x, quad.y, quad.width, quad.height);
        self.draw_calls.push(*quad);
        self.stats.draws += 1;
    }
}
