//! Texture packer
//!
//! Copies a rasterized coverage bitmap into a locked texture surface. The
//! surface is tiled: `wpitch` bytes per row and `hpitch` rows, both possibly
//! larger than the logical `width`/`height`. The copy walks the surface in
//! blocks of the logical size so every tile the sampler may fetch holds the
//! glyph, and it never writes past `wpitch * hpitch` bytes.
//!
//! Source rows advance by the bitmap's `pitch`, destination rows by the
//! surface's `wpitch`; neither is ever the logical width.

use super::raster::Bitmap;
use crate::render::device::{
    create_aligned_texture, with_locked_surface, DeviceResult, GraphicsDevice, LockedSurface,
    OwnedTexture,
};

/// Clear `surface` and copy `bitmap` to its origin
///
/// Zero-sized bitmaps leave the surface untouched.
pub fn pack(bitmap: &Bitmap<'_>, surface: &mut LockedSurface<'_>) {
    if bitmap.is_empty() || surface.width == 0 || surface.height == 0 {
        return;
    }

    surface.clear();
    blit(bitmap, surface, 0, 0);
}

/// Copy `bitmap` into `surface` with its top-left corner at
/// `(origin_x, origin_y)`, without clearing
///
/// Bytes that land left of or above the surface, past the end of their
/// destination row, or past its total extent are dropped. A row never spills
/// into the next one.
pub fn blit(bitmap: &Bitmap<'_>, surface: &mut LockedSurface<'_>, origin_x: i32, origin_y: i32) {
    if bitmap.is_empty() || surface.width == 0 || surface.height == 0 {
        return;
    }

    let wpitch = i64::from(surface.wpitch);
    let limit = surface.byte_len().min(surface.data.len()) as i64;

    for hblock in (0..surface.hpitch).step_by(surface.height as usize) {
        for y in 0..bitmap.rows {
            let dst_y = i64::from(origin_y) + i64::from(y) + i64::from(hblock);
            if dst_y < 0 {
                continue;
            }
            let src = bitmap.row(y);

            for wblock in (0..surface.wpitch).step_by(surface.width as usize) {
                let row_start = dst_y * wpitch + i64::from(wblock);
                let row_room = wpitch - i64::from(wblock);
                for (x, &coverage) in src.iter().enumerate() {
                    let dst_x = i64::from(origin_x) + x as i64;
                    if dst_x < 0 || dst_x >= row_room {
                        continue;
                    }
                    let dst = row_start + dst_x;
                    if dst < limit {
                        surface.data[dst as usize] = coverage;
                    }
                }
            }
        }
    }
}

/// Lock `texture` and pack `bitmap` into it
///
/// A zero-sized bitmap is a no-op: the surface is not even locked.
pub fn pack_texture<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    bitmap: &Bitmap<'_>,
    texture: &OwnedTexture,
) -> DeviceResult<()> {
    if bitmap.is_empty() {
        log::debug!("Skipping pack of zero-sized bitmap into {:?}", texture.handle());
        return Ok(());
    }
    with_locked_surface(device, texture.handle(), None, |surface| pack(bitmap, surface))
}

/// Allocate an aligned, unfiltered texture for `bitmap` and pack it
///
/// Returns `Ok(None)` for zero-sized bitmaps (whitespace). On failure the
/// partially created texture is destroyed.
pub fn upload_bitmap<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    bitmap: &Bitmap<'_>,
    alignment: u32,
) -> DeviceResult<Option<OwnedTexture>> {
    if bitmap.is_empty() {
        return Ok(None);
    }

    let mut guard = create_aligned_texture(device, bitmap.width, bitmap.rows, alignment, false)?;
    let handle = guard.texture().handle();
    with_locked_surface(guard.device(), handle, None, |surface| pack(bitmap, surface))?;
    Ok(Some(guard.into_inner()))
}
