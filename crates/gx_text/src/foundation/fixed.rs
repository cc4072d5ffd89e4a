//! 26.6 fixed-point helpers
//!
//! The rasterizer interface reports advances, bearings, face metrics and
//! kerning in 1/64th of a pixel. Conversion to whole pixels is an arithmetic
//! shift, so negative values floor toward negative infinity.

/// Number of fractional bits in a 26.6 value
pub const FRACTION_BITS: u32 = 6;

/// Convert a 26.6 fixed-point value to whole pixels
#[inline]
pub const fn to_pixels(value: i32) -> i32 {
    value >> FRACTION_BITS
}

/// Convert whole pixels to 26.6 fixed point
#[inline]
pub const fn from_pixels(pixels: i32) -> i32 {
    pixels << FRACTION_BITS
}

/// Convert a floating point pixel value to 26.6 fixed point, rounding to the
/// nearest 1/64th
#[inline]
pub fn from_f32(pixels: f32) -> i32 {
    (pixels * 64.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pixels_floors_negative_values() {
        assert_eq!(to_pixels(64 * 7), 7);
        assert_eq!(to_pixels(64 * 7 + 63), 7);
        assert_eq!(to_pixels(-1), -1);
        assert_eq!(to_pixels(-64), -1);
        assert_eq!(to_pixels(-65), -2);
    }

    #[test]
    fn test_float_conversion() {
        assert_eq!(from_f32(1.5), 96);
        assert_eq!(from_f32(-0.25), -16);
        assert_eq!(to_pixels(from_pixels(12)), 12);
    }
}
