//! UTF-8 to character code decoding
//!
//! Text arriving as raw bytes (command line arguments, files, network) is
//! decoded into 32-bit character codes, which is what the glyph cache is keyed
//! by. The decoder follows the leading-byte thresholds of the multi-byte forms
//! (`0xC0` two bytes, `0xE0` three bytes, `0xF0` four bytes) and rejects
//! malformed sequences instead of reading past them. Only Unicode scalar
//! values come out: overlong forms, surrogates and values past U+10FFFF are
//! errors.

/// Errors produced while decoding UTF-8 input
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Utf8DecodeError {
    /// A continuation byte appeared where a leading byte was expected
    #[error("unexpected continuation byte 0x{byte:02X} at offset {offset}")]
    UnexpectedContinuation {
        /// Byte offset in the input
        offset: usize,
        /// Offending byte
        byte: u8,
    },

    /// The input ended in the middle of a multi-byte sequence
    #[error("truncated sequence starting at offset {offset}: expected {expected} bytes")]
    Truncated {
        /// Offset of the leading byte
        offset: usize,
        /// Total length the leading byte announced
        expected: usize,
    },

    /// A byte inside a multi-byte sequence is not of the form `10xxxxxx`
    #[error("invalid continuation byte 0x{byte:02X} at offset {offset}")]
    InvalidContinuation {
        /// Byte offset in the input
        offset: usize,
        /// Offending byte
        byte: u8,
    },

    /// A byte that can never start a sequence (`0xC0`, `0xC1`, `0xF5..=0xFF`)
    #[error("invalid leading byte 0x{byte:02X} at offset {offset}")]
    InvalidLeadByte {
        /// Byte offset in the input
        offset: usize,
        /// Offending byte
        byte: u8,
    },

    /// The value fits in a shorter sequence
    #[error("overlong encoding of U+{code:04X} at offset {offset}")]
    Overlong {
        /// Offset of the leading byte
        offset: usize,
        /// Decoded value
        code: u32,
    },

    /// The value is a surrogate or lies above U+10FFFF
    #[error("U+{code:04X} at offset {offset} is not a Unicode scalar value")]
    NotScalarValue {
        /// Offset of the leading byte
        offset: usize,
        /// Decoded value
        code: u32,
    },
}

/// Decode a UTF-8 byte sequence into character codes
pub fn decode_utf8(bytes: &[u8]) -> Result<Vec<u32>, Utf8DecodeError> {
    let mut codes = Vec::with_capacity(bytes.len());
    let mut offset = 0;

    while offset < bytes.len() {
        let (code, len) = decode_one(bytes, offset)?;
        codes.push(code);
        offset += len;
    }

    Ok(codes)
}

/// Collect the character codes of an already validated string
pub fn str_codes(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}

/// Smallest value each sequence length may encode
const MIN_CODE: [u32; 4] = [0, 0x80, 0x800, 0x1_0000];

fn decode_one(bytes: &[u8], offset: usize) -> Result<(u32, usize), Utf8DecodeError> {
    let lead = bytes[offset];

    let (len, initial) = match lead {
        0x00..=0x7F => return Ok((u32::from(lead), 1)),
        0x80..=0xBF => {
            return Err(Utf8DecodeError::UnexpectedContinuation { offset, byte: lead });
        }
        0xC2..=0xDF => (2, u32::from(lead & 0x1F)),
        0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
        0xF0..=0xF4 => (4, u32::from(lead & 0x07)),
        _ => return Err(Utf8DecodeError::InvalidLeadByte { offset, byte: lead }),
    };

    if offset + len > bytes.len() {
        return Err(Utf8DecodeError::Truncated { offset, expected: len });
    }

    let mut code = initial;
    for (i, &byte) in bytes[offset + 1..offset + len].iter().enumerate() {
        if byte & 0xC0 != 0x80 {
            return Err(Utf8DecodeError::InvalidContinuation {
                offset: offset + 1 + i,
                byte,
            });
        }
        code = (code << 6) | u32::from(byte & 0x3F);
    }

    if code < MIN_CODE[len - 1] {
        return Err(Utf8DecodeError::Overlong { offset, code });
    }
    if char::from_u32(code).is_none() {
        return Err(Utf8DecodeError::NotScalarValue { offset, code });
    }

    Ok((code, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ascii() {
        assert_eq!(decode_utf8(b"Hi!").unwrap(), vec![0x48, 0x69, 0x21]);
        assert!(decode_utf8(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_multibyte_forms() {
        let text = "aé€😀";
        let codes = decode_utf8(text.as_bytes()).unwrap();
        assert_eq!(codes, vec![0x61, 0xE9, 0x20AC, 0x1F600]);
        assert_eq!(codes, str_codes(text));
    }

    #[test]
    fn test_decode_rejects_stray_continuation() {
        let err = decode_utf8(&[0x41, 0x80]).unwrap_err();
        assert_eq!(err, Utf8DecodeError::UnexpectedContinuation { offset: 1, byte: 0x80 });
    }

    #[test]
    fn test_decode_rejects_truncated_sequence() {
        let err = decode_utf8(&[0xE2, 0x82]).unwrap_err();
        assert_eq!(err, Utf8DecodeError::Truncated { offset: 0, expected: 3 });
    }

    #[test]
    fn test_decode_rejects_bad_continuation() {
        let err = decode_utf8(&[0xC3, 0x41]).unwrap_err();
        assert_eq!(err, Utf8DecodeError::InvalidContinuation { offset: 1, byte: 0x41 });
    }

    #[test]
    fn test_decode_rejects_five_byte_lead() {
        let err = decode_utf8(&[0xF8, 0x80, 0x80, 0x80, 0x80]).unwrap_err();
        assert_eq!(err, Utf8DecodeError::InvalidLeadByte { offset: 0, byte: 0xF8 });
    }

    #[test]
    fn test_decode_rejects_never_valid_leads() {
        assert_eq!(
            decode_utf8(&[0xC0, 0x80]).unwrap_err(),
            Utf8DecodeError::InvalidLeadByte { offset: 0, byte: 0xC0 }
        );
        assert_eq!(
            decode_utf8(&[0x41, 0xC1, 0xBF]).unwrap_err(),
            Utf8DecodeError::InvalidLeadByte { offset: 1, byte: 0xC1 }
        );
        assert_eq!(
            decode_utf8(&[0xF5, 0x80, 0x80, 0x80]).unwrap_err(),
            Utf8DecodeError::InvalidLeadByte { offset: 0, byte: 0xF5 }
        );
    }

    #[test]
    fn test_decode_rejects_overlong_forms() {
        assert_eq!(
            decode_utf8(&[0xE0, 0x80, 0xAF]).unwrap_err(),
            Utf8DecodeError::Overlong { offset: 0, code: 0x2F }
        );
        assert_eq!(
            decode_utf8(&[0xF0, 0x8F, 0xBF, 0xBF]).unwrap_err(),
            Utf8DecodeError::Overlong { offset: 0, code: 0xFFFF }
        );
    }

    #[test]
    fn test_decode_rejects_surrogates_and_out_of_range() {
        assert_eq!(
            decode_utf8(&[0xED, 0xA0, 0x80]).unwrap_err(),
            Utf8DecodeError::NotScalarValue { offset: 0, code: 0xD800 }
        );
        assert_eq!(
            decode_utf8(&[0xF4, 0x90, 0x80, 0x80]).unwrap_err(),
            Utf8DecodeError::NotScalarValue { offset: 0, code: 0x11_0000 }
        );
    }

    #[test]
    fn test_decode_accepts_range_boundaries() {
        let bytes = [0xC2, 0x80, 0xE0, 0xA0, 0x80, 0xED, 0x9F, 0xBF, 0xEE, 0x80, 0x80, 0xF4, 0x8F, 0xBF, 0xBF];
        assert_eq!(
            decode_utf8(&bytes).unwrap(),
            vec![0x80, 0x800, 0xD7FF, 0xE000, 0x10_FFFF]
        );
    }
}
