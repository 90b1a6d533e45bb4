//! Modified UTF-8 as used by `CONSTANT_Utf8_info` (JVMS §4.4.7)
//!
//! Differs from standard UTF-8 in two ways: NUL is encoded as `C0 80`, and
//! supplementary characters are encoded as two three-byte surrogates.

use crate::encoder::DecodeError;

/// Encode a string into modified UTF-8
pub fn encode(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) as u8 & 0x1F));
                out.push(0x80 | (unit as u8 & 0x3F));
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) as u8 & 0x0F));
                out.push(0x80 | ((unit >> 6) as u8 & 0x3F));
                out.push(0x80 | (unit as u8 & 0x3F));
            }
        }
    }
    out
}

/// Length of `value` once encoded, without allocating
pub fn encoded_len(value: &str) -> usize {
    value
        .encode_utf16()
        .map(|unit| match unit {
            0x0001..=0x007F => 1,
            0x0000 | 0x0080..=0x07FF => 2,
            _ => 3,
        })
        .sum()
}

/// Decode modified UTF-8 bytes; `offset` is only used for error reporting
pub fn decode(bytes: &[u8], offset: usize) -> Result<String, DecodeError> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let invalid = DecodeError::InvalidUtf8(offset + i);
        let lead = bytes[i];

        if lead & 0x80 == 0 {
            if lead == 0 {
                return Err(invalid);
            }
            units.push(lead as u16);
            i += 1;
        } else if lead & 0xE0 == 0xC0 {
            let b2 = continuation(bytes, i + 1).ok_or(invalid)?;
            units.push(((lead as u16 & 0x1F) << 6) | b2);
            i += 2;
        } else if lead & 0xF0 == 0xE0 {
            let b2 = continuation(bytes, i + 1).ok_or(DecodeError::InvalidUtf8(offset + i))?;
            let b3 = continuation(bytes, i + 2).ok_or(DecodeError::InvalidUtf8(offset + i))?;
            units.push(((lead as u16 & 0x0F) << 12) | (b2 << 6) | b3);
            i += 3;
        } else {
            return Err(invalid);
        }
    }

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| DecodeError::InvalidUtf8(offset))
}

fn continuation(bytes: &[u8], index: usize) -> Option<u16> {
    match bytes.get(index) {
        Some(b) if b & 0xC0 == 0x80 => Some((b & 0x3F) as u16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_unchanged() {
        assert_eq!(encode("java/lang/Object"), b"java/lang/Object".to_vec());
    }

    #[test]
    fn test_nul_uses_two_bytes() {
        assert_eq!(encode("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&[b'a', 0xC0, 0x80, b'b'], 0).unwrap(), "a\0b");
    }

    #[test]
    fn test_supplementary_characters_use_surrogates() {
        let encoded = encode("\u{1F600}");
        assert_eq!(encoded.len(), 6);
        assert_eq!(decode(&encoded, 0).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_two_and_three_byte_forms() {
        let text = "é€";
        assert_eq!(decode(&encode(text), 0).unwrap(), text);
    }

    #[test]
    fn test_encoded_len_matches_encode() {
        for text in ["", "plain", "a\0b", "é€", "\u{1F600}x"] {
            assert_eq!(encoded_len(text), encode(text).len(), "{:?}", text);
        }
    }

    #[test]
    fn test_raw_nul_is_rejected() {
        assert!(matches!(decode(&[0x41, 0x00], 10), Err(DecodeError::InvalidUtf8(11))));
    }

    #[test]
    fn test_truncated_sequence_is_rejected() {
        assert!(decode(&[0xE2, 0x82], 0).is_err());
    }
}
