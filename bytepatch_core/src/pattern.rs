use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How find and replace text is turned into raw bytes.
///
/// The same encoding is always applied to both sides of a request so that their
/// lengths are comparable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// The text's own UTF-8 bytes, byte for byte.
    #[default]
    Utf8,
    /// One byte per character; characters above U+00FF are rejected.
    Latin1,
    /// Pairs of hexadecimal digits, ASCII whitespace ignored (e.g. `"de ad be ef"`).
    Hex,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("utf-8"),
            TextEncoding::Latin1 => f.write_str("latin-1"),
            TextEncoding::Hex => f.write_str("hex"),
        }
    }
}

impl TextEncoding {
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, ValidationError> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        self.error(format!("character {c:?} is outside the latin-1 range"))
                    })
                })
                .collect(),
            TextEncoding::Hex => self.decode_hex(text),
        }
    }

    fn decode_hex(&self, text: &str) -> Result<Vec<u8>, ValidationError> {
        let digits = text
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| {
                c.to_digit(16)
                    .map(|d| d as u8)
                    .ok_or_else(|| self.error(format!("{c:?} is not a hex digit")))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        if digits.len() % 2 != 0 {
            return Err(self.error(format!("odd number of hex digits ({})", digits.len())));
        }
        Ok(digits.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
    }

    fn error(&self, reason: String) -> ValidationError {
        ValidationError::Encoding {
            encoding: *self,
            reason,
        }
    }
}

/// The non-empty byte sequence being searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern(Vec<u8>);

impl SearchPattern {
    pub fn new(bytes: Vec<u8>) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        Ok(Self(bytes))
    }

    pub fn encode(text: &str, encoding: TextEncoding) -> Result<Self, ValidationError> {
        Self::new(encoding.encode(text)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The bytes written at every occurrence. May be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPattern(Vec<u8>);

impl ReplacementPattern {
    /// Wraps `bytes`, appending a single zero byte when `null_terminate` is set.
    pub fn new(mut bytes: Vec<u8>, null_terminate: bool) -> Self {
        if null_terminate {
            bytes.push(0);
        }
        Self(bytes)
    }

    pub fn encode(
        text: &str,
        encoding: TextEncoding,
        null_terminate: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(encoding.encode(text)?, null_terminate))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_encoding_is_byte_for_byte() {
        assert_eq!(TextEncoding::Utf8.encode("foo").unwrap(), b"foo");
        assert_eq!(TextEncoding::Utf8.encode("é").unwrap(), vec![0xC3, 0xA9]);
    }

    #[test]
    fn latin1_encoding_maps_chars_to_single_bytes() {
        assert_eq!(TextEncoding::Latin1.encode("é").unwrap(), vec![0xE9]);
        let err = TextEncoding::Latin1.encode("€").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Encoding {
                encoding: TextEncoding::Latin1,
                ..
            }
        ));
    }

    #[test]
    fn hex_encoding_ignores_whitespace_and_rejects_garbage() {
        assert_eq!(
            TextEncoding::Hex.encode("de ad\tBE EF").unwrap(),
            vec![0xDE, 0xAD, 0xBE, 0xEF]
        );
        assert!(TextEncoding::Hex.encode("abc").is_err());
        assert!(TextEncoding::Hex.encode("zz").is_err());
        assert_eq!(TextEncoding::Hex.encode("   ").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn empty_search_pattern_is_rejected() {
        assert_eq!(
            SearchPattern::encode("", TextEncoding::Utf8),
            Err(ValidationError::EmptyPattern)
        );
        assert_eq!(
            SearchPattern::encode(" ", TextEncoding::Hex),
            Err(ValidationError::EmptyPattern)
        );
    }

    #[test]
    fn null_termination_appends_one_zero_byte() {
        let plain = ReplacementPattern::encode("X", TextEncoding::Utf8, false).unwrap();
        let terminated = ReplacementPattern::encode("X", TextEncoding::Utf8, true).unwrap();
        assert_eq!(plain.as_bytes(), b"X");
        assert_eq!(terminated.as_bytes(), b"X\0");

        let empty = ReplacementPattern::encode("", TextEncoding::Utf8, true).unwrap();
        assert_eq!(empty.as_bytes(), &[0]);
    }
}
