//! Text encodings used for stored JSON documents

use crate::error::DbError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label of the encoding used when none is configured.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Supported text encodings for record values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1
    Latin1,
    Ascii,
}

/// Raw bytes that are not valid text in the expected encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {encoding} at byte {offset}")]
pub struct DecodeError {
    pub encoding: TextEncoding,
    pub offset: usize,
}

impl TextEncoding {
    /// Resolve an encoding label such as `utf-8`, `UTF8`, `utf-16`, `latin_1`
    /// or `iso-8859-1`.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "utf8" => Some(TextEncoding::Utf8),
            // Unsuffixed UTF-16 is written little-endian, without a BOM
            "utf16" | "utf16le" => Some(TextEncoding::Utf16Le),
            "utf16be" => Some(TextEncoding::Utf16Be),
            "latin1" | "iso88591" | "l1" => Some(TextEncoding::Latin1),
            "ascii" | "usascii" => Some(TextEncoding::Ascii),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Ascii => "ascii",
        }
    }

    /// Highest code point representable as a single unit, if the encoding
    /// cannot represent all of Unicode.
    fn max_char(&self) -> Option<u32> {
        match self {
            TextEncoding::Latin1 => Some(0xFF),
            TextEncoding::Ascii => Some(0x7F),
            _ => None,
        }
    }

    /// Encode a JSON document.
    ///
    /// Characters the encoding cannot represent only occur inside JSON
    /// strings, where they are written as `\uXXXX` escapes instead.
    pub fn encode_json(&self, json: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => json.as_bytes().to_vec(),
            TextEncoding::Utf16Le => json.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16Be => json.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            TextEncoding::Latin1 | TextEncoding::Ascii => {
                let max = self.max_char().unwrap_or(u32::MAX);
                let mut out = Vec::with_capacity(json.len());
                for c in json.chars() {
                    if (c as u32) <= max {
                        out.push(c as u32 as u8);
                    } else {
                        let mut units = [0u16; 2];
                        for unit in c.encode_utf16(&mut units) {
                            out.extend_from_slice(format!("\\u{:04x}", unit).as_bytes());
                        }
                    }
                }
                out
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let error = |offset| DecodeError {
            encoding: *self,
            offset,
        };

        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| error(e.valid_up_to())),
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(error(bytes.len() - 1));
                }
                let units = bytes.chunks_exact(2).map(|pair| {
                    let pair = [pair[0], pair[1]];
                    if *self == TextEncoding::Utf16Le {
                        u16::from_le_bytes(pair)
                    } else {
                        u16::from_be_bytes(pair)
                    }
                });

                let mut text = String::with_capacity(bytes.len() / 2);
                let mut offset = 0;
                for c in char::decode_utf16(units) {
                    let c = c.map_err(|_| error(offset))?;
                    offset += c.len_utf16() * 2;
                    text.push(c);
                }
                Ok(text)
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(error(offset)),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextEncoding::from_label(s).ok_or_else(|| DbError::UnknownEncoding(s.to_string()))
    }
}
