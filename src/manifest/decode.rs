//! Byte -> text decoding for `install_script.iss`.
//!
//! Unicode installers get a UTF-8 script with a BOM; older ANSI builds write the script in the
//! installer's code page. Undecodable bytes are dropped rather than failing the parse.

use encoding::all::{UTF_8, UTF_16BE, UTF_16LE};
use encoding::{DecoderTrap, Encoding, EncodingRef};

use super::error::{ManifestError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decodes manifest bytes.
///
/// With a BOM the matching Unicode codec is used. Without one the bytes are read as UTF-8; if
/// `ansi_codec` is set and the bytes are not valid UTF-8, they are read with that codec instead.
pub fn decode(bytes: &[u8], ansi_codec: Option<EncodingRef>) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_with(UTF_8, rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
        return decode_with(UTF_16LE, rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16BE_BOM) {
        return decode_with(UTF_16BE, rest);
    }

    match ansi_codec {
        Some(codec) if std::str::from_utf8(bytes).is_err() => decode_with(codec, bytes),
        _ => decode_with(UTF_8, bytes),
    }
}

fn decode_with(codec: &dyn Encoding, bytes: &[u8]) -> Result<String> {
    codec
        .decode(bytes, DecoderTrap::Ignore)
        .map_err(|message| ManifestError::Decode {
            encoding: codec.name(),
            message: message.into_owned(),
        })
}
