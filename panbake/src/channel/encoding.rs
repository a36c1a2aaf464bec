//! Decoding of raw shell bytes.

use std::borrow::Cow;

use log::debug;

/// Decode a received chunk as UTF-8, falling back to Latin-1.
///
/// Latin-1 maps every byte to a code point, so decoding can never fail.
/// The fallback is only logged.
pub fn decode_chunk(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            debug!(
                "chunk of {} bytes is not valid UTF-8 ({}), decoding as Latin-1",
                bytes.len(),
                e
            );
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}
