//! Content decoding for blob responses

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::resolver::core::{ResolveError, Result};

/// Decode blob `content` according to its declared `encoding`
///
/// | encoding | result |
/// |---|---|
/// | `base64` | standard base64, line breaks ignored; empty content is an error |
/// | `""` | the content bytes as-is |
/// | `none` | error, the API did not inline the file |
/// | anything else | error |
pub fn decode_content(content: &str, encoding: &str) -> Result<Vec<u8>> {
    match encoding {
        "base64" => {
            if content.is_empty() {
                return Err(ResolveError::EmptyEncodedContent);
            }
            // The contents API wraps base64 at 60 columns
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map_err(|e| ResolveError::InvalidBase64 { source: e })
        }
        "" => Ok(content.as_bytes().to_vec()),
        "none" => Err(ResolveError::ContentTooLarge),
        other => Err(ResolveError::UnsupportedEncoding {
            encoding: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips_a_single_byte() {
        assert_eq!(decode_content("eA==", "base64").unwrap(), b"x");
    }

    #[test]
    fn base64_ignores_embedded_newlines() {
        assert_eq!(decode_content("aGVs\nbG8=\n", "base64").unwrap(), b"hello");
    }

    #[test]
    fn base64_rejects_empty_content() {
        assert!(matches!(decode_content("", "base64"), Err(ResolveError::EmptyEncodedContent)));
    }

    #[test]
    fn base64_rejects_garbage() {
        assert!(matches!(decode_content("@@@", "base64"), Err(ResolveError::InvalidBase64 { .. })));
    }

    #[test]
    fn empty_encoding_passes_content_through() {
        assert_eq!(decode_content("plain text", "").unwrap(), b"plain text");
        assert_eq!(decode_content("", "").unwrap(), b"");
    }

    #[test]
    fn none_encoding_always_fails() {
        assert!(matches!(decode_content("", "none"), Err(ResolveError::ContentTooLarge)));
        assert!(matches!(decode_content("eA==", "none"), Err(ResolveError::ContentTooLarge)));
    }

    #[test]
    fn unknown_encoding_is_unsupported() {
        match decode_content("eA==", "zlib") {
            Err(ResolveError::UnsupportedEncoding { encoding }) => assert_eq!(encoding, "zlib"),
            other => panic!("Expected UnsupportedEncoding, got {:?}", other),
        }
    }
}
