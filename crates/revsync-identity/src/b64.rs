use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::identity::IdentityError;

const PADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

const UNPADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Decode standard base64, accepting both padded and unpadded input.
///
/// Surrounding whitespace is trimmed first; some store entries carry a
/// trailing space. Padded decoding is attempted before unpadded, and when both
/// fail the padded attempt's error is reported.
pub fn b64_decode(input: &str) -> Result<Vec<u8>, IdentityError> {
    let trimmed = input.trim();
    match PADDED.decode(trimmed) {
        Ok(bytes) => Ok(bytes),
        Err(padded_err) => UNPADDED
            .decode(trimmed)
            .map_err(|_| IdentityError::Base64 {
                input: input.to_string(),
                source: padded_err,
            }),
    }
}

/// Encode bytes as padded standard base64, the canonical identity form.
pub fn b64_encode(bytes: &[u8]) -> String {
    PADDED.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_decodes(input: &str, expected: &[u8]) {
        let decoded = b64_decode(input).unwrap_or_else(|e| panic!("decode {input:?}: {e}"));
        assert_eq!(decoded, expected, "input {input:?}");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_decodes("b2theSB0aGVyZQ==", b"okay there");
        assert_decodes("b2theSB0aGVyZQ== ", b"okay there");
        assert_decodes(" b2theSB0aGVyZQ==", b"okay there");
        assert_decodes(" b2theSB0aGVyZQ== ", b"okay there");
    }

    #[test]
    fn decodes_high_bytes_with_and_without_padding() {
        let expected = [0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88];
        assert_decodes("/+7dzLuqmYg=", &expected);
        assert_decodes("/+7dzLuqmYg", &expected);
    }

    #[test]
    fn re_encoding_always_pads() {
        let bytes = b64_decode("/+7dzLuqmYg").unwrap();
        assert_eq!(b64_encode(&bytes), "/+7dzLuqmYg=");
    }

    #[test]
    fn garbage_reports_the_offending_input() {
        let err = b64_decode("not base64!!").unwrap_err();
        assert!(err.to_string().contains("not base64!!"), "{err}");
    }

    #[test]
    fn empty_input_is_empty_bytes() {
        assert_decodes("", b"");
    }
}
