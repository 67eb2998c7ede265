//! Placeholder payloads: `base64(percent_encode(json))`.
//!
//! Clients decode with `JSON.parse(decodeURIComponent(atob(value)))`, so the
//! percent-encoding step keeps non-ASCII text intact through `atob`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PayloadError;

/// Encode a token for a `data-*` attribute. The output only contains base64
/// characters and needs no further escaping.
///
/// `urlencoding` also escapes `!'()*`, which `encodeURIComponent` keeps, so
/// the bytes can differ from a browser-side encoder; both decode the same.
pub fn encode<T: Serialize>(token: &T, max_bytes: usize) -> Result<String, PayloadError> {
    let json = serde_json::to_string(token)?;
    let payload = STANDARD.encode(urlencoding::encode(&json).as_bytes());
    if payload.len() > max_bytes {
        return Err(PayloadError::TooLarge {
            size: payload.len(),
            limit: max_bytes,
        });
    }
    Ok(payload)
}

/// Inverse of [`encode`], mirroring what the hydrating client does.
pub fn decode<T: DeserializeOwned>(payload: &str) -> Result<T, PayloadError> {
    let bytes = STANDARD.decode(payload)?;
    let escaped = String::from_utf8(bytes)?;
    let json = urlencoding::decode(&escaped)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_with_non_ascii() {
        let quiz = quiz::parse("Città", "? Perché?\n- [x] Sì ✓\n- [ ] No", "Quiz");
        let payload = encode(&quiz, usize::MAX).unwrap();
        assert!(payload.is_ascii());
        assert_eq!(decode::<quiz::Quiz>(&payload).unwrap(), quiz);
    }

    #[test]
    fn payload_is_attribute_safe() {
        let quiz = quiz::parse("<\"&'>", "? <script>", "Quiz");
        let payload = encode(&quiz, usize::MAX).unwrap();
        assert!(
            payload
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        );
    }

    #[test]
    fn known_encoding() {
        // btoa(encodeURIComponent('{"a":"é"}'))
        #[derive(Serialize)]
        struct Token {
            a: &'static str,
        }
        assert_eq!(
            encode(&Token { a: "é" }, usize::MAX).unwrap(),
            "JTdCJTIyYSUyMiUzQSUyMiVDMyVBOSUyMiU3RA=="
        );
    }

    #[test]
    fn reserved_punctuation_is_escaped_and_decodes() {
        let quiz = quiz::parse("Wow! (it's *)", "? Q", "Quiz");
        let payload = encode(&quiz, usize::MAX).unwrap();
        let escaped = String::from_utf8(STANDARD.decode(&payload).unwrap()).unwrap();
        assert!(escaped.contains("%21") && escaped.contains("%28") && escaped.contains("%27"));
        assert_eq!(decode::<quiz::Quiz>(&payload).unwrap(), quiz);
    }

    #[test]
    fn too_large() {
        let quiz = quiz::parse("T", "", "Quiz");
        assert!(matches!(
            encode(&quiz, 8),
            Err(PayloadError::TooLarge { limit: 8, .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode::<quiz::Quiz>("not base64!"),
            Err(PayloadError::Base64(_))
        ));
    }
}
