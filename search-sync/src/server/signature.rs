//! Webhook signature verification.
//!
//! The signature header has the form `t=<timestamp>,v1=<signature>`, where
//! the signature is the unpadded URL-safe base64 HMAC-SHA256 of
//! `<timestamp>.<body>` keyed with the shared secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "sanity-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Why a request failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    Malformed,
    #[error("signature does not match")]
    Mismatch,
}

/// Checks request signatures against a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify `body` against the raw header value.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let (timestamp, signature) = parse_header(header)?;
        let expected = URL_SAFE_NO_PAD
            .decode(signature.trim_end_matches('='))
            .map_err(|_| SignatureError::Malformed)?;

        self.mac(timestamp, body)
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Header value for `body` signed at `timestamp`.
    pub fn sign(&self, timestamp: u64, body: &[u8]) -> String {
        let timestamp = timestamp.to_string();
        let signature = self.mac(&timestamp, body).finalize().into_bytes();
        format!("t={},v1={}", timestamp, URL_SAFE_NO_PAD.encode(signature))
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC key length is unrestricted"),
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }
}

/// Split the header into its timestamp and signature parts.
fn parse_header(header: &str) -> Result<(&str, &str), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(s))
            if !t.is_empty() && !s.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Ok((t, s))
        }
        _ => Err(SignatureError::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"ids":{"created":["a"]}}"#;

    #[test]
    fn test_sign_then_verify() {
        let verifier = SignatureVerifier::new("secret");
        let header = verifier.sign(1_700_000_000_000, BODY);

        assert!(header.starts_with("t=1700000000000,v1="));
        assert_eq!(verifier.verify(Some(&header), BODY), Ok(()));
    }

    #[test]
    fn test_rejections() {
        let verifier = SignatureVerifier::new("secret");
        let header = verifier.sign(1, BODY);

        assert_eq!(verifier.verify(None, BODY), Err(SignatureError::Missing));
        assert_eq!(verifier.verify(Some("garbage"), BODY), Err(SignatureError::Malformed));
        assert_eq!(verifier.verify(Some("t=x,v1=abc"), BODY), Err(SignatureError::Malformed));
        assert_eq!(
            verifier.verify(Some(&header), b"{}"),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            SignatureVerifier::new("other").verify(Some(&header), BODY),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_header_part_order() {
        let verifier = SignatureVerifier::new("secret");
        let header = verifier.sign(42, BODY);
        let (t, v1) = header.split_once(',').unwrap();

        assert_eq!(verifier.verify(Some(&format!("{}, {}", v1, t)), BODY), Ok(()));
    }
}
