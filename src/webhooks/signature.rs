//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body and a shared
//! secret, presented in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//! Verification happens before any parsing; a body that fails it is never
//! deserialized.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a `sha256=<hex>` header value into raw signature bytes.
///
/// Returns `None` for malformed headers (wrong prefix, invalid hex). Never
/// panics.
///
/// ```
/// use build_relay::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("sha256=abcd1234").is_some());
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=not-hex").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 of a payload under the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats raw signature bytes as a GitHub-style header value (`sha256=<hex>`).
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a delivery against the shared secret.
///
/// `signature_header` is the raw `X-Hub-Signature-256` value. The comparison
/// is constant time (via the HMAC library's verifier). Malformed headers
/// verify as false rather than erroring.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let claimed = match parse_signature_header(signature_header) {
        Some(sig) => sig,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&claimed).is_ok()
}
