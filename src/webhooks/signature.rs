//! Webhook delivery authentication.
//!
//! GitHub signs each delivery body with HMAC-SHA256 keyed by the webhook
//! secret and sends the digest in `X-Hub-Signature-256` as `sha256=<hex>`.
//! Deliveries are authenticated before their body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const HEADER_PREFIX: &str = "sha256=";

/// Decodes the digest from an `X-Hub-Signature-256` header value.
///
/// Returns `None` for any other algorithm prefix or for invalid hex.
///
/// ```
/// use workflow_relay::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=0aff"), Some(vec![0x0a, 0xff]));
/// assert!(parse_signature_header("sha1=0aff").is_none());
/// assert!(parse_signature_header("sha256=zz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix(HEADER_PREFIX)?).ok()
}

/// Computes the HMAC-SHA256 digest of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a digest as an `X-Hub-Signature-256` header value.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{HEADER_PREFIX}{}", hex::encode(signature))
}

/// Checks `signature_header` against the digest of `payload` under `secret`.
///
/// The digest comparison is constant-time. Malformed headers fail
/// verification rather than erroring.
///
/// ```
/// use workflow_relay::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"action":"queued"}"#;
/// let header = format_signature_header(&compute_signature(body, b"s3cret"));
/// assert!(verify_signature(body, &header, b"s3cret"));
/// assert!(!verify_signature(body, &header, b"other"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
