//! Webhook payload signature verification
//!
//! Meta signs every webhook body with HMAC-SHA256 keyed by the app secret and
//! sends it as `X-Hub-Signature-256: sha256=<hex>`. The signature covers the
//! raw request bytes, so it must be checked before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify an `X-Hub-Signature-256` header value against the raw body
///
/// Returns `false` for a malformed header as well as for a mismatch.
pub fn verify_signature(signature_header: &str, payload: &[u8], app_secret: &str) -> bool {
    let Some(signature_hex) = signature_header.trim().strip_prefix("sha256=") else {
        warn!("Invalid signature header format: expected 'sha256=' prefix");
        return false;
    };

    let expected = match hex::decode(signature_hex) {
        Ok(sig) => sig,
        Err(e) => {
            warn!("Failed to decode signature hex: {}", e);
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload);
    let computed = mac.finalize().into_bytes();

    let is_valid: bool = computed.ct_eq(&expected[..]).into();
    if !is_valid {
        warn!("Webhook signature verification failed: signatures do not match");
    }

    is_valid
}
