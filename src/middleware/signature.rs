//! Webhook signature verification.
//!
//! Every webhook delivery carries an HMAC-SHA256 signature of the raw request
//! body, hex-encoded, in the `layercode-signature` header. Verification runs
//! over the raw bytes before any JSON parsing so a rejected request performs
//! no store mutation and no generation call. Comparison is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded body signature.
pub const SIGNATURE_HEADER: &str = "layercode-signature";

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC key of any length is accepted");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a header-supplied signature against the raw body.
pub fn verify(secret: &str, body: &[u8], provided: &str) -> bool {
    let expected = sign(secret, body);
    // ct_eq on slices of unequal length resolves to false without branching
    // on content.
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
