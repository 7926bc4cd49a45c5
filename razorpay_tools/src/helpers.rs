use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Calculates the hex-encoded HMAC-SHA256 signature the gateway attaches to webhook deliveries.
pub fn calculate_hmac_hex(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a webhook signature against the shared secret.
///
/// A length mismatch between the expected and received digests short-circuits to failure without entering the
/// comparison. When the lengths match, the comparison is constant-time so that the verdict never leaks how many
/// leading characters of the signature were correct.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = calculate_hmac_hex(secret, body);
    let expected = expected.as_bytes();
    let received = signature.as_bytes();
    if expected.len() != received.len() {
        return false;
    }
    expected.iter().zip(received.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "super-secret-webhook-key";

    #[test]
    fn valid_signature_passes() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = calculate_hmac_hex(SECRET, body);
        assert!(verify_webhook_signature(SECRET, body, &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let sig = calculate_hmac_hex(SECRET, b"original body");
        assert!(!verify_webhook_signature(SECRET, b"tampered body", &sig));
    }

    #[test]
    fn wrong_length_signature_fails() {
        assert!(!verify_webhook_signature(SECRET, b"body", "deadbeef"));
        assert!(!verify_webhook_signature(SECRET, b"body", ""));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"body";
        let sig = calculate_hmac_hex("another-secret", body);
        assert!(!verify_webhook_signature(SECRET, body, &sig));
    }
}
