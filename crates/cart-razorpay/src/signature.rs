//! # Payment Signature Verification
//!
//! Razorpay signs successful payments with HMAC-SHA256 over
//! `"{order_id}|{payment_id}"` using the key secret. Callers verify the
//! signature returned in the checkout outcome before fulfilling the order.

/// Compute the expected signature for an (order, payment) pair.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> String {
    compute_hmac_sha256(key_secret, &format!("{order_id}|{payment_id}"))
}

/// Verify a gateway-provided signature (constant-time).
pub fn verify_payment_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    constant_time_compare(&payment_signature(key_secret, order_id, payment_id), signature)
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let sig = payment_signature("secret", "order_1", "pay_1");
        assert_eq!(sig.len(), 64); // SHA256 hex

        assert!(verify_payment_signature("secret", "order_1", "pay_1", &sig));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let sig = payment_signature("secret", "order_1", "pay_1");

        assert!(!verify_payment_signature("secret", "order_1", "pay_2", &sig));
        assert!(!verify_payment_signature("other-secret", "order_1", "pay_1", &sig));
        assert!(!verify_payment_signature("secret", "order_1", "pay_1", "deadbeef"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
