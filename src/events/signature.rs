//! HMAC-SHA256 webhook signatures, hex encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn compute_signature(body: &[u8], secret: &str) -> String {
    hex::encode(mac(secret, body).finalize().into_bytes())
}

/// Check `signature` against the body. A missing or empty secret accepts
/// everything. The comparison is constant-time.
pub fn verify_signature(body: &[u8], signature: &str, secret: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return true;
    };
    let signature = signature.trim();
    let signature = signature.strip_prefix(PREFIX).unwrap_or(signature);
    let Ok(tag) = hex::decode(signature) else {
        return false;
    };
    mac(secret, body).verify_slice(&tag).is_ok()
}

fn mac(secret: &str, body: &[u8]) -> HmacSha256 {
    let mut mac = match <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts any key length"),
    };
    mac.update(body);
    mac
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":"messages.upsert"}"#;

    #[test]
    fn no_secret_accepts_anything() {
        assert!(verify_signature(BODY, "", None));
        assert!(verify_signature(BODY, "garbage", Some("")));
    }

    #[test]
    fn valid_signature_passes() {
        let sig = compute_signature(BODY, "topsecret");
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(BODY, &sig, Some("topsecret")));
        assert!(verify_signature(BODY, &format!("sha256={sig}"), Some("topsecret")));
        assert!(verify_signature(BODY, &sig.to_uppercase(), Some("topsecret")));
    }

    #[test]
    fn rejects_wrong_or_malformed_signature() {
        let sig = compute_signature(BODY, "topsecret");
        assert!(!verify_signature(BODY, &sig, Some("other")));
        assert!(!verify_signature(b"tampered", &sig, Some("topsecret")));
        assert!(!verify_signature(BODY, "not-hex", Some("topsecret")));
        assert!(!verify_signature(BODY, "", Some("topsecret")));
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            compute_signature(b"what do ya want for nothing?", "Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
