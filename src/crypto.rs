//! API-key generation.
//!
//! Grounded on the teacher's `auth/models.rs::ApiKey::generate_key`
//! (`format!("btb_live_{}", Uuid::new_v4().simple())`), strengthened with
//! real random bytes instead of a UUID. Keys are stored in plaintext rather
//! than hashed at rest (unlike the teacher's bcrypt-hashed passwords),
//! because the admin reveal-key endpoint must be able to return the original
//! value, not just confirm a match against it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;

/// Generate an opaque bearer token: `<prefix><32 base64url-nopad chars>`.
pub fn generate_api_key(prefix: &str) -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);
    format!("{prefix}{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_prefixed_unique_keys() {
        let a = generate_api_key("ts_live_");
        let b = generate_api_key("ts_live_");
        assert!(a.starts_with("ts_live_"));
        assert!(b.starts_with("ts_live_"));
        assert_ne!(a, b);
    }
}
