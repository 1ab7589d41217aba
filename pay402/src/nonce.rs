//! Nonce generation for payment requirements.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE as b64;

/// Number of random bytes in a generated nonce.
pub const NONCE_BYTES: usize = 16;

/// Generates a fresh random nonce.
///
/// The nonce is [`NONCE_BYTES`] random bytes encoded with the URL-safe
/// base64 alphabet (padded), which yields a 24 character string.
#[must_use]
pub fn generate_nonce() -> String {
    let bytes: [u8; NONCE_BYTES] = rand::random();
    b64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_url_safe_and_fixed_length() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), 24);
        assert!(
            nonce
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
        );
        assert_eq!(b64.decode(&nonce).unwrap().len(), NONCE_BYTES);
    }

    #[test]
    fn nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
