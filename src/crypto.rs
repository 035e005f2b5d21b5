use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::SessionError;

/// Default session key length in bytes (2048 bits).
pub const DEFAULT_KEY_LENGTH: usize = 256;

/// Draws `length` bytes from the operating system's secure random source.
///
/// # Errors
///
/// Returns `SessionError::Entropy` if the random source fails. A session
/// must not be issued in that case.
pub fn generate_key(length: usize) -> Result<Vec<u8>, SessionError> {
    let mut key = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(key)
}

/// Encodes raw key bytes as a URL- and cookie-safe token.
pub fn encode_token(key: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(key)
}

/// Decodes a token back into its raw key bytes.
///
/// Returns `None` for anything that was not produced by [`encode_token`].
pub fn decode_token(token: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(token).ok()
}

/// Generates a fresh session token from `length` random bytes.
///
/// The token is URL-safe base64 without padding, so a 256 byte key yields
/// a 342 character token.
///
/// # Example
///
/// ```rust
/// use photosite::crypto::{decode_token, generate_token};
///
/// let token = generate_token(32).unwrap();
/// assert_eq!(decode_token(&token).unwrap().len(), 32);
/// ```
pub fn generate_token(length: usize) -> Result<String, SessionError> {
    generate_key(length).map(|key| encode_token(&key))
}
