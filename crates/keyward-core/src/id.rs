//! ID generation utilities.

use uuid::Uuid;

/// Maximum length accepted by [`is_valid_id`].
pub const MAX_ID_LEN: usize = 128;

/// Generate a new UUID v4.
pub fn uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a short random ID (8 characters).
pub fn short_id() -> String {
    let bytes: [u8; 4] = rand::random();
    hex::encode(bytes)
}

/// Check if an ID is safe to use as a storage key.
///
/// Allowed: ASCII alphanumeric, underscore, hyphen. Max length 128.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
