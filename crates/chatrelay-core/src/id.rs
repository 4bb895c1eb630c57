//! Opaque session identifier generation.

use uuid::Uuid;

/// Display length of generated identifiers.
const SESSION_ID_LEN: usize = 16;

/// Generate an opaque session identifier: the decimal rendering of a
/// random 128-bit value, truncated to 16 characters.
///
/// Uniqueness is probabilistic only; nothing checks for collisions.
pub fn generate_session_id() -> String {
    let mut id = Uuid::new_v4().as_u128().to_string();
    id.truncate(SESSION_ID_LEN);
    id
}
