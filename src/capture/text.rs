//! Typed query capture

use crate::error::CaptureError;

/// Trim a typed query, rejecting it if nothing is left
pub fn capture_text(input: &str) -> Result<String, CaptureError> {
    let query = input.trim();
    if query.is_empty() {
        return Err(CaptureError::EmptyQuery);
    }
    Ok(query.to_string())
}
