//! Tenant identifier sanitization.
//!
//! User ids arrive as opaque strings and are reused as directory and
//! process names, so they must be reduced to a filesystem- and
//! process-name-safe alphabet first.

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Deterministic; distinct realistic ids stay distinct after mapping.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
