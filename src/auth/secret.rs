//! Shared secret gating the teacher role.

use std::fmt;

/// The process-wide secret a caller must present to register or log in as a
/// teacher.
///
/// An unconfigured secret matches nothing.
#[derive(Clone, Default)]
pub struct ElevatedSecret(Option<String>);

impl ElevatedSecret {
    /// Create a secret. An empty or whitespace-only value leaves it unconfigured.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if secret.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(secret))
        }
    }

    /// Whether a secret has been configured.
    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Check a caller-supplied value against the secret.
    pub fn matches(&self, supplied: Option<&str>) -> bool {
        match (&self.0, supplied) {
            (Some(expected), Some(supplied)) => {
                constant_time_eq(expected.as_bytes(), supplied.as_bytes())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ElevatedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_configured() {
            "<redacted>"
        } else {
            "<unset>"
        };
        f.debug_tuple("ElevatedSecret").field(&state).finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
