use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Opaque per-browser session identifier carried in the `X-Session-ID` header.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    /// 16 random bytes rendered as 32 lowercase hex characters.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// First eight characters, for logs and responses.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((index, _)) => &self.0[..index],
            None => &self.0,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionKey;

    #[test]
    fn generated_keys_are_hex_and_distinct() {
        let first = SessionKey::generate();
        let second = SessionKey::generate();

        assert_eq!(first.as_str().len(), 32);
        assert!(first.as_str().chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn display_truncates_for_privacy() {
        let key = SessionKey::new("0123456789abcdef");
        assert_eq!(key.short(), "01234567");
        assert_eq!(key.to_string(), "01234567...");
        assert_eq!(SessionKey::new("abc").short(), "abc");
        assert!(SessionKey::new("  ").is_blank());
    }
}
