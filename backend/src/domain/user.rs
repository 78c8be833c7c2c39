//! User identity types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier assigned to a user by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw store identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier for persistence adapters.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for [`Username`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameValidationError {
    /// Username is empty after trimming whitespace.
    #[error("username must not be empty")]
    Empty,
}

/// Login name, unique per account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Validate and construct a username, trimming surrounding whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, UsernameValidationError> {
        let trimmed = raw.into().trim().to_owned();
        if trimmed.is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the underlying name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A registered account. Credentials never leave the persistence layer;
/// this type is safe to hand to adapters and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: Username,
    email: String,
}

impl User {
    /// Assemble a user from its parts.
    pub fn new(id: UserId, username: Username, email: impl Into<String>) -> Self {
        Self {
            id,
            username,
            email: email.into(),
        }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Unique login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Contact address captured at registration.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice", "alice")]
    #[case("  bob  ", "bob")]
    fn username_trims_whitespace(#[case] raw: &str, #[case] expected: &str) {
        let username = Username::new(raw).expect("valid username");
        assert_eq!(username.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_username_is_rejected(#[case] raw: &str) {
        assert_eq!(Username::new(raw), Err(UsernameValidationError::Empty));
    }
}
