//! JID (Jabber ID) type.
//!
//! A JID identifies a user or a server as `user@server`. The binary codec sends
//! JID-shaped strings as an identifier pair so that each half can use the token
//! dictionary or nibble packing on its own.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Known JID servers
pub mod servers {
    pub const DEFAULT_USER: &str = "s.whatsapp.net";
    pub const GROUP: &str = "g.us";
    pub const LEGACY_USER: &str = "s.us";
}

/// JID is a `user@server` pair. An empty user denotes the server itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JID {
    pub user: String,
    pub server: String,
}

impl JID {
    /// Creates a new JID.
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Splits `s` if it has identifier-pair shape: exactly one `@` with a
    /// non-empty user and server on either side.
    pub fn split_pair(s: &str) -> Option<(&str, &str)> {
        let (user, server) = s.split_once('@')?;
        if user.is_empty() || server.is_empty() || server.contains('@') {
            return None;
        }
        Some((user, server))
    }

    /// Returns true if the JID has no user part.
    pub fn is_server(&self) -> bool {
        self.user.is_empty()
    }
}

impl fmt::Display for JID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.user.is_empty() {
            write!(f, "{}", self.server)
        } else {
            write!(f, "{}@{}", self.user, self.server)
        }
    }
}

/// Error type for JID parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseJIDError {
    #[error("JID has an empty server part")]
    EmptyServer,
    #[error("JID contains more than one '@'")]
    TooManySeparators,
}

impl FromStr for JID {
    type Err = ParseJIDError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, server) = s.split_once('@').unwrap_or(("", s));
        if server.contains('@') {
            return Err(ParseJIDError::TooManySeparators);
        }
        if server.is_empty() {
            return Err(ParseJIDError::EmptyServer);
        }
        Ok(JID::new(user, server))
    }
}
