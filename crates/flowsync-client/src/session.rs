//! Authentication state owned by one client instance

use std::fmt;

/// Session of an API client
#[derive(Clone, PartialEq, Eq)]
pub enum Session {
    /// Client configured for anonymous access
    Anonymous,
    /// Token required but not acquired yet
    Unauthenticated,
    /// Bearer token returned by the access endpoint
    Token(String),
}

impl Session {
    /// Initial session for a client
    pub fn for_client(anonymous: bool) -> Self {
        if anonymous {
            Session::Anonymous
        } else {
            Session::Unauthenticated
        }
    }

    /// Whether calls may be issued with this session
    pub fn is_usable(&self) -> bool {
        !matches!(self, Session::Unauthenticated)
    }

    /// Value of the `Authorization` header, if any
    pub fn authorization(&self) -> Option<String> {
        match self {
            Session::Token(token) => Some(format!("Bearer {}", token)),
            _ => None,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Anonymous => f.write_str("Anonymous"),
            Session::Unauthenticated => f.write_str("Unauthenticated"),
            Session::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}
