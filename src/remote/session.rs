use std::fmt;

use crate::error::TaskError;

/// Bearer token issued by the backend at login or signup.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// The credential every task request is authorized with, or its absence.
///
/// Handed to the remote client at construction; nothing reads the token from
/// ambient state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<SessionToken>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self { token: Some(token) }
    }

    /// Empty or whitespace strings count as no token.
    pub fn from_optional(token: Option<String>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => Self::with_token(SessionToken::new(t.trim())),
            _ => Self::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn bearer(&self) -> Result<&SessionToken, TaskError> {
        self.token.as_ref().ok_or(TaskError::Unauthorized)
    }
}
