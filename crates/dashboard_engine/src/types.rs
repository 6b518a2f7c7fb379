use std::fmt;

use serde_json::Value;

use crate::auth::AuthError;

/// Longest upstream body excerpt carried in an error message.
const MAX_MESSAGE_CHARS: usize = 200;

/// Failure of a single request against the orchestration service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Builds an error for a non-success response, preferring the service's
    /// own message over the raw body.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        Self::new(FailureKind::HttpStatus(status), upstream_message(status, body))
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        Self::new(FailureKind::Decode, err.to_string())
    }

    pub fn auth_error(&self) -> Option<&AuthError> {
        match &self.kind {
            FailureKind::Auth(err) => Some(err),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(status) => Some(status),
            _ => None,
        }
    }
}

impl From<AuthError> for RequestError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        Self::new(FailureKind::Auth(err), message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Auth(AuthError),
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Auth(_) => write!(f, "authentication failed"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
        }
    }
}

fn upstream_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "detail", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                if !text.trim().is_empty() {
                    return truncate(text.trim());
                }
            }
        }
    }
    if body.is_empty() {
        return reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("no response body")
            .to_string();
    }
    truncate(body)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
    cut.push('…');
    cut
}
