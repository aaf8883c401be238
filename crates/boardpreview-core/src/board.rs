#![forbid(unsafe_code)]

//! Board identity, raw board content, and load failures.

use std::fmt;

/// Raw content of a board as returned by the data source (a Trello JSON export).
pub type BoardData = serde_json::Value;

/// Identifier of the board currently being previewed.
///
/// Always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardId(String);

impl BoardId {
    /// Parse user or address-bar input. Surrounding whitespace is ignored;
    /// blank input yields `None`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BoardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Broad category of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    /// The request never produced a response.
    Network,
    /// The server answered with a non-success status.
    Status(u16),
    /// The response body was not valid board JSON.
    Decode,
    /// The route provider rejected the board content.
    Provider,
}

/// A failed board load, kept on the navigation state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    kind: LoadErrorKind,
    message: String,
}

impl LoadError {
    #[must_use]
    pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Network, message)
    }

    #[must_use]
    pub fn status(code: u16) -> Self {
        Self::new(
            LoadErrorKind::Status(code),
            format!("Request failed with status code {code}"),
        )
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Decode, message)
    }

    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::Provider, message)
    }

    #[must_use]
    pub const fn kind(&self) -> LoadErrorKind {
        self.kind
    }

    /// Human-readable message shown to the user.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for LoadError {}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_id_trims_and_rejects_blank() {
        assert_eq!(BoardId::parse("  abc \n").unwrap().as_str(), "abc");
        assert_eq!(BoardId::parse(""), None);
        assert_eq!(BoardId::parse(" \t "), None);
    }

    #[test]
    fn status_error_carries_code_and_message() {
        let err = LoadError::status(404);
        assert_eq!(err.kind(), LoadErrorKind::Status(404));
        assert_eq!(err.to_string(), "Request failed with status code 404");
    }

    #[test]
    fn json_errors_become_decode_failures() {
        let err: LoadError = serde_json::from_str::<BoardData>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), LoadErrorKind::Decode);
        assert!(!err.message().is_empty());
    }
}
