#![forbid(unsafe_code)]

//! Navigation messages posted from the preview frame to the embedding window.
//!
//! The interception script posts `{ "type": <tag>, "path": <pathname> }` to
//! its parent. The window receives every `message` event on the page, so a
//! message is only turned into a navigation when:
//!
//! 1. the event origin equals the page origin (the frame shares it),
//! 2. the payload decodes as a [`NavigateMessage`],
//! 3. its `type` equals the configured message type,
//! 4. its `path` is root-relative with a single leading slash.
//!
//! # Failure Modes
//!
//! Rejected messages are reported as [`Rejection`] and dropped by the
//! listener; they never reach the coordinator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload of a navigation request from the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

/// Why a `message` event was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Posted by a window with another origin.
    Origin,
    /// Not a `{ type, path }` object.
    Malformed,
    /// Some other script's message.
    OtherType,
    /// Path is not a single-slash root-relative path.
    Path,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("message from foreign origin"),
            Self::Malformed => f.write_str("malformed message payload"),
            Self::OtherType => f.write_str("unrelated message type"),
            Self::Path => f.write_str("message path is not root-relative"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Validate a `message` event and return the path to navigate to.
///
/// `data_json` is the event data serialized with `JSON.stringify`.
pub fn accept_message(
    origin: &str,
    page_origin: &str,
    data_json: &str,
    message_type: &str,
) -> Result<String, Rejection> {
    if origin != page_origin {
        return Err(Rejection::Origin);
    }
    let message: NavigateMessage =
        serde_json::from_str(data_json).map_err(|_| Rejection::Malformed)?;
    if message.kind != message_type {
        return Err(Rejection::OtherType);
    }
    if !message.path.starts_with('/') || message.path.starts_with("//") {
        return Err(Rejection::Path);
    }
    Ok(message.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORIGIN: &str = "http://localhost:3000";
    const TAG: &str = "boardpreview:navigate";

    fn accept(origin: &str, data: &str) -> Result<String, Rejection> {
        accept_message(origin, ORIGIN, data, TAG)
    }

    #[test]
    fn accepts_own_navigation() {
        let data = r#"{"type":"boardpreview:navigate","path":"/sub"}"#;
        assert_eq!(accept(ORIGIN, data), Ok("/sub".to_owned()));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let data = r#"{"type":"boardpreview:navigate","path":"/","source":"devtools"}"#;
        assert_eq!(accept(ORIGIN, data), Ok("/".to_owned()));
    }

    #[test]
    fn foreign_origin_is_rejected_before_decoding() {
        assert_eq!(accept("https://evil.example", "not json"), Err(Rejection::Origin));
    }

    #[test]
    fn unrelated_payloads_are_rejected() {
        assert_eq!(accept(ORIGIN, "\"hello\""), Err(Rejection::Malformed));
        assert_eq!(accept(ORIGIN, r#"{"type":"boardpreview:navigate"}"#), Err(Rejection::Malformed));
        assert_eq!(
            accept(ORIGIN, r#"{"type":"webpackOk","path":"/"}"#),
            Err(Rejection::OtherType)
        );
    }

    #[test]
    fn non_root_relative_paths_are_rejected() {
        for path in ["sub", "//evil.com/x", ""] {
            let data = serde_json::to_string(&NavigateMessage {
                kind: TAG.to_owned(),
                path: path.to_owned(),
            })
            .unwrap();
            assert_eq!(accept(ORIGIN, &data), Err(Rejection::Path), "path {path:?}");
        }
    }
}
