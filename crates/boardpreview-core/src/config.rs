#![forbid(unsafe_code)]

//! Preview configuration.
//!
//! Hosts build a [`PreviewConfig`] from defaults or from a JSON object
//! (the web host receives it as a JS options value). Unknown keys are
//! rejected so typos surface early.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::BoardId;

/// Placeholder substituted with the board identifier in
/// [`PreviewConfig::board_url_template`].
pub const BOARD_PLACEHOLDER: &str = "{board}";

/// What to do with a load that completes after a newer one was submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleLoadPolicy {
    /// Drop completions whose ticket is not the latest.
    #[default]
    Discard,
    /// Apply every completion in arrival order; a slow earlier fetch can
    /// overwrite a newer board.
    Apply,
}

/// Configuration shared by every host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PreviewConfig {
    /// URL of a board's JSON export; `{board}` is replaced by the identifier.
    /// Default: `https://trello.com/b/{board}.json`
    pub board_url_template: String,

    /// Tag carried by in-frame navigation messages.
    /// Default: `boardpreview:navigate`
    pub message_type: String,

    /// Default: [`StaleLoadPolicy::Discard`]
    pub stale_load_policy: StaleLoadPolicy,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            board_url_template: format!("https://trello.com/b/{BOARD_PLACEHOLDER}.json"),
            message_type: "boardpreview:navigate".to_owned(),
            stale_load_policy: StaleLoadPolicy::Discard,
        }
    }
}

impl PreviewConfig {
    /// Parse and validate a JSON configuration object. Missing keys take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.board_url_template.contains(BOARD_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder(
                self.board_url_template.clone(),
            ));
        }
        if self.message_type.trim().is_empty() {
            return Err(ConfigError::EmptyMessageType);
        }
        Ok(())
    }

    /// Data source URL for `board`.
    #[must_use]
    pub fn board_url(&self, board: &BoardId) -> String {
        self.board_url_template
            .replace(BOARD_PLACEHOLDER, board.as_str())
    }
}

/// Invalid preview configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The input was not a valid configuration object.
    Json(String),
    /// `boardUrlTemplate` lacks the `{board}` placeholder.
    MissingPlaceholder(String),
    /// `messageType` is blank.
    EmptyMessageType,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "invalid preview config: {msg}"),
            Self::MissingPlaceholder(template) => write!(
                f,
                "board URL template {template:?} has no {BOARD_PLACEHOLDER} placeholder"
            ),
            Self::EmptyMessageType => f.write_str("message type must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
