use serde::{Deserialize, Serialize};

use super::manual::ManualRef;

/// Body of `POST /chat`. A missing message is treated as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /chat`, tagged by `type` for the browser client.
///
/// - `text`: plain text, rendered with `textContent`
/// - `card`: pre-rendered HTML for a single manual
/// - `manual_list`: bulleted titles plus the raw title list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatReply {
    Text {
        content: String,
    },
    Card {
        content: String,
        manual: ManualRef,
    },
    ManualList {
        content: String,
        titles: Vec<String>,
    },
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// The text that gets written to history for this reply.
    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } | Self::Card { content, .. } | Self::ManualList { content, .. } => {
                content
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Card { .. } => "card",
            Self::ManualList { .. } => "manual_list",
        }
    }
}
