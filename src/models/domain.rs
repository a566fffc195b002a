use serde::{Deserialize, Serialize};

/// A named block of authorized background knowledge.
///
/// Higher `priority` means more relevant: domains are always rendered in
/// descending priority, and when only a subset fits the context budget the
/// highest-priority ones win.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub name: String,
    pub priority: i32,
    /// Words used for relevance scoring against the incoming message.
    pub keywords: Vec<String>,
    /// Concatenated text of every file listed for this domain.
    pub content: String,
}

/// One entry of `domains.json`: which files make up a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSource {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    /// Paths relative to the knowledge directory.
    pub files: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}
