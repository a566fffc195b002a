use serde::{Deserialize, Serialize};

/// A piece of reference documentation the assistant may hand out verbatim.
///
/// Manuals are loaded once from `manuales.json` and never change while the
/// process runs. The router only ever answers with manuals from this set;
/// a request for anything else gets the list of what exists instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manual {
    /// Primary matching key, e.g. `"piscina"`.
    pub id: String,
    /// Extra matching keys (synonyms, regional spellings).
    #[serde(default)]
    pub aliases: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub url: String,
    /// Trigger words that identify this manual without naming it.
    #[serde(default, alias = "tags")]
    pub keywords: Vec<String>,
}

impl Manual {
    /// Every string that names this manual directly: id, aliases and title.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .chain(std::iter::once(self.title.as_str()))
    }

    pub fn to_ref(&self) -> ManualRef {
        ManualRef {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Minimal manual info included in card replies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManualRef {
    pub id: String,
    pub title: String,
    pub url: String,
}
