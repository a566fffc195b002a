//! Static knowledge loaded once at startup.
//!
//! A knowledge directory contains:
//!
//! - `system_prompt.txt`: the persona and rules, always the first segment sent to the model
//! - `domains.json`: list of [`DomainSource`] entries naming the text files of each domain
//! - `manuales.json`: the closed manual catalogue (array, or `{"manuales": [...]}`)
//!
//! Missing files degrade (default prompt, empty sets) with a warning. Malformed
//! JSON is a startup error.

mod catalog;
mod context;

pub use catalog::Catalog;
pub use context::{ContextPolicy, KNOWLEDGE_HEADER};

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Domain, DomainSource, Manual};

pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";
pub const DOMAINS_FILE: &str = "domains.json";
pub const MANUALS_FILE: &str = "manuales.json";

/// Used when the knowledge directory has no system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Sos AlmostMe, un asistente personal. \
Respondé en español, de forma breve y directa. \
Usá solo la información autorizada que se te da. \
Si no sabés algo, decí que no tenés información sobre eso. \
Nunca inventes manuales, enlaces ni datos personales.";

/// Immutable knowledge shared by every request.
#[derive(Debug, Clone)]
pub struct Knowledge {
    system_prompt: String,
    /// Sorted by descending priority, then name.
    domains: Vec<Domain>,
    catalog: Catalog,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManualFile {
    List(Vec<Manual>),
    Wrapped { manuales: Vec<Manual> },
}

impl Knowledge {
    pub fn new(
        system_prompt: impl Into<String>,
        mut domains: Vec<Domain>,
        manuals: Vec<Manual>,
    ) -> Self {
        domains.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        Self {
            system_prompt: system_prompt.into(),
            domains,
            catalog: Catalog::new(manuals),
        }
    }

    /// Knowledge with the default prompt and nothing else.
    pub fn empty() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, Vec::new(), Vec::new())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            tracing::warn!(
                "Knowledge directory {} not found, running without knowledge",
                dir.display()
            );
            return Ok(Self::empty());
        }

        let system_prompt = match read_optional(&dir.join(SYSTEM_PROMPT_FILE))? {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => {
                tracing::warn!("No {} found, using default prompt", SYSTEM_PROMPT_FILE);
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        };

        let domains = load_domains(dir)?;
        let manuals = load_manuals(dir)?;

        tracing::info!(
            "Loaded knowledge from {}: {} domains, {} manuals",
            dir.display(),
            domains.len(),
            manuals.len()
        );

        Ok(Self::new(system_prompt, domains, manuals))
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Assemble the system message for one turn.
    pub fn system_block(&self, policy: &ContextPolicy, message: Option<&str>) -> String {
        context::build(&self.system_prompt, &self.domains, policy, message)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn load_domains(dir: &Path) -> Result<Vec<Domain>> {
    let Some(raw) = read_optional(&dir.join(DOMAINS_FILE))? else {
        tracing::warn!("No {} found, no domain knowledge loaded", DOMAINS_FILE);
        return Ok(Vec::new());
    };

    let sources: Vec<DomainSource> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid {}", DOMAINS_FILE))?;

    let mut domains = Vec::with_capacity(sources.len());
    for source in sources {
        let mut parts = Vec::new();
        for file in &source.files {
            match read_optional(&dir.join(file))? {
                Some(text) if !text.trim().is_empty() => parts.push(text.trim().to_string()),
                Some(_) => tracing::warn!("Domain {}: {} is empty", source.name, file),
                None => tracing::warn!("Domain {}: {} not found, skipping", source.name, file),
            }
        }

        if parts.is_empty() {
            tracing::warn!("Domain {} has no content, skipping", source.name);
            continue;
        }

        domains.push(Domain {
            name: source.name,
            priority: source.priority,
            keywords: source.keywords,
            content: parts.join("\n\n"),
        });
    }

    Ok(domains)
}

fn load_manuals(dir: &Path) -> Result<Vec<Manual>> {
    let Some(raw) = read_optional(&dir.join(MANUALS_FILE))? else {
        tracing::warn!("No {} found, manual catalogue is empty", MANUALS_FILE);
        return Ok(Vec::new());
    };

    let file: ManualFile =
        serde_json::from_str(&raw).with_context(|| format!("Invalid {}", MANUALS_FILE))?;
    Ok(match file {
        ManualFile::List(manuals) | ManualFile::Wrapped { manuales: manuals } => manuals,
    })
}
