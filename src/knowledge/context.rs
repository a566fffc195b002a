use std::collections::HashSet;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::models::Domain;
use crate::router::normalize;

/// Heading that introduces the authorized facts block.
pub const KNOWLEDGE_HEADER: &str = "INFORMACIÓN AUTORIZADA:";

/// How much of the domain knowledge goes into a turn's system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextPolicy {
    /// Every loaded domain.
    #[default]
    All,
    /// The domain that best matches the message, plus `extra` others by priority.
    Ranked { extra: usize },
    /// As many domains as fit in `max_chars`, highest priority first.
    Budget { max_chars: usize },
}

impl FromStr for ContextPolicy {
    type Err = ConfigError;

    /// Parses `all`, `ranked`, `ranked:<extra>` or `budget:<chars>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPolicy(s.to_string());
        let (kind, arg) = match s.trim().split_once(':') {
            Some((kind, arg)) => (kind, Some(arg.trim())),
            None => (s.trim(), None),
        };

        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("all", None) => Ok(Self::All),
            ("ranked", None) => Ok(Self::Ranked { extra: 2 }),
            ("ranked", Some(n)) => n
                .parse()
                .map(|extra| Self::Ranked { extra })
                .map_err(|_| invalid()),
            ("budget", Some(n)) => n
                .parse()
                .map(|max_chars| Self::Budget { max_chars })
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Build the system message: prompt first, then the selected domains in
/// priority order. `domains` must already be sorted by priority.
pub(crate) fn build(
    system_prompt: &str,
    domains: &[Domain],
    policy: &ContextPolicy,
    message: Option<&str>,
) -> String {
    let selected: Vec<&Domain> = match *policy {
        ContextPolicy::All => domains.iter().collect(),
        ContextPolicy::Ranked { extra } => select_ranked(domains, message, extra),
        ContextPolicy::Budget { max_chars } => select_within_budget(system_prompt, domains, max_chars),
    };
    render(system_prompt, &selected)
}

fn render(system_prompt: &str, selected: &[&Domain]) -> String {
    let mut out = system_prompt.to_string();
    if selected.is_empty() {
        return out;
    }

    out.push_str("\n\n");
    out.push_str(KNOWLEDGE_HEADER);
    for domain in selected {
        out.push_str(&section(domain));
    }
    out
}

fn section(domain: &Domain) -> String {
    format!("\n\n### {}\n{}", domain.name, domain.content)
}

/// Keyword overlap between a message and a domain's keywords plus name.
fn score(domain: &Domain, message_tokens: &HashSet<String>) -> usize {
    let mut terms: HashSet<String> = domain
        .keywords
        .iter()
        .flat_map(|k| normalize(k).split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect();
    terms.extend(normalize(&domain.name).split_whitespace().map(str::to_string));
    terms.intersection(message_tokens).count()
}

fn select_ranked<'a>(domains: &'a [Domain], message: Option<&str>, extra: usize) -> Vec<&'a Domain> {
    let tokens: HashSet<String> = message
        .map(|m| normalize(m).split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    // First highest score wins, so ties go to the higher-priority domain.
    let mut best: Option<(usize, usize)> = None;
    for (i, domain) in domains.iter().enumerate() {
        let s = score(domain, &tokens);
        if s > 0 && best.map_or(true, |(_, top)| s > top) {
            best = Some((i, s));
        }
    }

    // No match: fill the same number of slots by priority alone.
    let Some((best_idx, _)) = best else {
        return domains.iter().take(extra + 1).collect();
    };

    let others: Vec<usize> = (0..domains.len())
        .filter(|&i| i != best_idx)
        .take(extra)
        .collect();

    domains
        .iter()
        .enumerate()
        .filter(|(i, _)| *i == best_idx || others.contains(i))
        .map(|(_, d)| d)
        .collect()
}

fn select_within_budget<'a>(
    system_prompt: &str,
    domains: &'a [Domain],
    max_chars: usize,
) -> Vec<&'a Domain> {
    let mut used = system_prompt.chars().count() + 2 + KNOWLEDGE_HEADER.chars().count();
    let mut selected = Vec::new();
    for domain in domains {
        let cost = section(domain).chars().count();
        if used + cost <= max_chars {
            used += cost;
            selected.push(domain);
        } else {
            tracing::debug!("Domain {} does not fit the context budget", domain.name);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policies() {
        assert_eq!("all".parse::<ContextPolicy>().unwrap(), ContextPolicy::All);
        assert_eq!(
            "ranked".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::Ranked { extra: 2 }
        );
        assert_eq!(
            "ranked:0".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::Ranked { extra: 0 }
        );
        assert_eq!(
            "Budget:8000".parse::<ContextPolicy>().unwrap(),
            ContextPolicy::Budget { max_chars: 8000 }
        );
    }

    #[test]
    fn rejects_unknown_policies() {
        assert!("everything".parse::<ContextPolicy>().is_err());
        assert!("budget".parse::<ContextPolicy>().is_err());
        assert!("ranked:many".parse::<ContextPolicy>().is_err());
    }
}
