use crate::models::{Manual, Session};
use crate::router::{fuzzy, normalize};

/// Shortest token considered for typo-tolerant matching.
const FUZZY_MIN_LEN: usize = 5;

/// The closed set of manuals, with pre-normalised matching keys.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    manual: Manual,
    /// Normalised id, aliases and title.
    names: Vec<String>,
    keywords: Vec<String>,
}

impl Catalog {
    pub fn new(manuals: Vec<Manual>) -> Self {
        let entries = manuals
            .into_iter()
            .map(|manual| {
                let names = manual
                    .names()
                    .map(normalize)
                    .filter(|n| !n.is_empty())
                    .collect();
                let keywords = manual
                    .keywords
                    .iter()
                    .map(|k| normalize(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                Entry {
                    manual,
                    names,
                    keywords,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn manuals(&self) -> impl Iterator<Item = &Manual> {
        self.entries.iter().map(|e| &e.manual)
    }

    pub fn get(&self, id: &str) -> Option<&Manual> {
        self.manuals().find(|m| m.id == id)
    }

    pub fn titles(&self) -> Vec<String> {
        self.manuals().map(|m| m.title.clone()).collect()
    }

    /// Manuals this session has not been offered yet, in catalogue order.
    pub fn unshown<'a>(&'a self, session: &'a Session) -> impl Iterator<Item = &'a Manual> + 'a {
        self.manuals().filter(move |m| !session.has_seen(&m.id))
    }

    /// Find the manual a normalised message refers to.
    ///
    /// Lookup order: a name (id, alias, title) as whole words, preferring the
    /// longest match; then a keyword as whole words; then, only when
    /// `allow_fuzzy` is set, a single-edit typo of a one-word name or keyword.
    pub fn find(&self, normalized: &str, allow_fuzzy: bool) -> Option<&Manual> {
        if normalized.is_empty() {
            return None;
        }
        let padded = format!(" {} ", normalized);

        if let Some(manual) = self.longest_match(&padded, |e| &e.names) {
            return Some(manual);
        }
        if let Some(manual) = self.longest_match(&padded, |e| &e.keywords) {
            return Some(manual);
        }
        if !allow_fuzzy {
            return None;
        }

        let tokens: Vec<&str> = normalized
            .split_whitespace()
            .filter(|t| t.chars().count() >= FUZZY_MIN_LEN)
            .collect();

        self.entries
            .iter()
            .find(|entry| {
                entry
                    .names
                    .iter()
                    .chain(entry.keywords.iter())
                    .filter(|key| !key.contains(' ') && key.chars().count() >= FUZZY_MIN_LEN)
                    .any(|key| tokens.iter().any(|t| fuzzy::within_one_edit(t, key)))
            })
            .map(|e| &e.manual)
    }

    fn longest_match<'a>(
        &'a self,
        padded: &str,
        keys: impl Fn(&'a Entry) -> &'a Vec<String>,
    ) -> Option<&'a Manual> {
        let mut best: Option<(usize, &Manual)> = None;
        for entry in &self.entries {
            for key in keys(entry) {
                if padded.contains(&format!(" {} ", key))
                    && best.map_or(true, |(len, _)| key.len() > len)
                {
                    best = Some((key.len(), &entry.manual));
                }
            }
        }
        best.map(|(_, manual)| manual)
    }
}
