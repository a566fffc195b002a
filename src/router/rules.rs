use regex::Regex;

use crate::knowledge::Catalog;
use crate::models::Manual;

/// What a rule looks for in the normalised message.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Any phrase contained in the message.
    Phrases(Vec<&'static str>),
    /// A word-boundary pattern.
    Pattern(Regex),
    /// `pattern` matches while `unless` does not.
    PatternWithout { pattern: Regex, unless: Regex },
    /// The message names a manual from the catalogue. Typos are tolerated
    /// only when `fuzzy_gate` also matches.
    ManualMention { fuzzy_gate: Regex },
    /// `pattern` matches and the session is inside the manual sub-context.
    FollowUp(Regex),
    /// Any of the nested triggers.
    Any(Vec<Trigger>),
}

/// What happens when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Refuse,
    ShowManual,
    ListManuals,
    Clarify,
    ListRemaining,
}

/// One row of the routing table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub trigger: Trigger,
    pub action: Action,
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'t, 'a> {
    pub normalized: &'t str,
    pub catalog: &'a Catalog,
    pub in_manual_context: bool,
}

pub(crate) enum Hit<'a> {
    Plain,
    Manual(&'a Manual),
}

impl Trigger {
    pub(crate) fn hit<'a>(&self, input: &RouteInput<'_, 'a>) -> Option<Hit<'a>> {
        let text = input.normalized;
        let matched = match self {
            Self::Phrases(phrases) => phrases.iter().any(|p| text.contains(p)),
            Self::Pattern(re) => re.is_match(text),
            Self::PatternWithout { pattern, unless } => {
                pattern.is_match(text) && !unless.is_match(text)
            }
            Self::ManualMention { fuzzy_gate } => {
                return input
                    .catalog
                    .find(text, fuzzy_gate.is_match(text))
                    .map(Hit::Manual);
            }
            Self::FollowUp(re) => input.in_manual_context && re.is_match(text),
            Self::Any(triggers) => return triggers.iter().find_map(|t| t.hit(input)),
        };
        matched.then_some(Hit::Plain)
    }
}

/// Build `\b(?:w1|w2|...)\b` from literal words.
pub fn word_pattern(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
        .expect("escaped word list is a valid pattern")
}

/// Questions about the assistant's internals, memory or identity.
pub const META_PHRASES: &[&str] = &[
    "que informacion guard",
    "que datos guard",
    "que sabes",
    "como funcionas",
    "tu memoria",
    "tu conocimiento",
    "que archivos",
    "que modelo sos",
    "que modelo usas",
    "que modelo de ia",
    "tu configuracion",
    "tus instrucciones",
    "system prompt",
    "prompt del sistema",
];

/// Explicit requests for the list of manuals.
pub const LIST_PHRASES: &[&str] = &[
    "que manuales",
    "que manueles",
    "cuales manuales",
    "que guias",
    "que documentos",
    "que tienes en manual",
    "que tenes en manual",
];

/// Words that signal the visitor is after a manual.
pub const MANUAL_INTENT_WORDS: &[&str] = &[
    "manual",
    "manuales",
    "manueles",
    "guia",
    "guias",
    "instructivo",
    "instructivos",
    "documento",
    "documentos",
    "documentacion",
    "instrucciones",
    "comparte",
    "compartir",
    "compartime",
];

pub const LIST_WORDS: &[&str] = &["lista", "listas", "listado"];

/// "Another one?" style follow-ups.
pub const FOLLOW_UP_WORDS: &[&str] = &[
    "otro",
    "otra",
    "otros",
    "otras",
    "alguno mas",
    "alguna mas",
    "hay mas",
    "algo mas",
    "mas manuales",
];

/// The routing table, highest priority first.
///
/// A specific manual beats the generic list. Inside the manual sub-context a
/// follow-up ("¿hay más manuales?") lists only what was not shown yet, ahead
/// of the full list. A message that mentions manuals without naming a known
/// one gets the list rather than a model guess.
pub fn default_rules() -> Vec<Rule> {
    let manual_intent = word_pattern(MANUAL_INTENT_WORDS);

    vec![
        Rule {
            name: "meta_probe",
            trigger: Trigger::Phrases(META_PHRASES.to_vec()),
            action: Action::Refuse,
        },
        Rule {
            name: "specific_manual",
            trigger: Trigger::ManualMention {
                fuzzy_gate: manual_intent.clone(),
            },
            action: Action::ShowManual,
        },
        Rule {
            name: "more_manuals",
            trigger: Trigger::FollowUp(word_pattern(FOLLOW_UP_WORDS)),
            action: Action::ListRemaining,
        },
        Rule {
            name: "list_manuals",
            trigger: Trigger::Any(vec![
                Trigger::Phrases(LIST_PHRASES.to_vec()),
                Trigger::Pattern(manual_intent),
            ]),
            action: Action::ListManuals,
        },
        Rule {
            name: "ambiguous_list",
            trigger: Trigger::PatternWithout {
                pattern: word_pattern(LIST_WORDS),
                unless: word_pattern(&["manual", "manuales"]),
            },
            action: Action::Clarify,
        },
    ]
}
