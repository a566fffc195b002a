//! Intent routing: decide locally whether a message needs the model at all.
//!
//! Routing is a declarative table of [`Rule`]s evaluated top to bottom on the
//! normalised message. The first rule that fires wins, regardless of how
//! well a later rule would have matched. When no rule fires the message goes
//! to the model.

pub mod fuzzy;
mod normalize;
mod rules;

pub use normalize::normalize;
pub use rules::*;

use crate::knowledge::Catalog;
use crate::models::Manual;

/// The handling path chosen for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// Meta-information probe: fixed refusal.
    Refuse,
    /// A specific manual from the catalogue.
    ShowManual(&'a Manual),
    /// The full list of manual titles.
    ListManuals,
    /// Ambiguous list request: ask what list.
    Clarify,
    /// Follow-up inside the manual sub-context: manuals not shown yet.
    ListRemaining,
    /// Nothing matched: ask the model.
    Model,
}

impl Decision<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Refuse => "refuse",
            Self::ShowManual(_) => "show_manual",
            Self::ListManuals => "list_manuals",
            Self::Clarify => "clarify",
            Self::ListRemaining => "list_remaining",
            Self::Model => "model",
        }
    }
}

/// Result of routing one message.
#[derive(Debug, Clone)]
pub struct Routed<'a> {
    pub normalized: String,
    pub decision: Decision<'a>,
    /// Name of the rule that fired, `None` for the model fallback.
    pub rule: Option<&'static str>,
}

/// Ordered rule table.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    rules: Vec<Rule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl IntentRouter {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn route<'a>(
        &self,
        message: &str,
        catalog: &'a Catalog,
        in_manual_context: bool,
    ) -> Routed<'a> {
        let normalized = normalize(message);
        let input = RouteInput {
            normalized: &normalized,
            catalog,
            in_manual_context,
        };

        for rule in &self.rules {
            if let Some(decision) = decide(rule, &input) {
                tracing::debug!(rule = rule.name, decision = decision.name(), "Rule matched");
                return Routed {
                    decision,
                    rule: Some(rule.name),
                    normalized,
                };
            }
        }

        Routed {
            decision: Decision::Model,
            rule: None,
            normalized,
        }
    }
}

fn decide<'a>(rule: &Rule, input: &RouteInput<'_, 'a>) -> Option<Decision<'a>> {
    let hit = rule.trigger.hit(input)?;
    let decision = match (rule.action, hit) {
        (Action::ShowManual, Hit::Manual(manual)) => Decision::ShowManual(manual),
        // A manual action with nothing to show cannot fire.
        (Action::ShowManual, Hit::Plain) => return None,
        (Action::Refuse, _) => Decision::Refuse,
        (Action::ListManuals, _) => Decision::ListManuals,
        (Action::Clarify, _) => Decision::Clarify,
        (Action::ListRemaining, _) => Decision::ListRemaining,
    };
    Some(decision)
}
