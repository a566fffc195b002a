//! One chat turn: route, short-circuit or ask the model, update the session.

use std::sync::Arc;

use crate::config::ChatSettings;
use crate::knowledge::Knowledge;
use crate::llm::ChatModel;
use crate::models::{ChatReply, Manual, Message, Session};
use crate::router::{Decision, IntentRouter};

pub const PROMPT_FOR_INPUT: &str = "Decime.";
pub const META_REFUSAL: &str = "No tengo información sobre eso.";
pub const NO_MANUALS: &str = "No tengo manuales.";
pub const NO_MORE_MANUALS: &str = "No tengo más manuales.";
pub const CLARIFY_LIST: &str = "¿Lista de qué exactamente?";
pub const INTERNAL_ERROR: &str = "Ocurrió un error interno.";

const LIST_HEADER: &str = "Tengo estos manuales:";
const REMAINING_HEADER: &str = "También tengo:";

/// Stateless turn handler; all per-visitor state lives in the [`Session`].
#[derive(Clone)]
pub struct ChatService {
    knowledge: Arc<Knowledge>,
    router: Arc<IntentRouter>,
    model: Arc<dyn ChatModel>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(
        knowledge: Arc<Knowledge>,
        router: Arc<IntentRouter>,
        model: Arc<dyn ChatModel>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            knowledge,
            router,
            model,
            settings,
        }
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Handle one message against `session`, mutating it in place.
    ///
    /// History gains a user/assistant pair only for manual cards and
    /// successful model answers. A failed model call leaves the history
    /// untouched.
    pub async fn handle(&self, session: &mut Session, message: &str) -> ChatReply {
        let message = message.trim();
        if message.is_empty() {
            return ChatReply::text(PROMPT_FOR_INPUT);
        }

        let catalog = self.knowledge.catalog();
        let routed = self.router.route(message, catalog, session.manual_context);

        let reply = match routed.decision {
            Decision::Refuse => ChatReply::text(META_REFUSAL),
            Decision::ShowManual(manual) => {
                let reply = card_reply(manual);
                session.mark_shown(&manual.id);
                session.manual_context = true;
                session
                    .history
                    .push_turn(message, reply.content(), self.settings.history_cap);
                reply
            }
            Decision::ListManuals => {
                if catalog.is_empty() {
                    ChatReply::text(NO_MANUALS)
                } else {
                    let titles = catalog.titles();
                    for manual in catalog.manuals() {
                        session.mark_shown(&manual.id);
                    }
                    session.manual_context = true;
                    list_reply(LIST_HEADER, titles)
                }
            }
            Decision::Clarify => ChatReply::text(CLARIFY_LIST),
            Decision::ListRemaining => {
                let remaining: Vec<&Manual> = catalog.unshown(session).collect();
                if remaining.is_empty() {
                    ChatReply::text(if catalog.is_empty() {
                        NO_MANUALS
                    } else {
                        NO_MORE_MANUALS
                    })
                } else {
                    let titles = remaining.iter().map(|m| m.title.clone()).collect();
                    let ids: Vec<String> = remaining.iter().map(|m| m.id.clone()).collect();
                    for id in &ids {
                        session.mark_shown(id);
                    }
                    list_reply(REMAINING_HEADER, titles)
                }
            }
            Decision::Model => {
                session.manual_context = false;
                self.ask_model(session, message).await
            }
        };

        if !matches!(routed.decision, Decision::Model) {
            tracing::info!(
                rule = routed.rule.unwrap_or("none"),
                reply = reply.kind(),
                "Short-circuited turn"
            );
        }

        session.touch();
        reply
    }

    /// Assemble system block + history window + user turn and call the model.
    pub fn build_messages(&self, session: &Session, message: &str) -> Vec<Message> {
        let system = self
            .knowledge
            .system_block(&self.settings.context_policy, Some(message));

        let mut messages = Vec::with_capacity(session.history.len() + 2);
        messages.push(Message::system(system));
        messages.extend(session.history.messages().iter().cloned());
        messages.push(Message::user(message));
        messages
    }

    async fn ask_model(&self, session: &mut Session, message: &str) -> ChatReply {
        let messages = self.build_messages(session, message);

        match self.model.complete(&messages).await {
            Ok(answer) => {
                session
                    .history
                    .push_turn(message, answer.as_str(), self.settings.history_cap);
                ChatReply::text(answer)
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), "Model call failed: {}", e);
                ChatReply::text(INTERNAL_ERROR)
            }
        }
    }
}

fn card_reply(manual: &Manual) -> ChatReply {
    ChatReply::Card {
        content: render_card(manual),
        manual: manual.to_ref(),
    }
}

fn list_reply(header: &str, titles: Vec<String>) -> ChatReply {
    let mut content = format!("{}\n", header);
    for title in &titles {
        content.push_str(&format!("\n• {}", title));
    }
    ChatReply::ManualList { content, titles }
}

/// HTML card shown by the browser client with `innerHTML`.
pub fn render_card(manual: &Manual) -> String {
    let mut html = String::from("<div class=\"manual-card\">");
    html.push_str(&format!("<h3>{}</h3>", escape_html(&manual.title)));
    if !manual.summary.trim().is_empty() {
        html.push_str(&format!("<p>{}</p>", escape_html(manual.summary.trim())));
    }
    html.push_str(&format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">Abrir manual</a>",
        escape_html(&manual.url)
    ));
    html.push_str("</div>");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
