//! Language understanding over an [`LlmProvider`]: field extraction,
//! confirmation classification, and the cheap keyword checks that run
//! before any model call.

pub mod json;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::launch::draft::PartialDraft;
use crate::launch::fields::{guidance, optional_fields, required_fields};
use crate::llm::{LlmProvider, ProviderError};

#[derive(Debug, Error)]
pub enum NluError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no JSON object in model reply: {0}")]
    NoJson(String),
}

/// Classifier verdict on a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
    Unknown,
}

// ── Keyword checks ───────────────────────────────────────────────────────────

static INTENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(create|launch|make|deploy|mint|start)\b.*\b(tokens?|coins?)\b|\bburst\b").ok()
});

static CANCEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(cancel|abort)\b|\bstart\s+over\b").ok());

/// The user is asking to launch a token.
pub fn wants_token(text: &str) -> bool {
    INTENT.as_ref().is_some_and(|re| re.is_match(text))
}

/// The user wants to abandon the current draft.
pub fn is_cancel(text: &str) -> bool {
    CANCEL.as_ref().is_some_and(|re| re.is_match(text))
}

// ── Prompts ──────────────────────────────────────────────────────────────────

const EXTRACTION_SYSTEM: &str = "You extract token launch parameters from chat messages. \
You reply with a single JSON object and nothing else.";

const CONFIRMATION_SYSTEM: &str = "You decide whether a user is confirming or cancelling a token launch. \
You reply with a single JSON object and nothing else.";

pub fn extraction_prompt(message: &str) -> String {
    let mut fields = String::new();
    for f in required_fields().iter().chain(optional_fields()) {
        if let Ok(g) = guidance(*f) {
            let tag = if f.is_required() { "required" } else { "optional" };
            fields.push_str(&format!(
                "- {name} ({tag}): {desc}. Valid: {valid}. Invalid: {invalid}. {instr}.\n",
                name = f.as_str(),
                desc = g.description,
                valid = g.valid_example,
                invalid = g.invalid_example,
                instr = g.instructions,
            ));
        }
    }

    format!(
        "Extract token launch fields from the user's message.\n\
         \n\
         Rules:\n\
         - Include a field only when the user explicitly states its value in this message.\n\
         - Never copy values from the examples below and never guess.\n\
         - If the message only confirms, cancels, skips or asks a question, return {{}}.\n\
         - dexAllocations is a list of {{\"dex\": \"APEX|JOE|PHARAOH|PANGOLIN\", \"allocation\": <basis points>}}.\n\
         - Numbers are plain JSON numbers without units.\n\
         \n\
         Fields:\n{fields}\n\
         Message:\n{message}\n\
         \n\
         Reply with the JSON object only."
    )
}

pub fn confirmation_prompt(message: &str) -> String {
    format!(
        "The user was shown a token launch summary and asked to confirm it.\n\
         \n\
         Confirmation indicators:\n\
         - Explicit: \"yes\", \"confirm\", \"launch\", \"create\"\n\
         - Implicit: \"let's do it\", \"looks good\", \"ready to go\"\n\
         - Enthusiastic: \"let's launch\", \"let's go\"\n\
         \n\
         Cancellation indicators:\n\
         - Explicit: \"no\", \"cancel\", \"stop\"\n\
         - Implicit: \"need time\", \"not sure\", \"wait\"\n\
         - Hesitant: \"maybe later\", \"let me think\"\n\
         \n\
         If the message does neither (for example it changes a field), return {{}}.\n\
         \n\
         Message:\n{message}\n\
         \n\
         Reply with {{\"isConfirmed\": true}} or {{\"isConfirmed\": false}} or {{}}."
    )
}

// ── Nlu ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Nlu {
    provider: LlmProvider,
}

impl Nlu {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    /// Fields the user stated in `message`. Empty when nothing relevant was said.
    pub async fn extract(&self, message: &str) -> Result<PartialDraft, NluError> {
        let reply = self
            .provider
            .complete(&extraction_prompt(message), Some(EXTRACTION_SYSTEM))
            .await?;
        let value = json::parse_object(&reply).ok_or_else(|| NluError::NoJson(clip(&reply)))?;
        let mut partial = PartialDraft::from_json(&value);
        drop_unstated(&mut partial, message);
        debug!(empty = partial.is_empty(), "extraction parsed");
        Ok(partial)
    }

    /// Tri-state verdict. Provider and parse failures read as `Unknown`.
    pub async fn classify(&self, message: &str) -> Confirmation {
        let reply = match self
            .provider
            .complete(&confirmation_prompt(message), Some(CONFIRMATION_SYSTEM))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("confirmation classifier failed: {e}");
                return Confirmation::Unknown;
            }
        };
        let verdict = json::parse_object(&reply)
            .as_ref()
            .and_then(|v| v.get("isConfirmed"))
            .map(verdict_of)
            .unwrap_or(Confirmation::Unknown);
        debug!(?verdict, "confirmation classified");
        verdict
    }
}

fn verdict_of(value: &Value) -> Confirmation {
    match value {
        Value::Bool(true) => Confirmation::Confirmed,
        Value::Bool(false) => Confirmation::Declined,
        Value::String(s) if s.eq_ignore_ascii_case("true") => Confirmation::Confirmed,
        Value::String(s) if s.eq_ignore_ascii_case("false") => Confirmation::Declined,
        _ => Confirmation::Unknown,
    }
}

/// Identifiers the user must have typed verbatim. A model that returns a
/// name, symbol or address absent from the message is guessing.
fn drop_unstated(partial: &mut PartialDraft, message: &str) {
    let haystack = message.to_lowercase();
    for (label, slot) in [
        ("name", &mut partial.name),
        ("symbol", &mut partial.symbol),
        ("creatorAddress", &mut partial.creator_address),
    ] {
        if let Some(v) = slot.as_deref() {
            if !haystack.contains(&v.to_lowercase()) {
                debug!(field = label, value = %v, "dropping value not present in message");
                *slot = None;
            }
        }
    }
}

fn clip(s: &str) -> String {
    s.chars().take(120).collect()
}
