//! Model-backed classifier and the fallback decorator

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Intent, IntentKind, IntentSource, RuleClassifier};
use crate::llm::{LlmError, LlmGateway, Message, extract_json};
use crate::prompts;

/// Most recent history turns forwarded to the model
const HISTORY_LIMIT: usize = 10;

/// Intent analysis token budget and temperature
const INTENT_MAX_TOKENS: u32 = 200;
const INTENT_TEMPERATURE: f32 = 0.3;

/// Keep only the most recent turns, ordering preserved
fn truncate_history(history: &[Message]) -> &[Message] {
    if history.len() <= HISTORY_LIMIT {
        history
    } else {
        &history[history.len() - HISTORY_LIMIT..]
    }
}

/// Raw JSON payload the model is instructed to return
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reason: String,
}

/// Classifier that delegates to the language model
pub struct ModelClassifier {
    gateway: LlmGateway,
}

impl ModelClassifier {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }

    /// One model call, scraped and decoded into an [`Intent`]
    pub async fn classify(&self, message: &str, history: &[Message]) -> Result<Intent, LlmError> {
        let mut messages: Vec<Message> = truncate_history(history).to_vec();
        messages.push(Message::user(format!("分析这个输入的意图：{message}")));

        let reply = self
            .gateway
            .complete(prompts::INTENT, messages, INTENT_MAX_TOKENS, INTENT_TEMPERATURE)
            .await?;

        let json = extract_json(&reply)
            .ok_or_else(|| LlmError::InvalidResponse(format!("No JSON in intent reply: {reply}")))?;
        let raw: RawIntent = serde_json::from_str(json)?;

        let kind = match raw.kind.as_str() {
            "SEARCH" => IntentKind::Search,
            "PATH" => IntentKind::Path,
            "LEARN" => IntentKind::Learn,
            "CONTRIBUTE" => IntentKind::Contribute,
            "CHAT" => IntentKind::Chat,
            other => {
                return Err(LlmError::InvalidResponse(format!("Unknown intent type: {other}")));
            }
        };

        Ok(Intent {
            kind,
            keywords: raw.keywords,
            confidence: raw.confidence.clamp(0.0, 1.0),
            reason: raw.reason,
            source: IntentSource::Model,
        })
    }
}

/// Model-first classifier with a deterministic safety net
///
/// Tries the model; any fault (call failure, timeout, unusable reply)
/// silently routes to the rule-based fallback. Never fails.
pub struct IntentClassifier {
    model: ModelClassifier,
    rules: RuleClassifier,
}

impl IntentClassifier {
    pub fn new(gateway: LlmGateway) -> Self {
        Self {
            model: ModelClassifier::new(gateway),
            rules: RuleClassifier::new(),
        }
    }

    /// Classify a message; guaranteed to return a well-formed intent
    pub async fn classify(&self, message: &str, history: &[Message]) -> Intent {
        match self.model.classify(message, history).await {
            Ok(intent) => {
                info!(kind = %intent.kind, confidence = intent.confidence, source = "model", "intent classified");
                intent
            }
            Err(e) => {
                warn!(error = %e, "model classification failed, using fallback");
                let intent = self.rules.classify(message);
                debug!(kind = %intent.kind, source = "fallback", "intent classified");
                intent
            }
        }
    }
}
