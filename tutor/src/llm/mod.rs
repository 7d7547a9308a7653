//! LLM client module
//!
//! Provides the completion trait, the DeepSeek implementation, and the
//! metered gateway every engine call goes through.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub mod client;
mod deepseek;
mod error;

pub use client::{CompletionRequest, CompletionResponse, LlmClient, Message, Role};
pub use deepseek::DeepSeekClient;
pub use error::LlmError;

use crate::config::LlmConfig;
use crate::usage::UsageCounters;

/// Create an LLM client based on the provider specified in config
///
/// Currently only the "deepseek" provider (OpenAI-compatible wire format)
/// is supported.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "deepseek" => Ok(Arc::new(DeepSeekClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: deepseek",
            other
        ))),
    }
}

/// Metered gateway in front of an [`LlmClient`]
///
/// Applies the fixed per-call timeout (cooperative cancellation) and keeps
/// the process-wide usage counters honest: every call bumps the call
/// counter, successes add a chars/1.5 token estimate, failures bump the
/// error counter. All engine call sites go through here so the stats
/// endpoint sees every call.
#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    usage: Arc<UsageCounters>,
    timeout: Duration,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, usage: Arc<UsageCounters>, timeout: Duration) -> Self {
        Self { client, usage, timeout }
    }

    /// The shared counters backing the stats endpoint
    pub fn usage(&self) -> Arc<UsageCounters> {
        Arc::clone(&self.usage)
    }

    /// Issue one completion call and return the reply text
    pub async fn complete(
        &self,
        system_prompt: &str,
        messages: Vec<Message>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let input_chars: usize =
            system_prompt.chars().count() + messages.iter().map(|m| m.content.chars().count()).sum::<usize>();

        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages,
            max_tokens,
            temperature,
        };

        let result = match tokio::time::timeout(self.timeout, self.client.complete(request)).await {
            Ok(inner) => inner,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        };

        match result {
            Ok(response) => {
                let output_chars = response.content.chars().count();
                let estimated = ((input_chars + output_chars) as f64 / 1.5) as u64;
                self.usage.record_success(estimated);
                debug!(estimated_tokens = estimated, "complete: success");
                Ok(response.content)
            }
            Err(e) => {
                self.usage.record_error();
                warn!(error = %e, "complete: LLM call failed");
                Err(e)
            }
        }
    }
}

/// Extract the JSON payload from a free-text model reply
///
/// Prefers a fenced ```json block; otherwise takes the span from the
/// first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(text[start..=end].trim())
}

#[cfg(test)]
mod tests {
    use super::client::mock::MockLlmClient;
    use super::*;

    #[test]
    fn test_extract_json_fenced_block() {
        let reply = "好的，结果如下：\n```json\n{\"type\": \"SEARCH\"}\n```\n请查收";
        assert_eq!(extract_json(reply), Some("{\"type\": \"SEARCH\"}"));
    }

    #[test]
    fn test_extract_json_brace_span() {
        let reply = "意图是 {\"type\": \"CHAT\", \"keywords\": []} 以上";
        assert_eq!(extract_json(reply), Some("{\"type\": \"CHAT\", \"keywords\": []}"));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json("没有任何结构化内容"), None);
        assert_eq!(extract_json("} 反着的 {"), None);
    }

    #[tokio::test]
    async fn test_gateway_meters_success_and_failure() {
        let usage = Arc::new(UsageCounters::default());
        let client = Arc::new(MockLlmClient::new(vec![
            Ok("回答".to_string()),
            Err("boom".to_string()),
        ]));
        let gateway = LlmGateway::new(client, Arc::clone(&usage), Duration::from_secs(30));

        let ok = gateway.complete("系统", vec![Message::user("你好")], 100, 0.7).await;
        assert!(ok.is_ok());
        let err = gateway.complete("系统", vec![Message::user("你好")], 100, 0.7).await;
        assert!(err.is_err());

        let stats = usage.snapshot();
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.error_count, 1);
        assert!(stats.estimated_tokens > 0);
    }
}
