//! Dialogue orchestrator
//!
//! Top-level state machine for one message: classify, dispatch on the
//! intent type, retrieve or compute, narrate, respond. Every fault is
//! absorbed before it reaches the caller: `handle_message` always
//! returns a well-formed envelope.

use std::sync::Arc;

use eyre::Result;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use kgraph::{GraphStore, KnowledgeGraph};

use crate::config::Config;
use crate::contribution::{ConceptSubmission, ContributionOutcome, ContributionPipeline, LoggingLedger, RewardLedger};
use crate::graph::{GraphAccess, KnowledgeSummary};
use crate::intent::{Intent, IntentClassifier, IntentKind};
use crate::llm::{LlmClient, LlmGateway, Message, create_client};
use crate::planner::{LearningPath, Planner, parse_learning_goal};
use crate::prompts;
use crate::usage::{UsageCounters, UsageStats};

/// Default starting topic when planning from scratch
const DEFAULT_START_TOPIC: &str = "编程基础";

/// Placeholder for the learner's current topic until progress tracking
/// is wired in from the user service
const DEFAULT_CURRENT_TOPIC: &str = "Python编程";

/// Fixed user-facing message for the top-level catch
const ERROR_CONTENT: &str = "抱歉，系统出现了一些问题，请稍后重试。";

/// Clarification request when path planning lacks information
const CLARIFY_CONTENT: &str = "我正在为您量身定制学习路径！请告诉我：\n\n1. 您的编程基础如何？（零基础/有基础/较熟练）\n2. 您的学习目标是什么？（如：做网站、数据分析、找工作）\n3. 每天可以投入多长时间学习？\n\n这样我就能为您规划出最适合的学习路径！ 🎯";

/// Envelope type of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    KnowledgeSearch,
    LearningPath,
    PathPlanning,
    LearningAssistance,
    ContributionRequest,
    GeneralChat,
    Error,
}

/// Uniform response envelope returned for every message
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub content: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
}

impl Response {
    fn new(kind: ResponseKind, content: String, data: serde_json::Value, next_action: &str) -> Self {
        Self {
            kind,
            content,
            data,
            next_action: Some(next_action.to_string()),
        }
    }

    /// The generic error envelope; the cause is logged, never exposed
    fn error() -> Self {
        Self {
            kind: ResponseKind::Error,
            content: ERROR_CONTENT.to_string(),
            data: json!({}),
            next_action: None,
        }
    }
}

/// The tutoring engine
///
/// Holds no per-conversation state; callers pass history explicitly, so
/// one shared engine serves unrelated messages concurrently. The usage
/// counters are the only cross-request mutable state.
pub struct TutorEngine {
    gateway: LlmGateway,
    graph: GraphAccess,
    planner: Planner,
    classifier: IntentClassifier,
    contribution: ContributionPipeline,
}

impl TutorEngine {
    /// Assemble an engine from collaborator trait objects
    pub fn new(
        client: Arc<dyn LlmClient>,
        store: Arc<dyn GraphStore>,
        ledger: Arc<dyn RewardLedger>,
        config: &Config,
    ) -> Self {
        let usage = Arc::new(UsageCounters::default());
        let gateway = LlmGateway::new(client, usage, std::time::Duration::from_millis(config.llm.timeout_ms));
        let graph = GraphAccess::new(store);
        Self {
            planner: Planner::new(graph.clone()),
            classifier: IntentClassifier::new(gateway.clone()),
            contribution: ContributionPipeline::new(graph.clone(), ledger, config.reward.contribution_amount),
            gateway,
            graph,
        }
    }

    /// Build an engine from configuration with the default collaborators
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_client(&config.llm)?;
        let store: Arc<dyn GraphStore> = Arc::new(KnowledgeGraph::open(&config.graph.path)?);
        Ok(Self::new(client, store, Arc::new(LoggingLedger), config))
    }

    /// Handle one user message; always returns an envelope
    pub async fn handle_message(&self, user_id: &str, message: &str, history: &[Message]) -> Response {
        let intent = self.classifier.classify(message, history).await;
        info!(
            user_id,
            kind = %intent.kind,
            source = ?intent.source,
            confidence = intent.confidence,
            "handling message"
        );

        let result = match intent.kind {
            IntentKind::Search => self.handle_search(user_id, message, &intent).await,
            IntentKind::Path => self.handle_path(message, &intent).await,
            IntentKind::Learn => self.handle_learn(message).await,
            IntentKind::Contribute => self.handle_contribute(message, &intent).await,
            IntentKind::Chat => self.handle_chat(message).await,
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                error!(user_id, error = %e, "message handling failed");
                Response::error()
            }
        }
    }

    /// Keyword search entry point (read-only)
    pub fn search_knowledge(&self, query: &str) -> Vec<KnowledgeSummary> {
        self.graph.search_by_keywords(&[query.to_string()])
    }

    /// Path planning entry point (read-only)
    pub fn plan_path(&self, start_topic: &str, end_topic: &str) -> Vec<LearningPath> {
        self.planner.plan(start_topic, end_topic)
    }

    /// Stage a learner-supplied concept
    pub fn stage_contribution(&self, user_id: &str, submission: ConceptSubmission) -> ContributionOutcome {
        self.contribution.stage(user_id, submission)
    }

    /// Snapshot of the LLM usage counters
    pub fn usage_stats(&self) -> UsageStats {
        self.gateway.usage().snapshot()
    }

    /// Best-effort narration: persona call, apology on failure
    async fn narrate(&self, system_prompt: &str, user_text: String, max_tokens: u32, temperature: f32) -> String {
        match self
            .gateway
            .complete(system_prompt, vec![Message::user(user_text)], max_tokens, temperature)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "narration call failed");
                prompts::APOLOGY.to_string()
            }
        }
    }

    async fn handle_search(&self, user_id: &str, message: &str, intent: &Intent) -> Result<Response> {
        let hits = self.graph.search_by_keywords(&intent.keywords);
        if hits.is_empty() {
            // Unmatched query doubles as a candidate contribution
            info!(user_id, "no search results, trying contribution branch");
            return self.handle_contribute(message, intent).await;
        }

        let summary = hits
            .iter()
            .take(5)
            .map(|h| {
                format!(
                    "• {}: {} (难度: {}, 时长: {})",
                    h.name, h.description, h.difficulty, h.estimated_time
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let content = self
            .narrate(
                prompts::SEARCH,
                format!("用户询问: {message}\n\n找到的知识点:\n{summary}"),
                300,
                0.8,
            )
            .await;

        Ok(Response::new(
            ResponseKind::KnowledgeSearch,
            content,
            json!({ "knowledge_points": hits, "has_results": true }),
            "wait_for_selection",
        ))
    }

    async fn handle_path(&self, message: &str, intent: &Intent) -> Result<Response> {
        let goal = parse_learning_goal(&self.gateway, message, intent).await;
        let paths = self.planner.plan(DEFAULT_START_TOPIC, &goal.topic);

        if paths.is_empty() {
            return Ok(Response::new(
                ResponseKind::PathPlanning,
                CLARIFY_CONTENT.to_string(),
                json!({ "need_more_info": true }),
                "collect_goal_info",
            ));
        }

        let mut summary = String::new();
        for (i, path) in paths.iter().take(2).enumerate() {
            summary.push_str(&format!(
                "\n路径{} (总时长: {}, 难度: {}):\n",
                i + 1,
                path.estimated_total_time,
                path.difficulty_level
            ));
            for step in path.nodes.iter().take(5) {
                summary.push_str(&format!("  {}. {} ({})\n", step.step, step.name, step.estimated_time));
            }
        }
        let content = self
            .narrate(
                prompts::PATH,
                format!(
                    "用户请求: {message}\n学习目标: {} ({}, {})\n\n推荐路径:{summary}",
                    goal.topic, goal.level, goal.goal
                ),
                400,
                0.8,
            )
            .await;

        Ok(Response::new(
            ResponseKind::LearningPath,
            content,
            json!({ "paths": paths, "learning_goal": goal }),
            "start_learning",
        ))
    }

    async fn handle_learn(&self, message: &str) -> Result<Response> {
        let content = self
            .narrate(
                prompts::LEARN,
                format!("当前学习主题：{DEFAULT_CURRENT_TOPIC}\n用户问题：{message}"),
                400,
                0.7,
            )
            .await;

        Ok(Response::new(
            ResponseKind::LearningAssistance,
            content,
            json!({
                "current_topic": DEFAULT_CURRENT_TOPIC,
                "suggestions": [
                    "可以尝试动手写一个简单的例子",
                    "建议复习相关的基础概念",
                    "可以在线搜索更多实际应用案例",
                ],
            }),
            "continue_learning",
        ))
    }

    async fn handle_contribute(&self, message: &str, intent: &Intent) -> Result<Response> {
        let candidates = self.contribution.identify_new_concepts(&intent.keywords);
        if candidates.is_empty() {
            return self.handle_chat(message).await;
        }

        let content = self
            .narrate(
                prompts::CONTRIBUTE,
                format!("用户提到的新概念：{}\n用户消息：{message}", candidates[0]),
                250,
                0.8,
            )
            .await;

        Ok(Response::new(
            ResponseKind::ContributionRequest,
            content,
            json!({ "new_concepts": candidates, "contribution_requested": true }),
            "collect_contribution",
        ))
    }

    async fn handle_chat(&self, message: &str) -> Result<Response> {
        let content = self.narrate(prompts::CHAT, message.to_string(), 200, 0.8).await;

        Ok(Response::new(
            ResponseKind::GeneralChat,
            content,
            json!({
                "chat_suggestions": [
                    "想学点什么新技能吗？",
                    "有什么编程问题可以问我",
                    "可以帮你规划学习路径哦",
                ],
            }),
            "continue_chat",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use kgraph::KnowledgePoint;

    fn engine_with(client: MockLlmClient, graph: KnowledgeGraph) -> TutorEngine {
        TutorEngine::new(
            Arc::new(client),
            Arc::new(graph),
            Arc::new(LoggingLedger),
            &Config::default(),
        )
    }

    fn seeded_graph() -> KnowledgeGraph {
        let graph = KnowledgeGraph::in_memory();
        graph
            .insert(KnowledgePoint::new("递归", "函数调用自身解决子问题"))
            .unwrap();
        graph
            .insert(KnowledgePoint::new("Python基础", "Python语法入门"))
            .unwrap();
        graph
    }

    #[tokio::test]
    async fn test_search_with_hits() {
        // call 1: intent (fails -> fallback SEARCH); call 2: narration
        let client = MockLlmClient::new(vec![
            Err("model down".to_string()),
            Ok("找到了递归相关的内容".to_string()),
        ]);
        let engine = engine_with(client, seeded_graph());

        let response = engine.handle_message("u1", "递归 是什么", &[]).await;
        assert_eq!(response.kind, ResponseKind::KnowledgeSearch);
        assert_eq!(response.content, "找到了递归相关的内容");
        assert_eq!(response.next_action.as_deref(), Some("wait_for_selection"));
        assert_eq!(response.data["has_results"], true);
    }

    #[tokio::test]
    async fn test_search_zero_hits_falls_through_to_contribute() {
        let client = MockLlmClient::always_failing();
        let engine = engine_with(client, seeded_graph());

        // fallback SEARCH intent with keyword 星际导航 (absent from graph);
        // narration fails too, so the apology ships with the data intact
        let response = engine.handle_message("u1", "星际导航 是什么", &[]).await;
        assert_eq!(response.kind, ResponseKind::ContributionRequest);
        assert_eq!(response.content, prompts::APOLOGY);
        assert_eq!(response.data["new_concepts"][0], "星际导航");
        assert_eq!(response.next_action.as_deref(), Some("collect_contribution"));
    }

    #[tokio::test]
    async fn test_chat_branch() {
        let client = MockLlmClient::new(vec![
            Err("model down".to_string()),
            Ok("你好呀！今天想学点什么？".to_string()),
        ]);
        let engine = engine_with(client, seeded_graph());

        let response = engine.handle_message("u1", "你好", &[]).await;
        assert_eq!(response.kind, ResponseKind::GeneralChat);
        assert_eq!(response.next_action.as_deref(), Some("continue_chat"));
    }

    #[tokio::test]
    async fn test_path_clarification_when_unplannable() {
        let client = MockLlmClient::always_failing();
        let engine = engine_with(client, seeded_graph());

        // fallback PATH intent; goal topic falls back to the message,
        // which resolves to no end node
        let response = engine.handle_message("u1", "零基础怎么学量子力学", &[]).await;
        assert_eq!(response.kind, ResponseKind::PathPlanning);
        assert_eq!(response.data["need_more_info"], true);
        assert_eq!(response.next_action.as_deref(), Some("collect_goal_info"));
    }

    #[tokio::test]
    async fn test_usage_stats_count_calls() {
        let client = MockLlmClient::always_failing();
        let engine = engine_with(client, seeded_graph());

        let _ = engine.handle_message("u1", "你好", &[]).await;
        let stats = engine.usage_stats();
        // intent call + chat narration call, both failed
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.error_count, 2);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[tokio::test]
    async fn test_envelope_serialization() {
        let client = MockLlmClient::always_failing();
        let engine = engine_with(client, seeded_graph());

        let response = engine.handle_message("u1", "你好", &[]).await;
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "general_chat");
        assert!(value["content"].is_string());
        assert!(value["data"]["chat_suggestions"].is_array());
    }
}
