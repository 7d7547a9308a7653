//! Learning path planner
//!
//! Turns candidate node sequences from the graph access layer into
//! annotated learning paths, and extracts learning goals from free text
//! via the model-or-fallback pattern.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kgraph::KnowledgePoint;

use crate::codec::{average_difficulty, format_duration, sum_durations};
use crate::graph::GraphAccess;
use crate::intent::Intent;
use crate::llm::{LlmGateway, Message, extract_json};
use crate::prompts;

/// Goal extraction token budget and temperature
const GOAL_MAX_TOKENS: u32 = 150;
const GOAL_TEMPERATURE: f32 = 0.3;

/// Fallback goal defaults
const DEFAULT_TOPIC: &str = "编程";
const DEFAULT_LEVEL: &str = "基础";
const DEFAULT_GOAL: &str = "系统学习";

/// One step in a learning path
#[derive(Debug, Clone, Serialize)]
pub struct PathStep {
    /// 1-based ordinal
    pub step: usize,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub estimated_time: String,
    pub category: String,
}

/// An ordered, annotated sequence of knowledge points
#[derive(Debug, Clone, Serialize)]
pub struct LearningPath {
    pub nodes: Vec<PathStep>,
    pub total_length: usize,
    /// Rendered sum of the step durations
    pub estimated_total_time: String,
    /// Averaged difficulty label across the steps
    pub difficulty_level: String,
}

impl LearningPath {
    /// Annotate one candidate node sequence
    fn from_points(points: Vec<KnowledgePoint>) -> Self {
        let total_minutes = sum_durations(points.iter().map(|p| p.estimated_time.as_str()));
        let difficulty_level = average_difficulty(points.iter().map(|p| p.difficulty.as_str())).to_string();

        let nodes: Vec<PathStep> = points
            .into_iter()
            .enumerate()
            .map(|(i, point)| PathStep {
                step: i + 1,
                name: point.name,
                description: point.description,
                difficulty: point.difficulty,
                estimated_time: point.estimated_time,
                category: point.category,
            })
            .collect();

        Self {
            total_length: nodes.len(),
            estimated_total_time: format_duration(total_minutes),
            difficulty_level,
            nodes,
        }
    }
}

/// Extracted learning goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningGoal {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub goal: String,
}

impl LearningGoal {
    /// Deterministic fallback when the model cannot be consulted
    fn fallback(intent: &Intent) -> Self {
        Self {
            topic: intent
                .keywords
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            level: DEFAULT_LEVEL.to_string(),
            goal: DEFAULT_GOAL.to_string(),
        }
    }
}

/// Path planner over the graph access layer
#[derive(Clone)]
pub struct Planner {
    graph: GraphAccess,
}

impl Planner {
    pub fn new(graph: GraphAccess) -> Self {
        Self { graph }
    }

    /// Ranked, annotated learning paths between two topics, at most 3
    ///
    /// Empty output is the normal "insufficient information" outcome; the
    /// orchestrator answers it with a clarification request.
    pub fn plan(&self, start_topic: &str, end_topic: &str) -> Vec<LearningPath> {
        let candidates = self.graph.shortest_paths(start_topic, end_topic);
        debug!(start_topic, end_topic, candidates = candidates.len(), "plan");
        candidates.into_iter().map(LearningPath::from_points).collect()
    }
}

/// Extract `{topic, level, goal}` from a free-text learning request
///
/// Model call first; on any fault falls back to the intent's first
/// keyword and fixed defaults. Never fails.
pub async fn parse_learning_goal(gateway: &LlmGateway, message: &str, intent: &Intent) -> LearningGoal {
    let messages = vec![Message::user(format!("分析这个学习请求：{message}"))];
    let reply = match gateway
        .complete(prompts::GOALS, messages, GOAL_MAX_TOKENS, GOAL_TEMPERATURE)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "goal parsing call failed, using fallback");
            return LearningGoal::fallback(intent);
        }
    };

    match extract_json(&reply).and_then(|json| serde_json::from_str::<LearningGoal>(json).ok()) {
        Some(mut goal) => {
            if goal.topic.is_empty() {
                goal.topic = DEFAULT_TOPIC.to_string();
            }
            goal
        }
        None => {
            warn!("goal reply unparseable, using fallback");
            LearningGoal::fallback(intent)
        }
    }
}
