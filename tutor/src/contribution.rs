//! Learner contribution pipeline
//!
//! Detects concepts the graph does not know yet, stages them as
//! pending-review nodes, and signals the reward ledger. Write failures
//! (including name collisions) surface as structured outcomes with a
//! user-safe message, never as propagated errors.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kgraph::{KnowledgePoint, NodeStatus};

use crate::graph::GraphAccess;

/// Keywords checked per message
const MAX_CANDIDATE_KEYWORDS: usize = 3;

/// Candidate concepts returned per message
const MAX_CANDIDATES: usize = 2;

/// Keywords shorter than this are noise
const MIN_KEYWORD_CHARS: usize = 2;

/// External reward ledger collaborator
///
/// Fire-and-forget from this subsystem's perspective: the credit is
/// signaled, not awaited, and a lost credit never fails a contribution.
pub trait RewardLedger: Send + Sync {
    fn credit(&self, user_id: &str, amount: u32, reason: &str);
}

/// Default ledger: records the credit in the log only
#[derive(Debug, Default)]
pub struct LoggingLedger;

impl RewardLedger for LoggingLedger {
    fn credit(&self, user_id: &str, amount: u32, reason: &str) {
        info!(user_id, amount, reason, "reward credited");
    }
}

/// A learner-supplied concept awaiting staging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptSubmission {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_estimated_time")]
    pub estimated_time: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

fn default_difficulty() -> String {
    "中级".to_string()
}

fn default_category() -> String {
    "编程".to_string()
}

fn default_estimated_time() -> String {
    "30分钟".to_string()
}

/// Structured result of a staging attempt
#[derive(Debug, Clone, Serialize)]
pub struct ContributionOutcome {
    pub success: bool,
    /// Name of the created node when successful
    pub created: Option<String>,
    /// User-safe message, success or failure
    pub message: String,
}

/// Contribution pipeline over the graph access layer
#[derive(Clone)]
pub struct ContributionPipeline {
    graph: GraphAccess,
    ledger: Arc<dyn RewardLedger>,
    reward_amount: u32,
}

impl ContributionPipeline {
    pub fn new(graph: GraphAccess, ledger: Arc<dyn RewardLedger>, reward_amount: u32) -> Self {
        Self {
            graph,
            ledger,
            reward_amount,
        }
    }

    /// Keywords with no match anywhere in the graph, at most 2
    ///
    /// A store read fault degrades to "nothing new" rather than failing
    /// the message.
    pub fn identify_new_concepts(&self, keywords: &[String]) -> Vec<String> {
        let mut candidates = Vec::new();
        for keyword in keywords.iter().take(MAX_CANDIDATE_KEYWORDS) {
            if keyword.chars().count() < MIN_KEYWORD_CHARS {
                continue;
            }
            match self.graph.count_matches(keyword) {
                Ok(0) => candidates.push(keyword.clone()),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, keyword, "new-concept check failed");
                    return Vec::new();
                }
            }
            if candidates.len() == MAX_CANDIDATES {
                break;
            }
        }
        debug!(?candidates, "new concepts identified");
        candidates
    }

    /// Stage a submission as a pending-review node and signal the reward
    pub fn stage(&self, user_id: &str, submission: ConceptSubmission) -> ContributionOutcome {
        let point = KnowledgePoint {
            name: submission.name,
            description: submission.description,
            category: submission.category,
            difficulty: submission.difficulty,
            estimated_time: submission.estimated_time,
            prerequisites: submission.prerequisites,
            tags: Vec::new(),
            status: NodeStatus::PendingReview,
            created_by: Some(user_id.to_string()),
            created_at: Utc::now(),
        };

        match self.graph.create(point) {
            Ok(created) => {
                self.ledger
                    .credit(user_id, self.reward_amount, &format!("贡献知识点: {created}"));
                let message = format!(
                    "🎉 感谢您的贡献！'{created}'已添加到知识图谱中，正在等待审核。\n\n您已获得{}个代币奖励！继续贡献更多有价值的内容吧！",
                    self.reward_amount
                );
                ContributionOutcome {
                    success: true,
                    created: Some(created),
                    message,
                }
            }
            Err(e) => {
                warn!(error = %e, "contribution staging failed");
                ContributionOutcome {
                    success: false,
                    created: None,
                    message: "添加失败，请稍后重试。".to_string(),
                }
            }
        }
    }
}
