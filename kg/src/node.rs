//! KnowledgePoint node type
//!
//! A single addressable unit of learnable content. Nodes are keyed by
//! `name`; the prerequisite relation is stored as a list of other node
//! names on each point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of a knowledge point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Reviewed and visible to learners
    #[default]
    Active,
    /// Learner-contributed, awaiting review
    PendingReview,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::PendingReview => write!(f, "pending_review"),
        }
    }
}

/// A single node in the knowledge graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgePoint {
    /// Unique name within the graph
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Subject category (e.g. 编程基础)
    #[serde(default = "default_category")]
    pub category: String,

    /// Ordinal difficulty label (入门/初级/中级/高级/专家)
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Localized estimated learning time (e.g. "30分钟", "2小时")
    #[serde(default = "default_estimated_time")]
    pub estimated_time: String,

    /// Names of points that must be learned before this one
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Review status
    #[serde(default)]
    pub status: NodeStatus,

    /// User id of the contributor, if learner-contributed
    #[serde(default)]
    pub created_by: Option<String>,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_category() -> String {
    "编程".to_string()
}

fn default_difficulty() -> String {
    "中级".to_string()
}

fn default_estimated_time() -> String {
    "30分钟".to_string()
}

impl KnowledgePoint {
    /// Create an active point with defaults for everything but name and description
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: default_category(),
            difficulty: default_difficulty(),
            estimated_time: default_estimated_time(),
            prerequisites: Vec::new(),
            tags: Vec::new(),
            status: NodeStatus::Active,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    /// True when name or description contains the needle (case-sensitive)
    pub fn matches(&self, needle: &str) -> bool {
        self.name.contains(needle) || self.description.contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let point = KnowledgePoint::new("递归", "函数调用自身");
        assert_eq!(point.difficulty, "中级");
        assert_eq!(point.estimated_time, "30分钟");
        assert_eq!(point.status, NodeStatus::Active);
        assert!(point.prerequisites.is_empty());
    }

    #[test]
    fn test_matches_name_and_description() {
        let point = KnowledgePoint::new("Python基础", "变量、类型与控制流");
        assert!(point.matches("Python"));
        assert!(point.matches("控制流"));
        assert!(!point.matches("python")); // case-sensitive
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&NodeStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        assert_eq!(NodeStatus::PendingReview.to_string(), "pending_review");
    }

    #[test]
    fn test_deserialize_minimal() {
        let point: KnowledgePoint = serde_json::from_str(r#"{"name": "闭包"}"#).unwrap();
        assert_eq!(point.name, "闭包");
        assert_eq!(point.category, "编程");
        assert_eq!(point.status, NodeStatus::Active);
    }
}
