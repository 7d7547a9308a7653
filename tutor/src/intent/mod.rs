//! Intent classification
//!
//! Converts a user message (plus recent history) into a typed intent.
//! The model-backed classifier is the primary path; a deterministic
//! rule-based classifier backs it up, composed by [`IntentClassifier`]
//! so `classify` never fails.

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod rules;

pub use classifier::{IntentClassifier, ModelClassifier};
pub use rules::RuleClassifier;

/// The classified purpose of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentKind {
    /// Query a knowledge point
    Search,
    /// Plan a learning path
    Path,
    /// Ask for learning assistance
    Learn,
    /// Mention a concept absent from the graph
    Contribute,
    /// General conversation
    Chat,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Search => "SEARCH",
            Self::Path => "PATH",
            Self::Learn => "LEARN",
            Self::Contribute => "CONTRIBUTE",
            Self::Chat => "CHAT",
        };
        write!(f, "{s}")
    }
}

/// Which classifier produced an intent
///
/// Fallback verdicts are lower-trust signals: routing treats both the
/// same, but logging and analytics must be able to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Model,
    Fallback,
}

/// A classified intent, produced fresh per message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentKind,
    pub keywords: Vec<String>,
    pub confidence: f32,
    pub reason: String,
    pub source: IntentSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_uppercase() {
        assert_eq!(serde_json::to_string(&IntentKind::Search).unwrap(), "\"SEARCH\"");
        let kind: IntentKind = serde_json::from_str("\"CONTRIBUTE\"").unwrap();
        assert_eq!(kind, IntentKind::Contribute);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(IntentKind::Path.to_string(), "PATH");
    }
}
