//! Rule-based fallback classifier
//!
//! Deterministic keyword-family matching over the lowercased message.
//! The marker tables are data so tests (and future tuning) touch one
//! place only.

use tracing::debug;

use super::{Intent, IntentKind, IntentSource};

/// Markers indicating a knowledge lookup
const SEARCH_MARKERS: &[&str] = &["是什么", "什么是", "解释", "讲解", "介绍", "定义"];

/// Markers indicating a path-planning request
const PATH_MARKERS: &[&str] = &["学习路径", "怎么学", "如何学习", "系统学习", "规划", "零基础"];

/// Markers indicating a tutoring request
const LEARN_MARKERS: &[&str] = &["不理解", "不懂", "帮我", "教我", "为什么", "怎么回事"];

/// Fixed confidence per fallback branch
const SEARCH_CONFIDENCE: f32 = 0.7;
const PATH_CONFIDENCE: f32 = 0.8;
const LEARN_CONFIDENCE: f32 = 0.7;
const CHAT_CONFIDENCE: f32 = 0.5;

/// Deterministic keyword-family classifier
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message; always succeeds
    pub fn classify(&self, message: &str) -> Intent {
        let lowered = message.to_lowercase();

        let intent = if SEARCH_MARKERS.iter().any(|m| lowered.contains(m)) {
            Intent {
                kind: IntentKind::Search,
                keywords: search_keywords(message),
                confidence: SEARCH_CONFIDENCE,
                reason: "关键词匹配-搜索".to_string(),
                source: IntentSource::Fallback,
            }
        } else if PATH_MARKERS.iter().any(|m| lowered.contains(m)) {
            Intent {
                kind: IntentKind::Path,
                keywords: vec![message.to_string()],
                confidence: PATH_CONFIDENCE,
                reason: "关键词匹配-路径".to_string(),
                source: IntentSource::Fallback,
            }
        } else if LEARN_MARKERS.iter().any(|m| lowered.contains(m)) {
            Intent {
                kind: IntentKind::Learn,
                keywords: vec![message.to_string()],
                confidence: LEARN_CONFIDENCE,
                reason: "关键词匹配-辅导".to_string(),
                source: IntentSource::Fallback,
            }
        } else {
            Intent {
                kind: IntentKind::Chat,
                keywords: Vec::new(),
                confidence: CHAT_CONFIDENCE,
                reason: "默认分类".to_string(),
                source: IntentSource::Fallback,
            }
        };

        debug!(kind = %intent.kind, confidence = intent.confidence, "rule classification");
        intent
    }
}

/// Up to three whitespace tokens longer than one character
fn search_keywords(message: &str) -> Vec<String> {
    message
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .take(3)
        .map(|w| w.to_string())
        .collect()
}
