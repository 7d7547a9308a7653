//! Tutor - Intent-Driven Knowledge-Graph Tutoring Engine
//!
//! Tutor turns free-text learner messages into structured tutoring
//! responses backed by a knowledge graph. Every message is classified
//! into one of five intents (model call first, deterministic rules as
//! the safety net), routed to a retrieval or contribution branch, and
//! narrated through a persona model call that degrades to a fixed
//! apology rather than failing.
//!
//! # Core Concepts
//!
//! - **Graceful Degradation**: model faults fall back to rules, store
//!   read faults collapse to empty results, narration faults ship the
//!   data with an apology
//! - **Uniform Envelopes**: every message produces a typed response
//!   envelope, including the error case
//! - **Metered Calls**: all model calls pass through one gateway that
//!   keeps process-wide usage counters
//!
//! # Modules
//!
//! - [`engine`] - dialogue orchestrator and response envelopes
//! - [`intent`] - model-backed intent classification with rule fallback
//! - [`graph`] - read-mostly facade over the knowledge graph store
//! - [`planner`] - learning path assembly and goal extraction
//! - [`contribution`] - learner contribution pipeline with rewards
//! - [`llm`] - LLM client trait, DeepSeek implementation, gateway
//! - [`codec`] - duration and difficulty conversions
//! - [`config`] - configuration types and loading

pub mod cli;
pub mod codec;
pub mod config;
pub mod contribution;
pub mod engine;
pub mod graph;
pub mod intent;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod repl;
pub mod usage;

// Re-export commonly used types
pub use config::{Config, GraphConfig, LlmConfig, RewardConfig};
pub use contribution::{ConceptSubmission, ContributionOutcome, ContributionPipeline, LoggingLedger, RewardLedger};
pub use engine::{Response, ResponseKind, TutorEngine};
pub use graph::{GraphAccess, KnowledgeSummary};
pub use intent::{Intent, IntentClassifier, IntentKind, IntentSource};
pub use llm::{CompletionRequest, CompletionResponse, DeepSeekClient, LlmClient, LlmError, LlmGateway, Message, Role};
pub use planner::{LearningGoal, LearningPath, PathStep, Planner};
pub use usage::{UsageCounters, UsageStats};
