//! KGraph - prerequisite-linked knowledge graph store
//!
//! Stores knowledge points as named nodes connected by a directed
//! prerequisite relation ("must be learned before"). Consumers query it
//! through the [`GraphStore`] trait: substring search over name and
//! description, undirected bounded-depth shortest-path traversal, and
//! node creation guarded by a uniqueness constraint on `name`.
//!
//! # Storage
//!
//! ```text
//! graph.jsonl      # one KnowledgePoint per line
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kgraph::{GraphStore, KnowledgeGraph, KnowledgePoint};
//!
//! let graph = KnowledgeGraph::open("graph.jsonl")?;
//! let hits = graph.find_containing("Python")?;
//! let paths = graph.paths_between(&["编程基础".into()], &["Python进阶".into()], 5)?;
//! ```

pub mod cli;
pub mod config;
mod node;
mod store;

pub use node::{KnowledgePoint, NodeStatus};
pub use store::{GraphStore, KnowledgeGraph, StoreError};

/// Maximum hop count for shortest-path traversal
pub const MAX_PATH_DEPTH: usize = 5;
