//! Knowledge graph storage and traversal
//!
//! In-memory graph behind an RwLock with optional JSONL file persistence.
//! Traversal over the prerequisite relation is undirected and bounded by
//! a hop count, so even invalid cyclic data cannot hang a query.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::node::KnowledgePoint;

/// Errors raised by graph store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A knowledge point named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Knowledge point '{name}' lists itself as a prerequisite")]
    SelfPrerequisite { name: String },

    #[error("Knowledge point name must not be empty")]
    EmptyName,

    #[error("Store lock poisoned")]
    Lock,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True for the uniqueness-constraint violation
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateName { .. })
    }
}

/// Read-side and write-side interface to a knowledge graph store
///
/// Object-safe so the engine can hold `Arc<dyn GraphStore>` and tests can
/// substitute fixtures. All query methods are fallible: a store backed by
/// a remote database surfaces transport errors here.
pub trait GraphStore: Send + Sync {
    /// Insert a new point; rejects duplicate names and self-prerequisites
    fn insert(&self, point: KnowledgePoint) -> Result<String, StoreError>;

    /// Fetch a point by exact name
    fn get(&self, name: &str) -> Result<Option<KnowledgePoint>, StoreError>;

    /// Points whose name or description contains the needle (case-sensitive)
    fn find_containing(&self, needle: &str) -> Result<Vec<KnowledgePoint>, StoreError>;

    /// Number of points matching `find_containing`
    fn count_containing(&self, needle: &str) -> Result<usize, StoreError>;

    /// Names of points whose name or category contains the topic
    fn match_topic(&self, topic: &str) -> Result<Vec<String>, StoreError>;

    /// Names connected to `name` by the prerequisite relation, either direction
    fn neighbors(&self, name: &str) -> Result<Vec<String>, StoreError>;

    /// Shortest paths from any start to any end over the undirected
    /// prerequisite relation, at most `max_depth` hops, shortest first
    fn paths_between(
        &self,
        starts: &[String],
        ends: &[String],
        max_depth: usize,
    ) -> Result<Vec<Vec<KnowledgePoint>>, StoreError>;

    /// Number of points in the graph
    fn len(&self) -> Result<usize, StoreError>;

    /// True when the graph holds no points
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// File-backed knowledge graph
///
/// Nodes live in memory; every mutation rewrites the JSONL file when a
/// path is configured. `name` acts as the primary key.
pub struct KnowledgeGraph {
    nodes: RwLock<BTreeMap<String, KnowledgePoint>>,
    path: Option<PathBuf>,
}

impl KnowledgeGraph {
    /// Create an empty graph with no persistence (tests, fixtures)
    pub fn in_memory() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Open a graph file, creating parent directories as needed
    ///
    /// A missing file yields an empty graph; it is created on first insert.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut nodes = BTreeMap::new();
        if path.exists() {
            let file = fs::File::open(&path)?;
            for (lineno, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<KnowledgePoint>(&line) {
                    Ok(point) => {
                        nodes.insert(point.name.clone(), point);
                    }
                    Err(e) => {
                        warn!(lineno, error = %e, "skipping unparseable graph line");
                    }
                }
            }
        }

        info!(path = %path.display(), nodes = nodes.len(), "opened knowledge graph");
        Ok(Self {
            nodes: RwLock::new(nodes),
            path: Some(path),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, KnowledgePoint>>, StoreError> {
        self.nodes.read().map_err(|_| StoreError::Lock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, KnowledgePoint>>, StoreError> {
        self.nodes.write().map_err(|_| StoreError::Lock)
    }

    /// Rewrite the backing file from the in-memory map
    fn persist(&self, nodes: &BTreeMap<String, KnowledgePoint>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = fs::File::create(path)?;
        for point in nodes.values() {
            serde_json::to_writer(&mut file, point)?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Undirected prerequisite adjacency for one node
    fn adjacent(nodes: &BTreeMap<String, KnowledgePoint>, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(point) = nodes.get(name) {
            for prereq in &point.prerequisites {
                if nodes.contains_key(prereq) && !out.contains(prereq) {
                    out.push(prereq.clone());
                }
            }
        }
        for (other, point) in nodes.iter() {
            if other != name && point.prerequisites.iter().any(|p| p == name) && !out.contains(other) {
                out.push(other.clone());
            }
        }
        out
    }

    /// BFS from one start node, reconstructing paths to every reachable end
    fn bfs_paths(
        nodes: &BTreeMap<String, KnowledgePoint>,
        start: &str,
        ends: &HashSet<&str>,
        max_depth: usize,
    ) -> Vec<Vec<String>> {
        let mut parent: HashMap<String, Option<String>> = HashMap::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        parent.insert(start.to_string(), None);
        queue.push_back((start.to_string(), 0));

        let mut found = Vec::new();
        while let Some((current, depth)) = queue.pop_front() {
            if ends.contains(current.as_str()) {
                let mut path = Vec::new();
                let mut cursor = Some(current.clone());
                while let Some(name) = cursor {
                    cursor = parent.get(&name).cloned().flatten();
                    path.push(name);
                }
                path.reverse();
                found.push(path);
            }
            if depth == max_depth {
                continue;
            }
            for next in Self::adjacent(nodes, &current) {
                if !parent.contains_key(&next) {
                    parent.insert(next.clone(), Some(current.clone()));
                    queue.push_back((next, depth + 1));
                }
            }
        }
        found
    }
}

impl GraphStore for KnowledgeGraph {
    fn insert(&self, point: KnowledgePoint) -> Result<String, StoreError> {
        if point.name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        if point.prerequisites.iter().any(|p| p == &point.name) {
            return Err(StoreError::SelfPrerequisite { name: point.name });
        }

        let mut nodes = self.write()?;
        if nodes.contains_key(&point.name) {
            return Err(StoreError::DuplicateName { name: point.name });
        }

        let name = point.name.clone();
        nodes.insert(name.clone(), point);
        self.persist(&nodes)?;
        debug!(%name, total = nodes.len(), "inserted knowledge point");
        Ok(name)
    }

    fn get(&self, name: &str) -> Result<Option<KnowledgePoint>, StoreError> {
        Ok(self.read()?.get(name).cloned())
    }

    fn find_containing(&self, needle: &str) -> Result<Vec<KnowledgePoint>, StoreError> {
        let nodes = self.read()?;
        Ok(nodes.values().filter(|p| p.matches(needle)).cloned().collect())
    }

    fn count_containing(&self, needle: &str) -> Result<usize, StoreError> {
        let nodes = self.read()?;
        Ok(nodes.values().filter(|p| p.matches(needle)).count())
    }

    fn match_topic(&self, topic: &str) -> Result<Vec<String>, StoreError> {
        let nodes = self.read()?;
        Ok(nodes
            .values()
            .filter(|p| p.name.contains(topic) || p.category.contains(topic))
            .map(|p| p.name.clone())
            .collect())
    }

    fn neighbors(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let nodes = self.read()?;
        Ok(Self::adjacent(&nodes, name))
    }

    fn paths_between(
        &self,
        starts: &[String],
        ends: &[String],
        max_depth: usize,
    ) -> Result<Vec<Vec<KnowledgePoint>>, StoreError> {
        let nodes = self.read()?;
        let end_set: HashSet<&str> = ends
            .iter()
            .map(String::as_str)
            .filter(|name| nodes.contains_key(*name))
            .collect();
        if end_set.is_empty() {
            return Ok(Vec::new());
        }

        let mut name_paths: Vec<Vec<String>> = Vec::new();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        for start in starts {
            if !nodes.contains_key(start) {
                continue;
            }
            for path in Self::bfs_paths(&nodes, start, &end_set, max_depth) {
                if seen.insert(path.clone()) {
                    name_paths.push(path);
                }
            }
        }
        name_paths.sort_by_key(Vec::len);

        let paths = name_paths
            .into_iter()
            .map(|names| {
                names
                    .into_iter()
                    .filter_map(|name| nodes.get(&name).cloned())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        debug!(candidates = paths.len(), max_depth, "computed prerequisite paths");
        Ok(paths)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStatus;

    fn point(name: &str, prereqs: &[&str]) -> KnowledgePoint {
        let mut p = KnowledgePoint::new(name, format!("{name}的介绍"));
        p.prerequisites = prereqs.iter().map(|s| s.to_string()).collect();
        p
    }

    fn chain_graph() -> KnowledgeGraph {
        // 编程基础 <- Python基础 <- Python进阶 <- Web开发
        let graph = KnowledgeGraph::in_memory();
        graph.insert(point("编程基础", &[])).unwrap();
        graph.insert(point("Python基础", &["编程基础"])).unwrap();
        graph.insert(point("Python进阶", &["Python基础"])).unwrap();
        graph.insert(point("Web开发", &["Python进阶"])).unwrap();
        graph
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let graph = KnowledgeGraph::in_memory();
        graph.insert(point("递归", &[])).unwrap();
        let err = graph.insert(point("递归", &[])).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(graph.len().unwrap(), 1);
    }

    #[test]
    fn test_insert_self_prerequisite_rejected() {
        let graph = KnowledgeGraph::in_memory();
        let err = graph.insert(point("递归", &["递归"])).unwrap_err();
        assert!(matches!(err, StoreError::SelfPrerequisite { .. }));
        assert!(graph.is_empty().unwrap());
    }

    #[test]
    fn test_insert_empty_name_rejected() {
        let graph = KnowledgeGraph::in_memory();
        let err = graph.insert(point("  ", &[])).unwrap_err();
        assert!(matches!(err, StoreError::EmptyName));
    }

    #[test]
    fn test_find_containing_matches_description() {
        let graph = chain_graph();
        let hits = graph.find_containing("Python").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(graph.count_containing("没有这个").unwrap(), 0);
    }

    #[test]
    fn test_neighbors_are_undirected() {
        let graph = chain_graph();
        let mut n = graph.neighbors("Python基础").unwrap();
        n.sort();
        assert_eq!(n, vec!["Python进阶".to_string(), "编程基础".to_string()]);
    }

    #[test]
    fn test_paths_between_shortest_first() {
        let graph = chain_graph();
        let paths = graph
            .paths_between(&["编程基础".to_string()], &["Web开发".to_string()], 5)
            .unwrap();
        assert!(!paths.is_empty());
        let names: Vec<&str> = paths[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["编程基础", "Python基础", "Python进阶", "Web开发"]);
    }

    #[test]
    fn test_paths_between_depth_capped() {
        let graph = chain_graph();
        // Web开发 is 3 hops from 编程基础; a cap of 2 must exclude it
        let paths = graph
            .paths_between(&["编程基础".to_string()], &["Web开发".to_string()], 2)
            .unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_paths_between_unknown_topic_is_empty() {
        let graph = chain_graph();
        let paths = graph
            .paths_between(&["不存在".to_string()], &["Web开发".to_string()], 5)
            .unwrap();
        assert!(paths.is_empty());
        let paths = graph
            .paths_between(&["编程基础".to_string()], &["不存在".to_string()], 5)
            .unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_traversal_terminates_on_cyclic_data() {
        // Cycles violate the data invariant but must not hang a query.
        // Build one by inserting nodes whose prerequisites point forward.
        let graph = KnowledgeGraph::in_memory();
        graph.insert(point("甲", &["乙"])).unwrap();
        graph.insert(point("乙", &["丙"])).unwrap();
        graph.insert(point("丙", &["甲"])).unwrap();
        let paths = graph
            .paths_between(&["甲".to_string()], &["丙".to_string()], 5)
            .unwrap();
        assert!(!paths.is_empty());
    }

    #[test]
    fn test_match_topic_by_category() {
        let graph = KnowledgeGraph::in_memory();
        let mut p = point("HTTP协议", &[]);
        p.category = "网络基础".to_string();
        graph.insert(p).unwrap();
        assert_eq!(graph.match_topic("网络").unwrap(), vec!["HTTP协议".to_string()]);
    }

    #[test]
    fn test_open_round_trips_jsonl() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");

        let graph = KnowledgeGraph::open(&path).unwrap();
        let mut contributed = point("asyncio", &["Python基础"]);
        contributed.status = NodeStatus::PendingReview;
        contributed.created_by = Some("user-42".to_string());
        graph.insert(point("Python基础", &[])).unwrap();
        graph.insert(contributed).unwrap();
        drop(graph);

        let reopened = KnowledgeGraph::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        let node = reopened.get("asyncio").unwrap().unwrap();
        assert_eq!(node.status, NodeStatus::PendingReview);
        assert_eq!(node.created_by.as_deref(), Some("user-42"));
    }
}
