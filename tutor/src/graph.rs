//! Graph access layer
//!
//! Read-side queries against the knowledge graph store: keyword search
//! with first-keyword ranking, and shortest-path retrieval with the
//! depth-1 "getting started" fallback. Store read faults never propagate
//! upward; they are logged and collapse to empty results. Writes pass
//! through untouched so the contribution pipeline can surface them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use kgraph::{GraphStore, KnowledgePoint, MAX_PATH_DEPTH, StoreError};

use crate::codec::difficulty_score;

/// At most this many keywords take part in one search
pub const MAX_KEYWORDS: usize = 3;

/// Search result cap
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Candidate path cap for connected paths
pub const MAX_PATHS: usize = 3;

/// Candidate cap for the getting-started fallback
pub const MAX_FALLBACK_PATHS: usize = 2;

/// A knowledge point summary as returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeSummary {
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub category: String,
    pub estimated_time: String,
    pub related_topics: Vec<String>,
    pub prerequisites: Vec<String>,
}

impl KnowledgeSummary {
    fn from_point(point: KnowledgePoint, related_topics: Vec<String>) -> Self {
        Self {
            name: point.name,
            description: point.description,
            difficulty: point.difficulty,
            category: point.category,
            estimated_time: point.estimated_time,
            related_topics,
            prerequisites: point.prerequisites,
        }
    }
}

/// Read-mostly facade over the graph store
#[derive(Clone)]
pub struct GraphAccess {
    store: Arc<dyn GraphStore>,
}

impl GraphAccess {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Collapse a store read fault to an empty result, logged
    fn guard<T>(result: Result<Vec<T>, StoreError>, what: &str) -> Vec<T> {
        match result {
            Ok(values) => values,
            Err(e) => {
                warn!(error = %e, what, "graph query failed");
                Vec::new()
            }
        }
    }

    /// Search knowledge points by keywords
    ///
    /// Case-sensitive substring containment on name/description. Matches
    /// on the first keyword outrank later ones (name beats description);
    /// capped at [`MAX_SEARCH_RESULTS`]. Empty input yields empty output.
    pub fn search_by_keywords(&self, keywords: &[String]) -> Vec<KnowledgeSummary> {
        if keywords.is_empty() {
            return Vec::new();
        }
        let keywords = &keywords[..keywords.len().min(MAX_KEYWORDS)];
        let first = &keywords[0];

        let mut points: Vec<KnowledgePoint> = Vec::new();
        for keyword in keywords {
            for point in Self::guard(self.store.find_containing(keyword), "find_containing") {
                if !points.iter().any(|p| p.name == point.name) {
                    points.push(point);
                }
            }
        }

        // Rank band: exact-field match on the first keyword wins
        points.sort_by_key(|p| {
            if p.name.contains(first.as_str()) {
                0u8
            } else if p.description.contains(first.as_str()) {
                1
            } else {
                2
            }
        });
        points.truncate(MAX_SEARCH_RESULTS);

        debug!(count = points.len(), ?keywords, "keyword search");
        points
            .into_iter()
            .map(|point| {
                let related = Self::guard(self.store.neighbors(&point.name), "neighbors");
                KnowledgeSummary::from_point(point, related)
            })
            .collect()
    }

    /// Candidate learning paths between two topics, best first
    ///
    /// Topics resolve by substring on name or category. Connected paths
    /// (undirected, depth ≤ 5) rank by length, cap 3. With no connecting
    /// path, the immediate prerequisites of end-topic nodes form depth-1
    /// getting-started candidates, cap 2. Neither topic resolving yields
    /// an empty result - a normal outcome, not an error.
    pub fn shortest_paths(&self, start_topic: &str, end_topic: &str) -> Vec<Vec<KnowledgePoint>> {
        let starts = Self::guard(self.store.match_topic(start_topic), "match_topic");
        let ends = Self::guard(self.store.match_topic(end_topic), "match_topic");
        if ends.is_empty() {
            debug!(end_topic, "end topic unresolved");
            return Vec::new();
        }

        let mut paths = Self::guard(
            self.store.paths_between(&starts, &ends, MAX_PATH_DEPTH),
            "paths_between",
        );
        paths.truncate(MAX_PATHS);
        if !paths.is_empty() {
            debug!(candidates = paths.len(), "connected paths found");
            return paths;
        }

        self.getting_started_paths(&ends)
    }

    /// Depth-1 fallback: each end node preceded by one of its prerequisites
    fn getting_started_paths(&self, ends: &[String]) -> Vec<Vec<KnowledgePoint>> {
        let mut end_points: Vec<KnowledgePoint> = ends
            .iter()
            .filter_map(|name| match self.store.get(name) {
                Ok(point) => point,
                Err(e) => {
                    warn!(error = %e, name, "graph get failed");
                    None
                }
            })
            .collect();
        end_points.sort_by_key(|p| difficulty_score(&p.difficulty));

        let mut candidates = Vec::new();
        'outer: for point in end_points {
            let prereqs: Vec<KnowledgePoint> = point
                .prerequisites
                .iter()
                .filter_map(|name| self.store.get(name).ok().flatten())
                .collect();

            if prereqs.is_empty() {
                candidates.push(vec![point.clone()]);
                if candidates.len() == MAX_FALLBACK_PATHS {
                    break;
                }
                continue;
            }
            for prereq in prereqs {
                candidates.push(vec![prereq, point.clone()]);
                if candidates.len() == MAX_FALLBACK_PATHS {
                    break 'outer;
                }
            }
        }

        debug!(candidates = candidates.len(), "getting-started fallback");
        candidates
    }

    /// Number of points matching a keyword (name or description)
    pub fn count_matches(&self, keyword: &str) -> Result<usize, StoreError> {
        self.store.count_containing(keyword)
    }

    /// Create a node; write faults propagate to the caller
    pub fn create(&self, point: KnowledgePoint) -> Result<String, StoreError> {
        self.store.insert(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph::KnowledgeGraph;

    struct BrokenStore;

    impl GraphStore for BrokenStore {
        fn insert(&self, point: KnowledgePoint) -> Result<String, StoreError> {
            Ok(point.name)
        }
        fn get(&self, _name: &str) -> Result<Option<KnowledgePoint>, StoreError> {
            Err(StoreError::Lock)
        }
        fn find_containing(&self, _needle: &str) -> Result<Vec<KnowledgePoint>, StoreError> {
            Err(StoreError::Lock)
        }
        fn count_containing(&self, _needle: &str) -> Result<usize, StoreError> {
            Err(StoreError::Lock)
        }
        fn match_topic(&self, _topic: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Lock)
        }
        fn neighbors(&self, _name: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Lock)
        }
        fn paths_between(
            &self,
            _starts: &[String],
            _ends: &[String],
            _max_depth: usize,
        ) -> Result<Vec<Vec<KnowledgePoint>>, StoreError> {
            Err(StoreError::Lock)
        }
        fn len(&self) -> Result<usize, StoreError> {
            Err(StoreError::Lock)
        }
    }

    fn point(name: &str, description: &str, prereqs: &[&str]) -> KnowledgePoint {
        let mut p = KnowledgePoint::new(name, description);
        p.prerequisites = prereqs.iter().map(|s| s.to_string()).collect();
        p
    }

    fn seeded() -> GraphAccess {
        let graph = KnowledgeGraph::in_memory();
        graph.insert(point("编程基础", "变量与控制流", &[])).unwrap();
        graph
            .insert(point("Python基础", "Python语法入门", &["编程基础"]))
            .unwrap();
        graph
            .insert(point("数据结构", "包含Python实现示例", &["Python基础"]))
            .unwrap();
        graph.insert(point("孤岛概念", "与其它点无连接", &[])).unwrap();
        GraphAccess::new(Arc::new(graph))
    }

    #[test]
    fn test_search_empty_keywords() {
        assert!(seeded().search_by_keywords(&[]).is_empty());
    }

    #[test]
    fn test_search_name_match_ranked_first() {
        let hits = seeded().search_by_keywords(&["Python".to_string()]);
        assert!(!hits.is_empty());
        // "Python基础" matches by name, "数据结构" only by description
        assert_eq!(hits[0].name, "Python基础");
        assert!(hits.iter().any(|h| h.name == "数据结构"));
    }

    #[test]
    fn test_search_gathers_related_topics() {
        let hits = seeded().search_by_keywords(&["Python基础".to_string()]);
        let hit = hits.iter().find(|h| h.name == "Python基础").unwrap();
        assert!(hit.related_topics.contains(&"编程基础".to_string()));
        assert!(hit.related_topics.contains(&"数据结构".to_string()));
    }

    #[test]
    fn test_search_keyword_cap() {
        // Only the first three keywords participate
        let hits = seeded().search_by_keywords(&[
            "没有".to_string(),
            "也没有".to_string(),
            "还没有".to_string(),
            "Python".to_string(),
        ]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_shortest_paths_connected() {
        let paths = seeded().shortest_paths("编程基础", "数据结构");
        assert!(!paths.is_empty());
        let names: Vec<&str> = paths[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["编程基础", "Python基础", "数据结构"]);
    }

    #[test]
    fn test_shortest_paths_getting_started_fallback() {
        // 孤岛概念 has no connection to 数据结构: fall back to the end
        // topic's immediate prerequisite
        let paths = seeded().shortest_paths("孤岛概念", "数据结构");
        assert_eq!(paths.len(), 1);
        let names: Vec<&str> = paths[0].iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Python基础", "数据结构"]);
    }

    #[test]
    fn test_shortest_paths_unresolved_end_topic() {
        assert!(seeded().shortest_paths("编程基础", "量子力学").is_empty());
    }

    #[test]
    fn test_store_faults_collapse_to_empty() {
        let access = GraphAccess::new(Arc::new(BrokenStore));
        assert!(access.search_by_keywords(&["Python".to_string()]).is_empty());
        assert!(access.shortest_paths("甲", "乙").is_empty());
        assert!(access.count_matches("甲").is_err());
    }
}
