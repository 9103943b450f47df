//! `CrossScreeningIndex`: a subject-subject graph built out-of-band from
//! completed screenings. Nodes are a plain set, edges a plain list — no
//! mutually-pointing node structures, so indexing never needs interior
//! mutability beyond the top-level map.

use crate::types::{Connection, ConnectionType, EdgeStrength, GraphEdge};
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

#[derive(Default)]
pub struct CrossScreeningIndex {
    nodes: DashMap<Uuid, ()>,
    edges: DashMap<Uuid, Vec<GraphEdge>>,
}

impl CrossScreeningIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexing is out-of-band: callers must not let a failure here fail the
    /// screening that produced these connections.
    pub fn index_screening(&self, subject_id: Uuid, connections: &[(Uuid, ConnectionType, EdgeStrength)]) {
        self.nodes.insert(subject_id, ());
        let mut entry = self.edges.entry(subject_id).or_default();
        for &(to_subject, connection_type, strength) in connections {
            self.nodes.insert(to_subject, ());
            entry.push(GraphEdge {
                from_subject: subject_id,
                to_subject,
                connection_type,
                strength,
            });
        }
    }

    fn neighbors(&self, subject_id: Uuid) -> Vec<GraphEdge> {
        let mut result = Vec::new();
        if let Some(edges) = self.edges.get(&subject_id) {
            result.extend(edges.iter().cloned());
        }
        for entry in self.edges.iter() {
            for edge in entry.value() {
                if edge.to_subject == subject_id && edge.from_subject != subject_id {
                    result.push(GraphEdge {
                        from_subject: subject_id,
                        to_subject: edge.from_subject,
                        connection_type: edge.connection_type,
                        strength: edge.strength,
                    });
                }
            }
        }
        result
    }

    pub fn query(&self, subject_id: Uuid, max_degree: u32, filter_types: Option<&[ConnectionType]>) -> Vec<Connection> {
        let mut visited = HashSet::from([subject_id]);
        let mut queue = VecDeque::from([(subject_id, 0u32)]);
        let mut connections = Vec::new();

        while let Some((current, degree)) = queue.pop_front() {
            if degree >= max_degree {
                continue;
            }
            for edge in self.neighbors(current) {
                if visited.contains(&edge.to_subject) {
                    continue;
                }
                visited.insert(edge.to_subject);
                let include = filter_types.map(|types| types.contains(&edge.connection_type)).unwrap_or(true);
                if include {
                    connections.push(Connection {
                        subject_id: edge.to_subject,
                        connection_type: edge.connection_type,
                        strength: edge.strength,
                        degree: degree + 1,
                    });
                }
                queue.push_back((edge.to_subject, degree + 1));
            }
        }

        connections
    }

    /// Bounded BFS returning the node set and edge set within `max_depth`.
    pub fn network_graph(&self, center: Uuid, max_depth: u32) -> (Vec<Uuid>, Vec<GraphEdge>) {
        let mut visited = HashSet::from([center]);
        let mut queue = VecDeque::from([(center, 0u32)]);
        let mut nodes = vec![center];
        let mut edges = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in self.neighbors(current) {
                edges.push(edge.clone());
                if !visited.contains(&edge.to_subject) {
                    visited.insert(edge.to_subject);
                    nodes.push(edge.to_subject);
                    queue.push_back((edge.to_subject, depth + 1));
                }
            }
        }

        (nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_connection_has_degree_one() {
        let index = CrossScreeningIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.index_screening(a, &[(b, ConnectionType::Employer, EdgeStrength::Strong)]);
        let connections = index.query(a, 2, None);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].degree, 1);
    }

    #[test]
    fn query_respects_max_degree() {
        let index = CrossScreeningIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        index.index_screening(a, &[(b, ConnectionType::Colleague, EdgeStrength::Moderate)]);
        index.index_screening(b, &[(c, ConnectionType::Colleague, EdgeStrength::Weak)]);
        let connections = index.query(a, 1, None);
        assert!(!connections.iter().any(|conn| conn.subject_id == c));
    }

    #[test]
    fn filter_types_excludes_other_connection_types() {
        let index = CrossScreeningIndex::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        index.index_screening(a, &[(b, ConnectionType::Family, EdgeStrength::Weak)]);
        let connections = index.query(a, 2, Some(&[ConnectionType::Employer]));
        assert!(connections.is_empty());
    }

    #[test]
    fn network_graph_includes_center_node() {
        let index = CrossScreeningIndex::new();
        let a = Uuid::new_v4();
        let (nodes, _edges) = index.network_graph(a, 2);
        assert!(nodes.contains(&a));
    }
}
