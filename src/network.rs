// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Network Index
//
// Adjacency and incident-link indices, built once per run in O(V + E).
// Topology is fixed for the lifetime of a run, so nothing here is mutable
// after construction.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::types::{Link, Node};

/// Incident link as seen from one endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incidence {
    /// Index of the node at the other end.
    pub other: usize,
    pub exposure: f64,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkIndex {
    by_id: HashMap<String, usize>,
    neighbors: Vec<Vec<usize>>,
    incident: Vec<Vec<Incidence>>,
}

impl NetworkIndex {
    /// Build both indices.
    ///
    /// # Errors
    /// - `DuplicateNodeId` if two nodes share an id.
    /// - `UnknownEndpoint` if a link names a node that is not in `nodes`.
    pub fn build(nodes: &[Node], links: &[Link]) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut incident: Vec<Vec<Incidence>> = vec![Vec::new(); nodes.len()];

        for (link_idx, link) in links.iter().enumerate() {
            let resolve = |id: &str| {
                by_id.get(id).copied().ok_or_else(|| ConfigError::UnknownEndpoint {
                    link: link_idx,
                    id: id.to_string(),
                })
            };
            let s = resolve(&link.source_id)?;
            let t = resolve(&link.target_id)?;

            incident[s].push(Incidence { other: t, exposure: link.exposure });
            incident[t].push(Incidence { other: s, exposure: link.exposure });

            // Parallel links count once for adjacency.
            if !neighbors[s].contains(&t) {
                neighbors[s].push(t);
            }
            if s != t && !neighbors[t].contains(&s) {
                neighbors[t].push(s);
            }
        }

        Ok(Self { by_id, neighbors, incident })
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.neighbors[idx]
    }

    pub fn incident(&self, idx: usize) -> &[Incidence] {
        &self.incident[idx]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.neighbors[idx].len()
    }
}
