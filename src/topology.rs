// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Network Topology Generators
//
// Produces the `{nodes, links}` payload an `init` command carries. Node ids
// are "0".."n-1". The engine trusts this output without further checks.

use std::collections::{BTreeSet, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Link, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Barabási–Albert preferential attachment; a few hubs.
    ScaleFree,
    /// Watts–Strogatz ring lattice with random rewiring.
    SmallWorld,
    /// Erdős–Rényi with isolated nodes attached to the reachable set.
    Random,
}

/// Generated network ready for `SimulationEngine::initialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

// ---------------------------------------------------------------------------
// Graph scaffold
// ---------------------------------------------------------------------------

/// Undirected simple graph over `0..n` with edges kept in insertion order.
struct Graph {
    adjacency: Vec<BTreeSet<usize>>,
    edges: Vec<(usize, usize)>,
}

impl Graph {
    fn new(n: usize) -> Self {
        Self { adjacency: vec![BTreeSet::new(); n], edges: Vec::new() }
    }

    fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a].contains(&b)
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        if a == b || self.has_edge(a, b) {
            return;
        }
        self.adjacency[a].insert(b);
        self.adjacency[b].insert(a);
        self.edges.push((a, b));
    }

    fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Build a network of `node_count` nodes. `link_density` in [0, 1] scales
/// the generator's connectivity parameter.
pub fn generate<R: Rng + ?Sized>(
    topology: Topology,
    node_count: usize,
    link_density: f64,
    rng: &mut R,
) -> Network {
    let graph = match topology {
        Topology::ScaleFree => {
            let m = ((link_density * 5.0).floor() as usize + 1).max(2);
            scale_free(node_count, m, rng)
        }
        Topology::SmallWorld => {
            let k = ((link_density * 8.0).floor() as usize + 2).max(4);
            small_world(node_count, k, 0.1, rng)
        }
        Topology::Random => random(node_count, 0.02 + link_density * 0.08, rng),
    };
    materialize(&graph, rng)
}

fn scale_free<R: Rng + ?Sized>(n: usize, m: usize, rng: &mut R) -> Graph {
    let mut graph = Graph::new(n);
    let seed = (m + 1).min(n);
    for i in 0..seed {
        for j in 0..i {
            graph.add_edge(i, j);
        }
    }

    for i in seed..n {
        let mut targets: BTreeSet<usize> = BTreeSet::new();
        while targets.len() < m.min(i) {
            let weight: usize = (0..i)
                .filter(|v| !targets.contains(v))
                .map(|v| graph.degree(v))
                .sum();
            let pick = if weight == 0 {
                let free: Vec<usize> = (0..i).filter(|v| !targets.contains(v)).collect();
                free[rng.gen_range(0..free.len())]
            } else {
                let mut r = rng.gen_range(0..weight);
                let mut chosen = 0;
                for v in (0..i).filter(|v| !targets.contains(v)) {
                    let d = graph.degree(v);
                    if r < d {
                        chosen = v;
                        break;
                    }
                    r -= d;
                }
                chosen
            };
            targets.insert(pick);
        }
        for t in targets {
            graph.add_edge(i, t);
        }
    }
    graph
}

fn small_world<R: Rng + ?Sized>(n: usize, k: usize, rewire: f64, rng: &mut R) -> Graph {
    let mut graph = Graph::new(n);
    if n == 0 {
        return graph;
    }
    for i in 0..n {
        for j in 1..=k / 2 {
            graph.add_edge(i, (i + j) % n);
        }
    }

    for e in 0..graph.edges.len() {
        if rng.gen::<f64>() >= rewire {
            continue;
        }
        let (source, target) = graph.edges[e];
        let replacement = (0..100)
            .map(|_| rng.gen_range(0..n))
            .find(|&c| c != source && c != target && !graph.has_edge(source, c));
        if let Some(new_target) = replacement {
            graph.adjacency[source].remove(&target);
            graph.adjacency[target].remove(&source);
            graph.adjacency[source].insert(new_target);
            graph.adjacency[new_target].insert(source);
            graph.edges[e] = (source, new_target);
        }
    }
    graph
}

fn random<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Graph {
    let mut graph = Graph::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                graph.add_edge(i, j);
            }
        }
    }
    if n == 0 {
        return graph;
    }

    let mut visited = vec![false; n];
    let mut reached = vec![0];
    let mut queue = VecDeque::from([0]);
    visited[0] = true;
    while let Some(v) = queue.pop_front() {
        for &u in &graph.adjacency[v] {
            if !visited[u] {
                visited[u] = true;
                reached.push(u);
                queue.push_back(u);
            }
        }
    }

    for i in 0..n {
        if !visited[i] {
            let anchor = reached[rng.gen_range(0..reached.len())];
            graph.add_edge(i, anchor);
            visited[i] = true;
            reached.push(i);
        }
    }
    graph
}

/// Attach balance sheets and exposures. Better-connected nodes hold more assets.
fn materialize<R: Rng + ?Sized>(graph: &Graph, rng: &mut R) -> Network {
    let n = graph.adjacency.len();
    let max_degree = (0..n).map(|v| graph.degree(v)).max().unwrap_or(0);

    let nodes: Vec<Node> = (0..n)
        .map(|v| {
            let normalized = if max_degree > 0 {
                graph.degree(v) as f64 / max_degree as f64
            } else {
                0.0
            };
            let assets = 100.0 + rng.gen::<f64>() * 100.0 * (1.0 + normalized);
            let ratio = 0.1 + rng.gen::<f64>() * 0.05;
            let mut node = Node::new(v.to_string(), assets, ratio);
            node.degree = graph.degree(v) as u32;
            node.neighbors = graph.adjacency[v].iter().map(|u| u.to_string()).collect();
            node
        })
        .collect();

    let links = graph.edges.iter()
        .map(|&(a, b)| {
            let avg_assets = (nodes[a].assets + nodes[b].assets) / 2.0;
            let exposure = avg_assets * (0.1 + rng.gen::<f64>() * 0.2);
            Link::new(a.to_string(), b.to_string(), exposure)
        })
        .collect();

    Network { nodes, links }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First node with the maximum degree.
pub fn highest_degree_node(nodes: &[Node]) -> Option<&Node> {
    nodes.iter().fold(None, |best: Option<&Node>, n| match best {
        Some(b) if b.degree >= n.degree => Some(b),
        _ => Some(n),
    })
}

pub fn random_node<'a, R: Rng + ?Sized>(nodes: &'a [Node], rng: &mut R) -> Option<&'a Node> {
    if nodes.is_empty() {
        return None;
    }
    Some(&nodes[rng.gen_range(0..nodes.len())])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub node_count: usize,
    pub link_count: usize,
    pub avg_degree: f64,
    pub max_degree: u32,
    pub min_degree: u32,
    pub density: f64,
}

impl NetworkSummary {
    pub fn of(network: &Network) -> Self {
        let n = network.nodes.len();
        let degrees = network.nodes.iter().map(|node| node.degree);
        let total: u64 = degrees.clone().map(u64::from).sum();
        let pairs = n.saturating_mul(n.saturating_sub(1));
        Self {
            node_count: n,
            link_count: network.links.len(),
            avg_degree: if n > 0 { total as f64 / n as f64 } else { 0.0 },
            max_degree: degrees.clone().max().unwrap_or(0),
            min_degree: degrees.min().unwrap_or(0),
            density: if pairs > 0 {
                2.0 * network.links.len() as f64 / pairs as f64
            } else {
                0.0
            },
        }
    }
}
