// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Type Definitions

use serde::{Deserialize, Serialize};

// ─── Simulation Mode ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Epidemic,
    Financial,
}

// ─── Epidemic State (SIR+) ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpidemicState {
    #[default]
    Susceptible,
    Infected,
    Recovered,   // absorbing unless immunity wanes
    Deceased,    // TERMINAL
    Vaccinated,  // TERMINAL
}

// ─── Financial State ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialState {
    #[default]
    Healthy,
    Stressed,
    Distressed,
    Defaulted,  // TERMINAL
    BailedOut,  // TERMINAL
}

impl FinancialState {
    /// Healthy and Stressed nodes still carry a live balance sheet that the
    /// cascade can erode.
    pub fn is_solvent(&self) -> bool {
        matches!(self, Self::Healthy | Self::Stressed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Defaulted | Self::BailedOut)
    }
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// A network participant. Layout fields sent by the topology generator
/// (coordinates, radius, velocity) are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Rebuilt from the link set at initialize.
    #[serde(default)]
    pub degree: u32,
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default)]
    pub epidemic_state: EpidemicState,
    #[serde(default)]
    pub financial_state: FinancialState,
    pub assets: f64,
    pub capital_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infected_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovered_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stressed_at: Option<u64>,
}

impl Node {
    /// A node in the canonical initial state for both domains.
    pub fn new(id: impl Into<String>, assets: f64, capital_ratio: f64) -> Self {
        Self {
            id: id.into(),
            degree: 0,
            neighbors: Vec::new(),
            epidemic_state: EpidemicState::Susceptible,
            financial_state: FinancialState::Healthy,
            assets,
            capital_ratio,
            infected_at: None,
            recovered_at: None,
            stressed_at: None,
        }
    }
}

// ─── Link ────────────────────────────────────────────────────────────────────

/// Undirected edge. Endpoints are always node ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Loss transmitted to the counterparty when this end fails.
    #[serde(default)]
    pub exposure: f64,
}

pub fn default_weight() -> f64 {
    1.0
}

impl Link {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, exposure: f64) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            weight: default_weight(),
            exposure,
        }
    }
}

// ─── NodeView ────────────────────────────────────────────────────────────────

/// Per-node slice of a tick snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub epidemic_state: EpidemicState,
    pub financial_state: FinancialState,
    pub capital_ratio: f64,
}

impl From<&Node> for NodeView {
    fn from(n: &Node) -> Self {
        Self {
            id: n.id.clone(),
            epidemic_state: n.epidemic_state,
            financial_state: n.financial_state,
            capital_ratio: n.capital_ratio,
        }
    }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpidemicStats {
    pub susceptible: u32,
    pub infected: u32,
    pub recovered: u32,
    pub deceased: u32,
    pub vaccinated: u32,
    /// Reproduction estimate. Non-finite when gamma is zero early in a run.
    pub r0: f64,
    pub peak_infected: u32,
    pub total_infected: u32,
}

impl EpidemicStats {
    pub fn total(&self) -> u32 {
        self.susceptible + self.infected + self.recovered + self.deceased + self.vaccinated
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStats {
    pub healthy: u32,
    pub stressed: u32,
    pub distressed: u32,
    pub defaulted: u32,
    pub bailed_out: u32,
    /// Fraction of nodes Stressed, Distressed or Defaulted.
    pub systemic_risk: f64,
    pub total_losses: f64,
    pub cascade_depth: u64,
}

impl FinancialStats {
    pub fn total(&self) -> u32 {
        self.healthy + self.stressed + self.distressed + self.defaulted + self.bailed_out
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStats {
    pub epidemic: EpidemicStats,
    pub financial: FinancialStats,
    pub tick: u64,
    pub elapsed_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&FinancialState::BailedOut).unwrap(),
            "\"BAILED_OUT\""
        );
        assert_eq!(
            serde_json::to_string(&EpidemicState::Susceptible).unwrap(),
            "\"SUSCEPTIBLE\""
        );
        assert_eq!(
            serde_json::to_string(&SimulationMode::Financial).unwrap(),
            "\"financial\""
        );
    }

    #[test]
    fn test_node_decode_ignores_layout_fields() {
        let json = r#"{
            "id": "7", "index": 7, "x": 10.5, "y": 3.0, "vx": 0, "vy": 0,
            "degree": 2, "neighbors": ["1", "2"],
            "epidemicState": "SUSCEPTIBLE", "financialState": "HEALTHY",
            "assets": 150.0, "liabilities": 0, "capitalRatio": 0.12, "radius": 9
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, "7");
        assert_eq!(node.degree, 2);
        assert!((node.assets - 150.0).abs() < f64::EPSILON);
        assert!(node.infected_at.is_none());
    }

    #[test]
    fn test_link_defaults() {
        let link: Link = serde_json::from_str(r#"{"sourceId":"a","targetId":"b"}"#).unwrap();
        assert!((link.weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(link.exposure, 0.0);
    }

    #[test]
    fn test_solvency_predicates() {
        assert!(FinancialState::Healthy.is_solvent());
        assert!(FinancialState::Stressed.is_solvent());
        assert!(!FinancialState::Distressed.is_solvent());
        assert!(FinancialState::Defaulted.is_terminal());
        assert!(FinancialState::BailedOut.is_terminal());
        assert!(!FinancialState::Distressed.is_terminal());
    }
}
