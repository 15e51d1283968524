// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Message Protocol
//
// Commands flow from the controller into the execution context; snapshots
// flow back out. Both are `type`-tagged JSON objects.

use serde::{Deserialize, Serialize};

use crate::config::{EpidemicParams, EpidemicParamsUpdate, FinancialParams, FinancialParamsUpdate};
use crate::engine::SimulationEngine;
use crate::error::ProtocolError;
use crate::types::{Link, Node, NodeView, SimulationMode, SimulationStats};

/// Shock magnitude used when a `shock` command omits it.
pub const DEFAULT_SHOCK_MAGNITUDE: f64 = 0.5;

fn default_shock_magnitude() -> f64 {
    DEFAULT_SHOCK_MAGNITUDE
}

// ─── Inbound ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Init {
        nodes: Vec<Node>,
        links: Vec<Link>,
        mode: SimulationMode,
        #[serde(default)]
        epidemic_params: EpidemicParams,
        #[serde(default)]
        financial_params: FinancialParams,
    },
    #[serde(rename_all = "camelCase")]
    Params {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epidemic_params: Option<EpidemicParamsUpdate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        financial_params: Option<FinancialParamsUpdate>,
    },
    #[serde(rename_all = "camelCase")]
    Infect { node_id: String },
    #[serde(rename_all = "camelCase")]
    Vaccinate { node_id: String },
    #[serde(rename_all = "camelCase")]
    Bailout { node_id: String },
    /// Magnitude is expected in [0, 1] but not checked.
    #[serde(rename_all = "camelCase")]
    Shock {
        node_id: String,
        #[serde(default = "default_shock_magnitude")]
        magnitude: f64,
    },
    #[serde(rename_all = "camelCase")]
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tick_rate: Option<f64>,
    },
    Pause,
    Reset,
    Step,
}

// ─── Outbound ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeView>,
    pub stats: SimulationStats,
}

impl Snapshot {
    pub fn capture(engine: &SimulationEngine) -> Self {
        Self {
            nodes: engine.node_views(),
            stats: engine.stats(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    Tick(Snapshot),
    /// A command that could not be carried out, e.g. a malformed init payload.
    Error { message: String },
}

impl Outbound {
    pub fn as_snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Tick(s) => Some(s),
            Self::Error { .. } => None,
        }
    }
}

// ─── JSON codec ──────────────────────────────────────────────────────────────

pub fn decode_command(json: &str) -> Result<Command, ProtocolError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_outbound(message: &Outbound) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EpidemicState;

    #[test]
    fn test_decode_unit_commands() {
        assert_eq!(decode_command(r#"{"type":"pause"}"#).unwrap(), Command::Pause);
        assert_eq!(decode_command(r#"{"type":"reset"}"#).unwrap(), Command::Reset);
        assert_eq!(decode_command(r#"{"type":"step"}"#).unwrap(), Command::Step);
    }

    #[test]
    fn test_decode_start_with_and_without_rate() {
        assert_eq!(
            decode_command(r#"{"type":"start","tickRate":60}"#).unwrap(),
            Command::Start { tick_rate: Some(60.0) }
        );
        assert_eq!(
            decode_command(r#"{"type":"start"}"#).unwrap(),
            Command::Start { tick_rate: None }
        );
    }

    #[test]
    fn test_shock_magnitude_default() {
        let cmd = decode_command(r#"{"type":"shock","nodeId":"4"}"#).unwrap();
        assert_eq!(cmd, Command::Shock { node_id: "4".into(), magnitude: 0.5 });
    }

    #[test]
    fn test_decode_partial_params() {
        let cmd = decode_command(
            r#"{"type":"params","financialParams":{"bailoutThreshold":1.0}}"#,
        ).unwrap();
        match cmd {
            Command::Params { epidemic_params, financial_params } => {
                assert!(epidemic_params.is_none());
                assert_eq!(financial_params.unwrap().bailout_threshold, Some(1.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_init() {
        let json = r#"{
            "type": "init",
            "mode": "financial",
            "nodes": [
                {"id":"a","assets":100,"capitalRatio":0.1,"x":1,"y":2},
                {"id":"b","assets":120,"capitalRatio":0.12}
            ],
            "links": [{"id":"link-0","sourceId":"a","targetId":"b","source":"a","target":"b","weight":1,"exposure":15}],
            "epidemicParams": {"beta":0.3,"gamma":0.1,"mu":0.02,"vaccinationRate":0,"immunityDuration":0},
            "financialParams": {"leverageRatio":10,"capitalBuffer":0.08,"correlationFactor":0.3,"fireSaleDiscount":0.2,"bailoutThreshold":0.5}
        }"#;
        match decode_command(json).unwrap() {
            Command::Init { nodes, links, mode, financial_params, .. } => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(nodes[0].epidemic_state, EpidemicState::Susceptible);
                assert_eq!(links[0].exposure, 15.0);
                assert_eq!(mode, SimulationMode::Financial);
                assert!((financial_params.capital_buffer - 0.08).abs() < f64::EPSILON);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            decode_command(r#"{"type":"explode"}"#),
            Err(ProtocolError::Decode(_))
        ));
        assert!(decode_command(r#"{"type":"infect"}"#).is_err());
    }

    #[test]
    fn test_encode_tick_shape() {
        let mut engine = SimulationEngine::with_seed(1);
        engine.initialize(
            vec![Node::new("n0", 100.0, 0.1)],
            Vec::new(),
            SimulationMode::Epidemic,
            EpidemicParams::default(),
            FinancialParams::default(),
        ).unwrap();
        let json = encode_outbound(&Outbound::Tick(Snapshot::capture(&engine))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "tick");
        assert_eq!(value["nodes"][0]["id"], "n0");
        assert_eq!(value["nodes"][0]["epidemicState"], "SUSCEPTIBLE");
        assert_eq!(value["nodes"][0]["financialState"], "HEALTHY");
        assert_eq!(value["stats"]["tick"], 0);
        assert_eq!(value["stats"]["epidemic"]["susceptible"], 1);
        assert_eq!(value["stats"]["financial"]["bailedOut"], 0);
        assert!(value["stats"]["elapsedMs"].is_number());
    }

    #[test]
    fn test_encode_error_shape() {
        let json = encode_outbound(&Outbound::Error { message: "bad".into() }).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"bad"}"#);
    }
}
