// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Demo Presets
//
// Named scenarios: a topology, parameter overrides and one seeding action.

use rand::Rng;
use serde::Serialize;

use crate::config::{EpidemicParams, EpidemicParamsUpdate, FinancialParams, FinancialParamsUpdate};
use crate::engine::SimulationEngine;
use crate::error::ConfigError;
use crate::protocol::DEFAULT_SHOCK_MAGNITUDE;
use crate::topology::{self, Network, Topology};
use crate::types::SimulationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Infect,
    Shock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionTarget {
    HighestDegree,
    Random,
    Specific(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialAction {
    pub kind: ActionKind,
    pub target: ActionTarget,
    /// Shock magnitude; `None` uses the protocol default.
    pub magnitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mode: SimulationMode,
    pub topology: Topology,
    pub node_count: usize,
    pub link_density: f64,
    pub epidemic: EpidemicParamsUpdate,
    pub financial: FinancialParamsUpdate,
    pub initial_action: Option<InitialAction>,
}

impl Preset {
    pub fn epidemic_params(&self) -> EpidemicParams {
        let mut params = EpidemicParams::default();
        params.merge(&self.epidemic);
        params
    }

    pub fn financial_params(&self) -> FinancialParams {
        let mut params = FinancialParams::default();
        params.merge(&self.financial);
        params
    }

    pub fn network<R: Rng + ?Sized>(&self, rng: &mut R) -> Network {
        topology::generate(self.topology, self.node_count, self.link_density, rng)
    }

    /// Generate the network, load it into `engine`, apply the vaccination
    /// rate and perform the initial action. Returns the id of the seeded
    /// node, if any.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        engine: &mut SimulationEngine,
        rng: &mut R,
    ) -> Result<Option<String>, ConfigError> {
        let Network { nodes, links } = self.network(rng);
        let epidemic = self.epidemic_params();
        let rate = epidemic.vaccination_rate;
        engine.initialize(nodes, links, self.mode, epidemic, self.financial_params())?;
        if rate > 0.0 {
            engine.vaccinate_fraction(rate);
        }

        let Some(action) = &self.initial_action else {
            return Ok(None);
        };
        let target = match &action.target {
            ActionTarget::HighestDegree => topology::highest_degree_node(engine.nodes()),
            ActionTarget::Random => topology::random_node(engine.nodes(), rng),
            ActionTarget::Specific(id) => engine.node(id),
        }
        .map(|n| n.id.clone());

        if let Some(id) = &target {
            match action.kind {
                ActionKind::Infect => engine.infect_node(id),
                ActionKind::Shock => {
                    engine.shock_node(id, action.magnitude.unwrap_or(DEFAULT_SHOCK_MAGNITUDE))
                }
            };
        }
        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

fn infect(target: ActionTarget) -> Option<InitialAction> {
    Some(InitialAction { kind: ActionKind::Infect, target, magnitude: None })
}

fn shock(target: ActionTarget, magnitude: f64) -> Option<InitialAction> {
    Some(InitialAction { kind: ActionKind::Shock, target, magnitude: Some(magnitude) })
}

fn epidemic(beta: f64, gamma: f64, mu: f64, vaccination_rate: f64) -> EpidemicParamsUpdate {
    EpidemicParamsUpdate {
        beta: Some(beta),
        gamma: Some(gamma),
        mu: Some(mu),
        vaccination_rate: Some(vaccination_rate),
        immunity_duration: Some(0),
    }
}

fn financial(
    leverage_ratio: f64,
    capital_buffer: f64,
    correlation_factor: f64,
    fire_sale_discount: f64,
    bailout_threshold: f64,
) -> FinancialParamsUpdate {
    FinancialParamsUpdate {
        leverage_ratio: Some(leverage_ratio),
        capital_buffer: Some(capital_buffer),
        correlation_factor: Some(correlation_factor),
        fire_sale_discount: Some(fire_sale_discount),
        bailout_threshold: Some(bailout_threshold),
    }
}

pub fn all() -> Vec<Preset> {
    use ActionTarget::{HighestDegree, Random};

    vec![
        // Epidemic
        Preset {
            id: "dramatic-outbreak",
            name: "Dramatic Outbreak",
            description: "High infection rate with a super-spreader as patient zero.",
            mode: SimulationMode::Epidemic,
            topology: Topology::ScaleFree,
            node_count: 150,
            link_density: 0.5,
            epidemic: epidemic(0.5, 0.08, 0.03, 0.0),
            financial: FinancialParamsUpdate::default(),
            initial_action: infect(HighestDegree),
        },
        Preset {
            id: "herd-immunity",
            name: "Herd Immunity",
            description: "65% vaccination stops the outbreak.",
            mode: SimulationMode::Epidemic,
            topology: Topology::SmallWorld,
            node_count: 150,
            link_density: 0.5,
            epidemic: epidemic(0.4, 0.1, 0.02, 0.65),
            financial: FinancialParamsUpdate::default(),
            initial_action: infect(Random),
        },
        Preset {
            id: "slow-burn",
            name: "Slow Burn",
            description: "Low infection rate spreading slowly through a dense network.",
            mode: SimulationMode::Epidemic,
            topology: Topology::SmallWorld,
            node_count: 200,
            link_density: 0.7,
            epidemic: epidemic(0.15, 0.05, 0.01, 0.0),
            financial: FinancialParamsUpdate::default(),
            initial_action: infect(Random),
        },
        Preset {
            id: "rapid-recovery",
            name: "Rapid Recovery",
            description: "Fast recovery limits the outbreak despite high infectivity.",
            mode: SimulationMode::Epidemic,
            topology: Topology::Random,
            node_count: 120,
            link_density: 0.4,
            epidemic: epidemic(0.6, 0.4, 0.01, 0.0),
            financial: FinancialParamsUpdate::default(),
            initial_action: infect(HighestDegree),
        },
        // Financial
        Preset {
            id: "too-big-to-fail",
            name: "Too Big to Fail",
            description: "Shock the largest bank with no bailouts available.",
            mode: SimulationMode::Financial,
            topology: Topology::ScaleFree,
            node_count: 100,
            link_density: 0.5,
            epidemic: EpidemicParamsUpdate::default(),
            financial: financial(15.0, 0.06, 0.4, 0.25, 1.0),
            initial_action: shock(HighestDegree, 0.6),
        },
        Preset {
            id: "bailout-intervention",
            name: "Bailout Intervention",
            description: "The same shock, but large institutions are rescued.",
            mode: SimulationMode::Financial,
            topology: Topology::ScaleFree,
            node_count: 100,
            link_density: 0.5,
            epidemic: EpidemicParamsUpdate::default(),
            financial: financial(15.0, 0.06, 0.4, 0.25, 0.3),
            initial_action: shock(HighestDegree, 0.6),
        },
        Preset {
            id: "isolated-failure",
            name: "Isolated Failure",
            description: "Low correlation keeps failures contained.",
            mode: SimulationMode::Financial,
            topology: Topology::Random,
            node_count: 80,
            link_density: 0.3,
            epidemic: EpidemicParamsUpdate::default(),
            financial: financial(10.0, 0.08, 0.1, 0.15, 1.0),
            initial_action: shock(Random, 0.5),
        },
        Preset {
            id: "contagion-cascade",
            name: "Contagion Cascade",
            description: "High correlation and severe fire sales collapse the system.",
            mode: SimulationMode::Financial,
            topology: Topology::SmallWorld,
            node_count: 120,
            link_density: 0.6,
            epidemic: EpidemicParamsUpdate::default(),
            financial: financial(12.0, 0.05, 0.7, 0.35, 1.0),
            initial_action: shock(Random, 0.4),
        },
    ]
}

pub fn by_id(id: &str) -> Option<Preset> {
    all().into_iter().find(|p| p.id == id)
}

pub fn by_mode(mode: SimulationMode) -> Vec<Preset> {
    all().into_iter().filter(|p| p.mode == mode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EpidemicState, FinancialState};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_catalogue() {
        assert_eq!(all().len(), 8);
        assert_eq!(by_mode(SimulationMode::Epidemic).len(), 4);
        assert_eq!(by_mode(SimulationMode::Financial).len(), 4);
        assert!(by_id("nope").is_none());
        let p = by_id("bailout-intervention").unwrap();
        assert!((p.financial_params().bailout_threshold - 0.3).abs() < f64::EPSILON);
        assert!((p.epidemic_params().beta - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_herd_immunity_applies_vaccination() {
        let preset = by_id("herd-immunity").unwrap();
        let mut engine = SimulationEngine::with_seed(1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let seeded = preset.apply(&mut engine, &mut rng).unwrap();

        let stats = engine.stats();
        // floor(150 * 0.65) = 97
        assert_eq!(stats.epidemic.vaccinated, 97);
        // The random target may already be vaccinated.
        assert!(seeded.is_some());
        assert!(stats.epidemic.infected <= 1);
    }

    #[test]
    fn test_shock_hits_the_hub() {
        let preset = by_id("too-big-to-fail").unwrap();
        let mut engine = SimulationEngine::with_seed(2);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let hub = preset.apply(&mut engine, &mut rng).unwrap().unwrap();

        let node = engine.node(&hub).unwrap();
        assert!(engine.nodes().iter().all(|n| n.degree <= node.degree));
        // 0.1..0.15 scaled by 0.4 is always below the 0.06 buffer.
        assert_ne!(node.financial_state, FinancialState::Healthy);
        assert_eq!(engine.mode(), SimulationMode::Financial);
    }

    #[test]
    fn test_outbreak_seeds_one_infection() {
        let preset = by_id("dramatic-outbreak").unwrap();
        let mut engine = SimulationEngine::with_seed(3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let id = preset.apply(&mut engine, &mut rng).unwrap().unwrap();
        assert_eq!(engine.node(&id).unwrap().epidemic_state, EpidemicState::Infected);
        assert_eq!(engine.stats().epidemic.infected, 1);
    }
}
