// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Simulation Engine

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::clock;
use crate::config::{EpidemicParams, EpidemicParamsUpdate, FinancialParams, FinancialParamsUpdate};
use crate::epidemic;
use crate::error::ConfigError;
use crate::financial::{self, NOMINAL_RECOVERY_RATIO};
use crate::network::NetworkIndex;
use crate::types::*;

/// Baseline capital ratio drawn on reset: uniform in [BASE, BASE + SPREAD).
const BASELINE_CAPITAL_RATIO: f64 = 0.1;
const BASELINE_CAPITAL_SPREAD: f64 = 0.05;

// ─── SimulationEngine struct ─────────────────────────────────────────────────

/// Owns the graph for one run. Every mutation goes through `&mut self`, so a
/// single owner is the only writer.
pub struct SimulationEngine {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: NetworkIndex,
    pub(crate) mode: SimulationMode,
    pub(crate) epidemic_params: EpidemicParams,
    pub(crate) financial_params: FinancialParams,

    pub(crate) tick: u64,
    pub(crate) started_at_ms: f64,

    // Running aggregates, cleared by initialize and reset
    pub(crate) peak_infected: u32,
    pub(crate) total_infected: u32,
    pub(crate) cascade_depth: u64,
    pub(crate) total_losses: f64,

    pub(crate) rng: ChaCha8Rng,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Engine seeded from OS entropy.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Reproducible engine: the same seed and command sequence yield the same run.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            nodes: Vec::new(),
            index: NetworkIndex::default(),
            mode: SimulationMode::Epidemic,
            epidemic_params: EpidemicParams::default(),
            financial_params: FinancialParams::default(),
            tick: 0,
            started_at_ms: clock::now_ms(),
            peak_infected: 0,
            total_infected: 0,
            cascade_depth: 0,
            total_losses: 0.0,
            rng,
        }
    }

    // ─── Initialization ──────────────────────────────────────────────────────

    /// Replace all engine state with a new run. The engine takes ownership of
    /// the node and link data, so the caller's copies are never shared.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for duplicate node ids or dangling link
    /// endpoints. On error the previous run is left untouched.
    pub fn initialize(
        &mut self,
        mut nodes: Vec<Node>,
        links: Vec<Link>,
        mode: SimulationMode,
        epidemic_params: EpidemicParams,
        financial_params: FinancialParams,
    ) -> Result<(), ConfigError> {
        let index = NetworkIndex::build(&nodes, &links)?;

        let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        for (idx, node) in nodes.iter_mut().enumerate() {
            node.degree = index.degree(idx) as u32;
            node.neighbors = index.neighbors(idx).iter().map(|&n| ids[n].clone()).collect();
        }

        debug!(
            nodes = nodes.len(),
            links = links.len(),
            ?mode,
            "initializing simulation"
        );

        self.nodes = nodes;
        self.index = index;
        self.mode = mode;
        self.epidemic_params = epidemic_params;
        self.financial_params = financial_params;
        self.clear_run_state();
        Ok(())
    }

    fn clear_run_state(&mut self) {
        self.tick = 0;
        self.started_at_ms = clock::now_ms();
        self.peak_infected = 0;
        self.total_infected = 0;
        self.cascade_depth = 0;
        self.total_losses = 0.0;
    }

    // ─── Parameter Updates ───────────────────────────────────────────────────

    pub fn set_epidemic_params(&mut self, update: &EpidemicParamsUpdate) {
        self.epidemic_params.merge(update);
    }

    pub fn set_financial_params(&mut self, update: &FinancialParamsUpdate) {
        self.financial_params.merge(update);
    }

    // ─── Node Actions ────────────────────────────────────────────────────────
    //
    // Each action is a no-op when the node is unknown or not in the required
    // state. The return value reports whether anything changed.

    pub fn infect_node(&mut self, node_id: &str) -> bool {
        let tick = self.tick;
        let Some(node) = self.node_mut_in(node_id, |n| n.epidemic_state == EpidemicState::Susceptible)
        else {
            return false;
        };
        node.epidemic_state = EpidemicState::Infected;
        node.infected_at = Some(tick);
        self.total_infected += 1;
        let infected = self.count_epidemic(EpidemicState::Infected);
        self.peak_infected = self.peak_infected.max(infected);
        true
    }

    pub fn vaccinate_node(&mut self, node_id: &str) -> bool {
        match self.node_mut_in(node_id, |n| n.epidemic_state == EpidemicState::Susceptible) {
            Some(node) => {
                node.epidemic_state = EpidemicState::Vaccinated;
                true
            }
            None => false,
        }
    }

    /// Scale a Healthy node's capital ratio by `1 - magnitude` and reclassify.
    pub fn shock_node(&mut self, node_id: &str, magnitude: f64) -> bool {
        let tick = self.tick;
        let buffer = self.financial_params.capital_buffer;
        let Some(node) = self.node_mut_in(node_id, |n| n.financial_state == FinancialState::Healthy)
        else {
            return false;
        };
        node.capital_ratio *= 1.0 - magnitude;
        node.financial_state = financial::classify(node.capital_ratio, buffer);
        node.stressed_at = Some(tick);
        true
    }

    pub fn bailout_node(&mut self, node_id: &str) -> bool {
        let eligible = |n: &Node| {
            matches!(n.financial_state, FinancialState::Stressed | FinancialState::Distressed)
        };
        match self.node_mut_in(node_id, eligible) {
            Some(node) => {
                node.financial_state = FinancialState::BailedOut;
                node.capital_ratio = NOMINAL_RECOVERY_RATIO;
                true
            }
            None => false,
        }
    }

    /// Vaccinate `floor(N * rate)` Susceptible nodes chosen uniformly at random.
    /// Returns how many were vaccinated.
    pub fn vaccinate_fraction(&mut self, rate: f64) -> usize {
        let mut candidates: Vec<usize> = self.nodes.iter().enumerate()
            .filter(|(_, n)| n.epidemic_state == EpidemicState::Susceptible)
            .map(|(i, _)| i)
            .collect();
        // f64 -> usize saturates, so negative or NaN rates vaccinate nobody.
        let wanted = (self.nodes.len() as f64 * rate).floor() as usize;
        let count = wanted.min(candidates.len());
        candidates.shuffle(&mut self.rng);
        for &idx in &candidates[..count] {
            self.nodes[idx].epidemic_state = EpidemicState::Vaccinated;
        }
        count
    }

    fn node_mut_in(&mut self, node_id: &str, pred: impl Fn(&Node) -> bool) -> Option<&mut Node> {
        let idx = self.index.index_of(node_id)?;
        let node = &mut self.nodes[idx];
        pred(node).then_some(node)
    }

    // ─── Simulation Tick ─────────────────────────────────────────────────────

    /// Advance exactly one step and return the resulting statistics.
    pub fn tick(&mut self) -> SimulationStats {
        self.tick += 1;
        match self.mode {
            SimulationMode::Epidemic => self.epidemic_tick(),
            SimulationMode::Financial => self.financial_tick(),
        }
        self.stats()
    }

    fn epidemic_tick(&mut self) {
        let outcome = epidemic::step(
            &mut self.nodes,
            &self.index,
            &self.epidemic_params,
            self.tick,
            &mut self.rng,
        );
        self.total_infected += outcome.newly_infected;
        let infected = self.count_epidemic(EpidemicState::Infected);
        self.peak_infected = self.peak_infected.max(infected);
        trace!(tick = self.tick, ?outcome, infected, "epidemic tick");
    }

    fn financial_tick(&mut self) {
        let outcome = financial::step(
            &mut self.nodes,
            &self.index,
            &self.financial_params,
            self.tick,
        );
        if outcome.propagated > 0 {
            self.cascade_depth = self.tick;
        }
        self.total_losses += outcome.losses;
        trace!(tick = self.tick, ?outcome, "financial tick");
    }

    // ─── Statistics ──────────────────────────────────────────────────────────

    pub fn stats(&self) -> SimulationStats {
        let mut epidemic = EpidemicStats::default();
        let mut fin = FinancialStats::default();

        for node in &self.nodes {
            match node.epidemic_state {
                EpidemicState::Susceptible => epidemic.susceptible += 1,
                EpidemicState::Infected => epidemic.infected += 1,
                EpidemicState::Recovered => epidemic.recovered += 1,
                EpidemicState::Deceased => epidemic.deceased += 1,
                EpidemicState::Vaccinated => epidemic.vaccinated += 1,
            }
            match node.financial_state {
                FinancialState::Healthy => fin.healthy += 1,
                FinancialState::Stressed => fin.stressed += 1,
                FinancialState::Distressed => fin.distressed += 1,
                FinancialState::Defaulted => fin.defaulted += 1,
                FinancialState::BailedOut => fin.bailed_out += 1,
            }
        }

        epidemic.r0 = self.reproduction_estimate(epidemic.recovered + epidemic.deceased);
        epidemic.peak_infected = self.peak_infected;
        epidemic.total_infected = self.total_infected;

        let at_risk = fin.stressed + fin.distressed + fin.defaulted;
        fin.systemic_risk = if self.nodes.is_empty() {
            0.0
        } else {
            at_risk as f64 / self.nodes.len() as f64
        };
        fin.total_losses = self.total_losses;
        fin.cascade_depth = self.cascade_depth;

        SimulationStats {
            epidemic,
            financial: fin,
            tick: self.tick,
            elapsed_ms: (clock::now_ms() - self.started_at_ms).max(0.0),
        }
    }

    /// Observed spread once anyone has left the Infected state, otherwise the
    /// a-priori `beta * avg_degree / gamma`.
    fn reproduction_estimate(&self, resolved: u32) -> f64 {
        if resolved > 0 {
            return self.total_infected as f64 / resolved as f64;
        }
        if self.nodes.is_empty() {
            return 0.0;
        }
        let avg_degree = self.nodes.iter().map(|n| n.degree as f64).sum::<f64>()
            / self.nodes.len() as f64;
        self.epidemic_params.beta * avg_degree / self.epidemic_params.gamma
    }

    // ─── Reset ───────────────────────────────────────────────────────────────

    /// Return every node to Susceptible/Healthy with a fresh baseline capital
    /// ratio. Topology is unchanged.
    pub fn reset(&mut self) {
        self.clear_run_state();
        for node in self.nodes.iter_mut() {
            node.epidemic_state = EpidemicState::Susceptible;
            node.financial_state = FinancialState::Healthy;
            node.capital_ratio =
                BASELINE_CAPITAL_RATIO + self.rng.gen::<f64>() * BASELINE_CAPITAL_SPREAD;
            node.infected_at = None;
            node.recovered_at = None;
            node.stressed_at = None;
        }
        debug!(nodes = self.nodes.len(), "simulation reset");
    }

    // ─── Getters ─────────────────────────────────────────────────────────────

    /// Epidemic runs end when nobody is infected; financial runs when nobody
    /// is Stressed or Distressed. Never true before the first tick.
    pub fn is_complete(&self) -> bool {
        if self.tick == 0 {
            return false;
        }
        match self.mode {
            SimulationMode::Epidemic => self.count_epidemic(EpidemicState::Infected) == 0,
            SimulationMode::Financial => !self.nodes.iter().any(|n| matches!(
                n.financial_state,
                FinancialState::Stressed | FinancialState::Distressed
            )),
        }
    }

    pub fn node_views(&self) -> Vec<NodeView> {
        self.nodes.iter().map(NodeView::from).collect()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.index.index_of(node_id).map(|idx| &self.nodes[idx])
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub fn epidemic_params(&self) -> &EpidemicParams {
        &self.epidemic_params
    }

    pub fn financial_params(&self) -> &FinancialParams {
        &self.financial_params
    }

    fn count_epidemic(&self, state: EpidemicState) -> u32 {
        self.nodes.iter().filter(|n| n.epidemic_state == state).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path3() -> (Vec<Node>, Vec<Link>) {
        let nodes = (0..3).map(|i| Node::new(i.to_string(), 100.0, 0.1)).collect();
        let links = vec![Link::new("0", "1", 1.0), Link::new("1", "2", 1.0)];
        (nodes, links)
    }

    fn engine(mode: SimulationMode) -> SimulationEngine {
        let (nodes, links) = path3();
        let mut e = SimulationEngine::with_seed(7);
        e.initialize(nodes, links, mode, EpidemicParams::default(), FinancialParams::default())
            .unwrap();
        e
    }

    #[test]
    fn test_initialize_derives_degree_and_neighbors() {
        let e = engine(SimulationMode::Epidemic);
        let middle = e.node("1").unwrap();
        assert_eq!(middle.degree, 2);
        assert_eq!(middle.neighbors, vec!["0".to_string(), "2".to_string()]);
        assert_eq!(e.current_tick(), 0);
    }

    #[test]
    fn test_failed_initialize_keeps_previous_run() {
        let mut e = engine(SimulationMode::Epidemic);
        e.infect_node("1");
        e.tick();
        let before = e.current_tick();

        let (nodes, mut links) = path3();
        links.push(Link::new("0", "ghost", 1.0));
        let err = e.initialize(
            nodes, links, SimulationMode::Financial,
            EpidemicParams::default(), FinancialParams::default(),
        );
        assert!(err.is_err());
        assert_eq!(e.current_tick(), before);
        assert_eq!(e.mode(), SimulationMode::Epidemic);
    }

    #[test]
    fn test_reinitialize_discards_state() {
        let mut e = engine(SimulationMode::Epidemic);
        e.infect_node("0");
        e.tick();
        e.tick();
        let (nodes, links) = path3();
        e.initialize(nodes, links, SimulationMode::Epidemic,
            EpidemicParams::default(), FinancialParams::default()).unwrap();
        let stats = e.stats();
        assert_eq!(stats.tick, 0);
        assert_eq!(stats.epidemic.total_infected, 0);
        assert_eq!(stats.epidemic.peak_infected, 0);
        assert_eq!(stats.epidemic.susceptible, 3);
    }

    #[test]
    fn test_infect_requires_susceptible() {
        let mut e = engine(SimulationMode::Epidemic);
        assert!(e.vaccinate_node("0"));
        assert!(!e.infect_node("0"));
        assert!(e.infect_node("1"));
        assert!(!e.infect_node("1"));
        assert!(!e.infect_node("missing"));
        let stats = e.stats();
        assert_eq!(stats.epidemic.total_infected, 1);
        assert_eq!(e.node("0").unwrap().epidemic_state, EpidemicState::Vaccinated);
    }

    #[test]
    fn test_shock_and_bailout_preconditions() {
        let mut e = engine(SimulationMode::Financial);
        assert!(!e.bailout_node("0"));
        assert!(e.shock_node("0", 0.5));
        assert_eq!(e.node("0").unwrap().financial_state, FinancialState::Stressed);
        assert!(!e.shock_node("0", 0.5));
        assert!(e.bailout_node("0"));
        let node = e.node("0").unwrap();
        assert_eq!(node.financial_state, FinancialState::BailedOut);
        assert!((node.capital_ratio - NOMINAL_RECOVERY_RATIO).abs() < f64::EPSILON);
        assert!(!e.bailout_node("0"));
    }

    #[test]
    fn test_params_merge_leaves_run_alone() {
        let mut e = engine(SimulationMode::Epidemic);
        e.infect_node("1");
        e.tick();
        e.set_epidemic_params(&EpidemicParamsUpdate { beta: Some(0.0), ..Default::default() });
        assert_eq!(e.current_tick(), 1);
        assert_eq!(e.epidemic_params().beta, 0.0);
        assert!((e.epidemic_params().gamma - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reproduction_estimate_a_priori() {
        let e = engine(SimulationMode::Epidemic);
        // avg degree 4/3, beta 0.3, gamma 0.1
        assert!((e.stats().epidemic.r0 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_canonical_state() {
        let mut e = engine(SimulationMode::Financial);
        e.shock_node("1", 0.99);
        e.tick();
        e.reset();
        let stats = e.stats();
        assert_eq!(stats.tick, 0);
        assert_eq!(stats.financial.healthy, 3);
        assert_eq!(stats.financial.total_losses, 0.0);
        assert_eq!(stats.epidemic.susceptible, 3);
        for n in e.nodes() {
            assert!(n.capital_ratio >= 0.1 && n.capital_ratio < 0.15);
            assert!(n.stressed_at.is_none());
        }
        assert_eq!(e.node("1").unwrap().degree, 2);
    }

    #[test]
    fn test_vaccinate_fraction() {
        let nodes: Vec<Node> = (0..10).map(|i| Node::new(i.to_string(), 100.0, 0.1)).collect();
        let mut e = SimulationEngine::with_seed(3);
        e.initialize(nodes, Vec::new(), SimulationMode::Epidemic,
            EpidemicParams::default(), FinancialParams::default()).unwrap();
        assert_eq!(e.vaccinate_fraction(0.65), 6);
        assert_eq!(e.stats().epidemic.vaccinated, 6);
        assert_eq!(e.vaccinate_fraction(-1.0), 0);
        assert_eq!(e.vaccinate_fraction(5.0), 4);
    }

    #[test]
    fn test_complete_never_at_tick_zero() {
        let e = engine(SimulationMode::Epidemic);
        assert!(!e.is_complete());
        let f = engine(SimulationMode::Financial);
        assert!(!f.is_complete());
    }

    #[test]
    fn test_empty_network() {
        let mut e = SimulationEngine::with_seed(1);
        e.initialize(Vec::new(), Vec::new(), SimulationMode::Financial,
            EpidemicParams::default(), FinancialParams::default()).unwrap();
        let stats = e.tick();
        assert_eq!(stats.tick, 1);
        assert_eq!(stats.financial.systemic_risk, 0.0);
        assert_eq!(stats.epidemic.r0, 0.0);
        assert!(e.is_complete());
    }
}
