use contagion_engine::*;

// ========== Fixtures ==========

fn path3() -> (Vec<Node>, Vec<Link>) {
    let nodes = (0..3).map(|i| Node::new(i.to_string(), 100.0, 0.1)).collect();
    let links = vec![Link::new("0", "1", 1.0), Link::new("1", "2", 1.0)];
    (nodes, links)
}

fn engine_with(mode: SimulationMode, epidemic: EpidemicParams, financial: FinancialParams) -> SimulationEngine {
    let (nodes, links) = path3();
    let mut engine = SimulationEngine::with_seed(42);
    engine.initialize(nodes, links, mode, epidemic, financial).unwrap();
    engine
}

fn epidemic(beta: f64, gamma: f64, mu: f64) -> EpidemicParams {
    EpidemicParams { beta, gamma, mu, ..Default::default() }
}

// ========== Epidemic ==========

#[test]
fn test_path_certain_spread_one_hop() {
    let mut sim = engine_with(SimulationMode::Epidemic, epidemic(1.0, 0.0, 0.0), FinancialParams::default());
    assert!(sim.infect_node("1"));
    let stats = sim.tick();

    assert_eq!(stats.tick, 1);
    for id in ["0", "1", "2"] {
        assert_eq!(sim.node(id).unwrap().epidemic_state, EpidemicState::Infected, "node {}", id);
    }
    assert_eq!(stats.epidemic.total_infected, 3);
    assert_eq!(stats.epidemic.peak_infected, 3);
    assert_eq!(sim.node("0").unwrap().infected_at, Some(1));
    assert_eq!(sim.node("1").unwrap().infected_at, Some(0));
}

#[test]
fn test_zero_beta_never_spreads() {
    let mut sim = engine_with(SimulationMode::Epidemic, epidemic(0.0, 0.05, 0.0), FinancialParams::default());
    sim.infect_node("0");
    sim.infect_node("2");
    for _ in 0..200 {
        let stats = sim.tick();
        assert!(stats.epidemic.total_infected <= 2);
    }
    assert_ne!(sim.node("1").unwrap().epidemic_state, EpidemicState::Infected);
}

#[test]
fn test_death_takes_precedence_over_recovery() {
    let mut sim = engine_with(SimulationMode::Epidemic, epidemic(0.0, 1.0, 1.0), FinancialParams::default());
    sim.infect_node("0");
    sim.infect_node("1");
    let stats = sim.tick();

    assert_eq!(stats.epidemic.deceased, 2);
    assert_eq!(stats.epidemic.recovered, 0);
    assert!(sim.node("0").unwrap().recovered_at.is_none());
    assert!(sim.is_complete());
}

#[test]
fn test_infect_non_susceptible_is_noop() {
    let mut sim = engine_with(SimulationMode::Epidemic, epidemic(0.0, 1.0, 0.0), FinancialParams::default());
    sim.infect_node("0");
    sim.tick();
    assert_eq!(sim.node("0").unwrap().epidemic_state, EpidemicState::Recovered);

    let before = sim.stats().epidemic.total_infected;
    assert!(!sim.infect_node("0"));
    assert_eq!(sim.node("0").unwrap().epidemic_state, EpidemicState::Recovered);
    assert_eq!(sim.stats().epidemic.total_infected, before);
}

#[test]
fn test_observed_reproduction_number() {
    // Certain infection then certain recovery: 3 infected, 3 resolved.
    let mut sim = engine_with(SimulationMode::Epidemic, epidemic(1.0, 0.0, 0.0), FinancialParams::default());
    sim.infect_node("1");
    sim.tick();
    sim.set_epidemic_params(&EpidemicParamsUpdate { gamma: Some(1.0), ..Default::default() });
    let stats = sim.tick();
    assert_eq!(stats.epidemic.recovered, 3);
    assert!((stats.epidemic.r0 - 1.0).abs() < 1e-12);
}

// ========== Financial ==========

#[test]
fn test_severe_shock_distresses_immediately() {
    let mut sim = engine_with(SimulationMode::Financial, EpidemicParams::default(), FinancialParams::default());
    assert!(sim.shock_node("1", 0.99));
    let node = sim.node("1").unwrap();
    assert!((node.capital_ratio - 0.001).abs() < 1e-9);
    assert_eq!(node.financial_state, FinancialState::Distressed);
    assert_eq!(node.stressed_at, Some(0));
}

#[test]
fn test_default_writes_off_exact_assets() {
    let params = FinancialParams { bailout_threshold: 1.0, ..Default::default() };
    let mut sim = engine_with(SimulationMode::Financial, EpidemicParams::default(), params);
    sim.shock_node("1", 0.99);
    let stats = sim.tick();

    assert_eq!(sim.node("1").unwrap().financial_state, FinancialState::Defaulted);
    assert!((stats.financial.total_losses - 100.0).abs() < 1e-9);
    assert_eq!(stats.financial.cascade_depth, 1);
}

#[test]
fn test_cascade_spreads_through_exposures() {
    // Tick 1: node 1 defaults, neighbours end Stressed at 0.075.
    // Tick 2: full exposure loss (0.01) plus haircut (0.02) leaves them at 0.045.
    // Tick 3: another 0.01 puts them below half the buffer and they default.
    let params = FinancialParams { bailout_threshold: 1.0, ..Default::default() };
    let mut sim = engine_with(SimulationMode::Financial, EpidemicParams::default(), params);
    sim.shock_node("1", 0.99);

    let stats = sim.tick();
    assert_eq!(stats.financial.defaulted, 1);
    assert_eq!(stats.financial.stressed, 2);
    let stats = sim.tick();
    assert_eq!(stats.financial.defaulted, 1);
    assert!((sim.node("0").unwrap().capital_ratio - 0.045).abs() < 1e-9);
    assert!(!sim.is_complete());

    let stats = sim.tick();
    assert_eq!(stats.financial.defaulted, 3);
    assert!((stats.financial.total_losses - 300.0).abs() < 1e-9);
    assert!((stats.financial.systemic_risk - 1.0).abs() < 1e-12);
    assert_eq!(stats.financial.cascade_depth, 3);
    assert!(sim.is_complete());
}

#[test]
fn test_large_institution_bailed_out() {
    let (mut nodes, links) = path3();
    nodes[1].assets = 1_000.0;
    let mut sim = SimulationEngine::with_seed(1);
    sim.initialize(nodes, links, SimulationMode::Financial,
        EpidemicParams::default(), FinancialParams::default()).unwrap();
    sim.shock_node("1", 0.99);
    let stats = sim.tick();

    assert_eq!(sim.node("1").unwrap().financial_state, FinancialState::BailedOut);
    assert_eq!(stats.financial.bailed_out, 1);
    assert_eq!(stats.financial.total_losses, 0.0);
}

// ========== Lifecycle ==========

#[test]
fn test_tick_counter_lifecycle() {
    let mut sim = engine_with(SimulationMode::Epidemic, EpidemicParams::default(), FinancialParams::default());
    assert_eq!(sim.current_tick(), 0);
    assert!(!sim.is_complete());
    for expected in 1..=5 {
        assert_eq!(sim.tick().tick, expected);
    }
    sim.reset();
    assert_eq!(sim.current_tick(), 0);
    assert!(!sim.is_complete());
    sim.tick();
    let (nodes, links) = path3();
    sim.initialize(nodes, links, SimulationMode::Financial,
        EpidemicParams::default(), FinancialParams::default()).unwrap();
    assert_eq!(sim.current_tick(), 0);
}

#[test]
fn test_same_seed_same_trajectory() {
    let run = |seed| {
        let (nodes, links) = path3();
        let mut sim = SimulationEngine::with_seed(seed);
        sim.initialize(nodes, links, SimulationMode::Epidemic,
            epidemic(0.5, 0.2, 0.1), FinancialParams::default()).unwrap();
        sim.infect_node("0");
        (0..20).map(|_| sim.tick().epidemic).collect::<Vec<_>>()
    };
    assert_eq!(run(9), run(9));
}
