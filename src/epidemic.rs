// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Epidemic Model (SIR+)
//
// Every draw is made against the pre-tick states and the resulting
// transitions are applied in one batch, so no node's outcome depends on
// another node's outcome from the same tick.

use rand::Rng;

use crate::config::EpidemicParams;
use crate::network::NetworkIndex;
use crate::types::{EpidemicState, Node};

/// Counts of transitions applied during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpidemicOutcome {
    pub newly_infected: u32,
    pub recovered: u32,
    pub deceased: u32,
    pub waned: u32,
}

/// P(infection) = 1 - (1 - beta)^k for `k` infected neighbours.
pub fn infection_probability(beta: f64, infected_neighbors: usize) -> f64 {
    if infected_neighbors == 0 {
        return 0.0;
    }
    1.0 - (1.0 - beta).powi(infected_neighbors as i32)
}

/// Single Bernoulli draw. `p >= 1` always fires and `p <= 0` never does,
/// so out-of-range parameters degrade instead of panicking.
pub(crate) fn bernoulli<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Advance every node by one tick. `tick` is the already-incremented counter.
pub fn step<R: Rng + ?Sized>(
    nodes: &mut [Node],
    index: &NetworkIndex,
    params: &EpidemicParams,
    tick: u64,
    rng: &mut R,
) -> EpidemicOutcome {
    let mut transitions: Vec<(usize, EpidemicState)> = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        match node.epidemic_state {
            EpidemicState::Susceptible => {
                let k = index.neighbors(idx).iter()
                    .filter(|&&n| nodes[n].epidemic_state == EpidemicState::Infected)
                    .count();
                if k > 0 && bernoulli(rng, infection_probability(params.beta, k)) {
                    transitions.push((idx, EpidemicState::Infected));
                }
            }
            EpidemicState::Infected => {
                // Death is checked first; a node that dies cannot also recover.
                if bernoulli(rng, params.mu) {
                    transitions.push((idx, EpidemicState::Deceased));
                } else if bernoulli(rng, params.gamma) {
                    transitions.push((idx, EpidemicState::Recovered));
                }
            }
            EpidemicState::Recovered => {
                if params.immunity_duration > 0 {
                    if let Some(at) = node.recovered_at {
                        if tick.saturating_sub(at) >= params.immunity_duration {
                            transitions.push((idx, EpidemicState::Susceptible));
                        }
                    }
                }
            }
            EpidemicState::Deceased | EpidemicState::Vaccinated => {}
        }
    }

    let mut outcome = EpidemicOutcome::default();
    for (idx, next) in transitions {
        let node = &mut nodes[idx];
        match next {
            EpidemicState::Infected => {
                node.infected_at = Some(tick);
                outcome.newly_infected += 1;
            }
            EpidemicState::Recovered => {
                node.recovered_at = Some(tick);
                outcome.recovered += 1;
            }
            EpidemicState::Deceased => outcome.deceased += 1,
            EpidemicState::Susceptible => {
                node.recovered_at = None;
                outcome.waned += 1;
            }
            EpidemicState::Vaccinated => {}
        }
        node.epidemic_state = next;
    }
    outcome
}
