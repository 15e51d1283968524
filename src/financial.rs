// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Financial Cascade (Systemic Risk)
//
// One tick runs three ordered phases. Each phase reads the snapshot left by
// the previous one and applies its own updates as a single batch:
//   (a) direct exposure losses from failing counterparties
//   (b) fire-sale mark-to-market haircut proportional to aggregate distress
//   (c) resolution of every Distressed node into BailedOut or Defaulted

use crate::config::FinancialParams;
use crate::network::NetworkIndex;
use crate::types::{FinancialState, Node};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capital ratio restored on bailout.
pub const NOMINAL_RECOVERY_RATIO: f64 = 0.1;

/// Share of link exposure lost to a Distressed (not yet Defaulted) neighbour.
const DISTRESSED_EXPOSURE_SHARE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Threshold rule shared by shocks and both erosion phases.
pub fn classify(capital_ratio: f64, buffer: f64) -> FinancialState {
    if capital_ratio < 0.0 || capital_ratio < buffer * 0.5 {
        FinancialState::Distressed
    } else if capital_ratio < buffer {
        FinancialState::Stressed
    } else {
        FinancialState::Healthy
    }
}

/// Loss absorbed by node `idx` from its failing counterparties.
pub fn direct_exposure_loss(nodes: &[Node], index: &NetworkIndex, idx: usize) -> f64 {
    index.incident(idx).iter()
        .map(|inc| match nodes[inc.other].financial_state {
            FinancialState::Defaulted => inc.exposure,
            FinancialState::Distressed => inc.exposure * DISTRESSED_EXPOSURE_SHARE,
            _ => 0.0,
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CascadeOutcome {
    /// State changes made by phases (a) and (b).
    pub propagated: u32,
    pub fire_sale_haircut: f64,
    pub defaulted: u32,
    pub bailed_out: u32,
    /// Assets written off by defaults this tick.
    pub losses: f64,
}

/// Run all three phases. `tick` is the already-incremented counter.
pub fn step(
    nodes: &mut [Node],
    index: &NetworkIndex,
    params: &FinancialParams,
    tick: u64,
) -> CascadeOutcome {
    let mut outcome = CascadeOutcome::default();
    outcome.propagated += direct_exposure(nodes, index, params, tick);
    let (changed, haircut) = fire_sale(nodes, params, tick);
    outcome.propagated += changed;
    outcome.fire_sale_haircut = haircut;
    resolve(nodes, params, &mut outcome);
    outcome
}

/// Phase (a). Returns the number of state changes.
fn direct_exposure(
    nodes: &mut [Node],
    index: &NetworkIndex,
    params: &FinancialParams,
    tick: u64,
) -> u32 {
    let updates: Vec<(usize, f64)> = (0..nodes.len())
        .filter(|&idx| nodes[idx].financial_state.is_solvent())
        .filter_map(|idx| {
            let loss = direct_exposure_loss(nodes, index, idx);
            (loss > 0.0).then(|| (idx, nodes[idx].capital_ratio - loss / nodes[idx].assets))
        })
        .collect();

    let mut changed = 0;
    for (idx, ratio) in updates {
        if apply_ratio(&mut nodes[idx], ratio, params.capital_buffer, tick) {
            changed += 1;
        }
    }
    changed
}

/// Phase (b). Returns the number of state changes and the haircut applied.
fn fire_sale(nodes: &mut [Node], params: &FinancialParams, tick: u64) -> (u32, f64) {
    let failing = nodes.iter()
        .filter(|n| matches!(
            n.financial_state,
            FinancialState::Distressed | FinancialState::Defaulted
        ))
        .count();
    if failing == 0 || nodes.is_empty() {
        return (0, 0.0);
    }

    // Uniform across the network, independent of links.
    let haircut = params.fire_sale_discount
        * params.correlation_factor
        * (failing as f64 / nodes.len() as f64);

    // Each node's update depends only on its own ratio and the precomputed
    // haircut, so updating in place is equivalent to a batch.
    let mut changed = 0;
    for node in nodes.iter_mut().filter(|n| n.financial_state.is_solvent()) {
        let ratio = node.capital_ratio - haircut;
        if apply_ratio(node, ratio, params.capital_buffer, tick) {
            changed += 1;
        }
    }

    (changed, haircut)
}

/// Phase (c).
fn resolve(nodes: &mut [Node], params: &FinancialParams, outcome: &mut CascadeOutcome) {
    let total_assets: f64 = nodes.iter().map(|n| n.assets).sum();

    for node in nodes.iter_mut() {
        if node.financial_state != FinancialState::Distressed {
            continue;
        }
        let share = node.assets / total_assets;
        if share >= params.bailout_threshold {
            node.financial_state = FinancialState::BailedOut;
            node.capital_ratio = NOMINAL_RECOVERY_RATIO;
            outcome.bailed_out += 1;
        } else {
            node.financial_state = FinancialState::Defaulted;
            outcome.defaulted += 1;
            outcome.losses += node.assets;
        }
    }
}

/// Store the new ratio and reclassify. Returns true when the state changed.
fn apply_ratio(node: &mut Node, ratio: f64, buffer: f64, tick: u64) -> bool {
    node.capital_ratio = ratio;
    let next = classify(ratio, buffer);
    if next == node.financial_state {
        return false;
    }
    if matches!(next, FinancialState::Stressed | FinancialState::Distressed) {
        node.stressed_at = Some(tick);
    }
    node.financial_state = next;
    true
}
