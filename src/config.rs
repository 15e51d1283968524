// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Parameters and Runtime Configuration
//
// Parameters are accepted as given. Probabilities outside [0, 1] and negative
// durations are neither rejected nor clamped.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Epidemic parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpidemicParams {
    /// Per-contact infection probability per tick.
    pub beta: f64,
    /// Recovery probability per tick.
    pub gamma: f64,
    /// Mortality probability per tick, drawn before recovery.
    pub mu: f64,
    /// Share of the population vaccinated when the network is seeded.
    #[serde(default)]
    pub vaccination_rate: f64,
    /// Ticks until a recovered node becomes susceptible again (0 = permanent).
    #[serde(default)]
    pub immunity_duration: u64,
}

impl Default for EpidemicParams {
    fn default() -> Self {
        Self {
            beta: 0.3,
            gamma: 0.1,
            mu: 0.02,
            vaccination_rate: 0.0,
            immunity_duration: 0,
        }
    }
}

/// Partial update for [`EpidemicParams`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpidemicParamsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccination_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immunity_duration: Option<u64>,
}

impl EpidemicParams {
    pub fn merge(&mut self, update: &EpidemicParamsUpdate) {
        if let Some(v) = update.beta { self.beta = v; }
        if let Some(v) = update.gamma { self.gamma = v; }
        if let Some(v) = update.mu { self.mu = v; }
        if let Some(v) = update.vaccination_rate { self.vaccination_rate = v; }
        if let Some(v) = update.immunity_duration { self.immunity_duration = v; }
    }
}

impl EpidemicParamsUpdate {
    /// Fold a later update over this one; later fields win.
    pub fn absorb(&mut self, later: &EpidemicParamsUpdate) {
        if later.beta.is_some() { self.beta = later.beta; }
        if later.gamma.is_some() { self.gamma = later.gamma; }
        if later.mu.is_some() { self.mu = later.mu; }
        if later.vaccination_rate.is_some() { self.vaccination_rate = later.vaccination_rate; }
        if later.immunity_duration.is_some() { self.immunity_duration = later.immunity_duration; }
    }
}

// ---------------------------------------------------------------------------
// Financial parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialParams {
    /// Debt/equity ratio. Carried for the controller, not used by the cascade.
    #[serde(default = "default_leverage_ratio")]
    pub leverage_ratio: f64,
    /// Regulatory capital buffer; below half of it a node is Distressed.
    pub capital_buffer: f64,
    pub correlation_factor: f64,
    pub fire_sale_discount: f64,
    /// Minimum share of system assets for a Distressed node to be rescued.
    pub bailout_threshold: f64,
}

fn default_leverage_ratio() -> f64 {
    10.0
}

impl Default for FinancialParams {
    fn default() -> Self {
        Self {
            leverage_ratio: default_leverage_ratio(),
            capital_buffer: 0.08,
            correlation_factor: 0.3,
            fire_sale_discount: 0.2,
            bailout_threshold: 0.5,
        }
    }
}

/// Partial update for [`FinancialParams`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialParamsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_buffer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_sale_discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bailout_threshold: Option<f64>,
}

impl FinancialParams {
    pub fn merge(&mut self, update: &FinancialParamsUpdate) {
        if let Some(v) = update.leverage_ratio { self.leverage_ratio = v; }
        if let Some(v) = update.capital_buffer { self.capital_buffer = v; }
        if let Some(v) = update.correlation_factor { self.correlation_factor = v; }
        if let Some(v) = update.fire_sale_discount { self.fire_sale_discount = v; }
        if let Some(v) = update.bailout_threshold { self.bailout_threshold = v; }
    }
}

impl FinancialParamsUpdate {
    /// Fold a later update over this one; later fields win.
    pub fn absorb(&mut self, later: &FinancialParamsUpdate) {
        if later.leverage_ratio.is_some() { self.leverage_ratio = later.leverage_ratio; }
        if later.capital_buffer.is_some() { self.capital_buffer = later.capital_buffer; }
        if later.correlation_factor.is_some() { self.correlation_factor = later.correlation_factor; }
        if later.fire_sale_discount.is_some() { self.fire_sale_discount = later.fire_sale_discount; }
        if later.bailout_threshold.is_some() { self.bailout_threshold = later.bailout_threshold; }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Ticks per second used when `start` carries no rate.
    pub default_tick_rate: f64,
    /// Floor for the timer period.
    pub min_period: Duration,
    /// Ceiling for the timer period, reached by very small tick rates.
    pub max_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_tick_rate: 20.0,
            min_period: Duration::from_millis(1),
            max_period: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Restart policy for a dead execution context.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    /// Restarts allowed over the supervisor's lifetime.
    pub max_restarts: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: 3,
            initial_backoff: Duration::from_millis(50),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl SupervisorConfig {
    /// Delay before restart attempt `attempt` (0-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = scaled.max(0.0).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}
