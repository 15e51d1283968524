// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Tick Scheduler and Session
//
// `Session` is the synchronous core of an execution context: it owns the
// engine and the scheduler state and turns each inbound command or timer
// firing into at most one outbound message. The native worker thread and
// the wasm binding both drive the same `Session`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::engine::SimulationEngine;
use crate::protocol::{Command, Outbound, Snapshot};

// ─── TickScheduler ───────────────────────────────────────────────────────────

/// Start/pause state of the periodic timer. The timer itself belongs to the
/// host; this only tracks whether one should exist and at what period.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    config: SchedulerConfig,
    tick_rate: f64,
    /// Period of the active timer, `None` while paused.
    active: Option<Duration>,
}

impl TickScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            tick_rate: config.default_tick_rate,
            config,
            active: None,
        }
    }

    /// Begin ticking. A rate, when given, is remembered for this and later
    /// starts. Returns false when already running; the existing timer keeps
    /// its period.
    pub fn start(&mut self, tick_rate: Option<f64>) -> bool {
        if let Some(rate) = tick_rate {
            self.tick_rate = rate;
        }
        if self.active.is_some() {
            return false;
        }
        let period = self.period_for(self.tick_rate);
        self.active = Some(period);
        info!(tick_rate = self.tick_rate, period_ms = period.as_millis() as u64, "simulation started");
        true
    }

    /// Stop ticking. Idempotent; returns whether a timer was active.
    pub fn pause(&mut self) -> bool {
        let was_running = self.active.take().is_some();
        if was_running {
            info!("simulation paused");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Period of the active timer.
    pub fn period(&self) -> Option<Duration> {
        self.active
    }

    pub fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    /// `floor(1000 / rate)` milliseconds, bounded by the configured floor
    /// and ceiling. Non-positive or non-finite rates fall back to the default.
    pub fn period_for(&self, tick_rate: f64) -> Duration {
        let rate = if tick_rate.is_finite() && tick_rate > 0.0 {
            tick_rate
        } else {
            self.config.default_tick_rate
        };
        let max_ms = self.config.max_period.as_millis() as f64;
        let ms = (1000.0 / rate).floor();
        let ms = if ms.is_finite() { ms.min(max_ms) } else { max_ms };
        // NaN saturates to 0 and is lifted by the floor below.
        Duration::from_millis(ms as u64)
            .max(self.config.min_period)
            .min(self.config.max_period)
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct Session {
    engine: SimulationEngine,
    scheduler: TickScheduler,
}

impl Session {
    pub fn new(engine: SimulationEngine, config: SchedulerConfig) -> Self {
        Self {
            engine,
            scheduler: TickScheduler::new(config),
        }
    }

    /// Apply one inbound command. Returns the message to post back, if any.
    pub fn handle(&mut self, command: Command) -> Option<Outbound> {
        match command {
            Command::Init { nodes, links, mode, epidemic_params, financial_params } => {
                self.scheduler.pause();
                match self.engine.initialize(nodes, links, mode, epidemic_params, financial_params) {
                    Ok(()) => Some(self.snapshot()),
                    Err(e) => {
                        warn!(error = %e, "init rejected");
                        Some(Outbound::Error { message: e.to_string() })
                    }
                }
            }
            Command::Params { epidemic_params, financial_params } => {
                if let Some(update) = &epidemic_params {
                    self.engine.set_epidemic_params(update);
                }
                if let Some(update) = &financial_params {
                    self.engine.set_financial_params(update);
                }
                debug!("parameters updated");
                None
            }
            Command::Infect { node_id } => {
                self.engine.infect_node(&node_id);
                Some(self.snapshot())
            }
            Command::Vaccinate { node_id } => {
                self.engine.vaccinate_node(&node_id);
                Some(self.snapshot())
            }
            Command::Bailout { node_id } => {
                self.engine.bailout_node(&node_id);
                Some(self.snapshot())
            }
            Command::Shock { node_id, magnitude } => {
                self.engine.shock_node(&node_id, magnitude);
                Some(self.snapshot())
            }
            Command::Start { tick_rate } => {
                self.scheduler.start(tick_rate);
                None
            }
            Command::Pause => {
                self.scheduler.pause();
                None
            }
            Command::Reset => {
                self.scheduler.pause();
                self.engine.reset();
                Some(self.snapshot())
            }
            Command::Step => {
                if self.scheduler.is_running() {
                    debug!("step ignored while running");
                    return None;
                }
                self.engine.tick();
                Some(self.snapshot())
            }
        }
    }

    /// One timer firing. Ticks only while running and stops the timer once
    /// the run is complete.
    pub fn on_timer(&mut self) -> Option<Outbound> {
        if !self.scheduler.is_running() {
            return None;
        }
        self.engine.tick();
        let out = self.snapshot();
        if self.engine.is_complete() {
            info!(tick = self.engine.current_tick(), "run complete");
            self.scheduler.pause();
        }
        Some(out)
    }

    pub fn snapshot(&self) -> Outbound {
        Outbound::Tick(Snapshot::capture(&self.engine))
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }
}
