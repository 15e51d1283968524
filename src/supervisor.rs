// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Worker Supervisor
//
// Wraps a `Worker` and recreates it when the thread dies. The last accepted
// `init` and every `params` update since are replayed into the fresh session, so
// the controller sees a restarted run with the same topology and parameters
// rather than an empty engine. Restarts are capped by `SupervisorConfig`.

use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{EpidemicParamsUpdate, FinancialParamsUpdate, SupervisorConfig};
use crate::error::WorkerError;
use crate::network::NetworkIndex;
use crate::protocol::{Command, Outbound};
use crate::scheduler::Session;
use crate::worker::Worker;

pub struct Supervisor<F>
where
    F: FnMut() -> Session,
{
    factory: F,
    config: SupervisorConfig,
    worker: Worker,
    restarts: u32,
    last_init: Option<Command>,
    epidemic_updates: Option<EpidemicParamsUpdate>,
    financial_updates: Option<FinancialParamsUpdate>,
}

impl<F> Supervisor<F>
where
    F: FnMut() -> Session,
{
    /// `factory` builds a fresh session for the first worker and for every restart.
    pub fn spawn(mut factory: F, config: SupervisorConfig) -> Result<Self, WorkerError> {
        let worker = Worker::spawn(factory())?;
        Ok(Self {
            factory,
            config,
            worker,
            restarts: 0,
            last_init: None,
            epidemic_updates: None,
            financial_updates: None,
        })
    }

    /// Forward a command, restarting the worker first if it has died.
    pub fn send(&mut self, command: Command) -> Result<(), WorkerError> {
        let replayed = self.remember(&command);
        match self.worker.send(command.clone()) {
            Err(WorkerError::Disconnected) => {
                self.recover()?;
                // init and params already went in with the replay.
                if replayed {
                    Ok(())
                } else {
                    self.worker.send(command)
                }
            }
            other => other,
        }
    }

    /// Next outbound message, or `Ok(None)` on timeout. A dead worker is
    /// restarted and the call returns `Ok(None)`; the replayed init snapshot
    /// arrives on the next call.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Outbound>, WorkerError> {
        match self.worker.recv_timeout(timeout) {
            Err(WorkerError::Disconnected) => {
                self.recover()?;
                Ok(None)
            }
            other => other,
        }
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn is_alive(&self) -> bool {
        self.worker.is_alive()
    }

    /// Stop the current worker without restarting it. The next `send` or
    /// `recv_timeout` triggers recovery.
    pub fn kill_worker(&mut self) {
        self.worker.terminate();
    }

    /// Returns true for commands that the replay covers. A malformed init is
    /// not remembered: the session rejects it and keeps the previous run.
    fn remember(&mut self, command: &Command) -> bool {
        match command {
            Command::Init { nodes, links, .. } => {
                if NetworkIndex::build(nodes, links).is_err() {
                    return false;
                }
                self.last_init = Some(command.clone());
                self.epidemic_updates = None;
                self.financial_updates = None;
                true
            }
            Command::Params { epidemic_params, financial_params } => {
                if let Some(update) = epidemic_params {
                    self.epidemic_updates.get_or_insert_with(Default::default).absorb(update);
                }
                if let Some(update) = financial_params {
                    self.financial_updates.get_or_insert_with(Default::default).absorb(update);
                }
                true
            }
            _ => false,
        }
    }

    fn recover(&mut self) -> Result<(), WorkerError> {
        while self.restarts < self.config.max_restarts {
            let attempt = self.restarts;
            self.restarts += 1;
            let delay = self.config.backoff_for(attempt);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "worker terminated, restarting");
            thread::sleep(delay);

            match self.restart() {
                Ok(()) => {
                    info!(restarts = self.restarts, "worker restarted");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, attempt, "worker restart failed"),
            }
        }
        error!(attempts = self.restarts, "worker restart budget exhausted");
        Err(WorkerError::RestartsExhausted { attempts: self.restarts })
    }

    fn restart(&mut self) -> Result<(), WorkerError> {
        let worker = Worker::spawn((self.factory)())?;
        if let Some(init) = &self.last_init {
            worker.send(init.clone())?;
        }
        if self.epidemic_updates.is_some() || self.financial_updates.is_some() {
            worker.send(Command::Params {
                epidemic_params: self.epidemic_updates.clone(),
                financial_params: self.financial_updates.clone(),
            })?;
        }
        self.worker = worker;
        Ok(())
    }
}
