// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Native Worker Thread
//
// The worker thread owns a `Session` exclusively (moved in at spawn). The
// controller never touches engine state; commands arrive over an unbounded
// crossbeam channel and snapshots go back over another. The periodic timer
// is a `crossbeam_channel::tick` receiver selected alongside the command
// channel, so at most one engine tick runs at a time.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, trace};

use crate::error::WorkerError;
use crate::protocol::{Command, Outbound};
use crate::scheduler::Session;

/// Handle to a running execution context.
pub struct Worker {
    commands: Option<Sender<Command>>,
    outbound: Receiver<Outbound>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Move `session` onto a new named thread and start its message loop.
    pub fn spawn(session: Session) -> Result<Self, WorkerError> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (out_tx, out_rx) = crossbeam_channel::unbounded();

        let thread = thread::Builder::new()
            .name("contagion-worker".into())
            .spawn(move || run(session, cmd_rx, out_tx))?;

        Ok(Self {
            commands: Some(cmd_tx),
            outbound: out_rx,
            thread: Some(thread),
        })
    }

    /// Post a command. Fails once the worker thread has exited.
    pub fn send(&self, command: Command) -> Result<(), WorkerError> {
        let tx = self.commands.as_ref().ok_or(WorkerError::Disconnected)?;
        tx.send(command).map_err(|_| WorkerError::Disconnected)
    }

    /// Block until the next outbound message. Messages posted before the
    /// worker died are still delivered; `Disconnected` follows them.
    pub fn recv(&self) -> Result<Outbound, WorkerError> {
        self.outbound.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// `Ok(None)` when nothing arrives within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Outbound>, WorkerError> {
        match self.outbound.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    pub fn try_recv(&self) -> Result<Option<Outbound>, WorkerError> {
        match self.outbound.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the worker and wait for its thread. Idempotent.
    pub fn terminate(&mut self) {
        // Dropping the sender disconnects the command channel, which ends the loop.
        self.commands.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                debug!("worker thread had panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ─── Message loop ────────────────────────────────────────────────────────────

enum Event {
    Command(Command),
    Timer,
    Closed,
}

fn run(mut session: Session, commands: Receiver<Command>, outbound: Sender<Outbound>) {
    let idle: Receiver<Instant> = never();
    let mut ticker: Option<Receiver<Instant>> = None;
    debug!("worker started");

    loop {
        let timer = ticker.as_ref().unwrap_or(&idle);
        let event = select! {
            recv(commands) -> msg => msg.map_or(Event::Closed, Event::Command),
            recv(timer) -> _ => Event::Timer,
        };
        let reply = match event {
            Event::Command(command) => session.handle(command),
            Event::Timer => session.on_timer(),
            Event::Closed => break,
        };

        if let Some(out) = reply {
            if outbound.send(out).is_err() {
                break;
            }
        }

        // Recreate the timer only on start/pause transitions.
        match (session.scheduler().period(), ticker.is_some()) {
            (Some(period), false) => {
                trace!(period_ms = period.as_millis() as u64, "timer armed");
                ticker = Some(crossbeam_channel::tick(period));
            }
            (None, true) => {
                trace!("timer cleared");
                ticker = None;
            }
            _ => {}
        }
    }

    debug!("worker stopped");
}
