// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator ("The Ward")

pub mod types;
pub mod config;
pub mod error;
pub mod clock;
pub mod network;
pub mod epidemic;
pub mod financial;
pub mod engine;
pub mod protocol;
pub mod scheduler;
pub mod topology;
pub mod presets;

// Native execution context (threads are unavailable on wasm32)
#[cfg(not(target_arch = "wasm32"))]
pub mod worker;
#[cfg(not(target_arch = "wasm32"))]
pub mod supervisor;

pub use types::*;
pub use config::{
    EpidemicParams, EpidemicParamsUpdate, FinancialParams, FinancialParamsUpdate,
    SchedulerConfig, SupervisorConfig,
};
pub use engine::SimulationEngine;
pub use error::{ConfigError, ProtocolError, WorkerError};
pub use protocol::{Command, Outbound, Snapshot};
pub use scheduler::{Session, TickScheduler};
#[cfg(not(target_arch = "wasm32"))]
pub use supervisor::Supervisor;
#[cfg(not(target_arch = "wasm32"))]
pub use worker::Worker;

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────
//
// In the browser the module is loaded inside a dedicated Web Worker. The
// worker script forwards `onmessage` payloads to `handle`, posts back any
// non-null result, and keeps one `setInterval` in step with
// `timer_interval_ms`, calling `fire_timer` on each firing.

#[wasm_bindgen]
pub struct ContagionWorker {
    session: Session,
}

#[wasm_bindgen]
impl ContagionWorker {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Self {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        Self {
            session: Session::new(SimulationEngine::with_seed(seed), SchedulerConfig::default()),
        }
    }

    /// Apply one inbound message object. Returns the outbound message or `null`.
    pub fn handle(&mut self, message: JsValue) -> JsValue {
        let reply = match serde_wasm_bindgen::from_value::<Command>(message) {
            Ok(command) => self.session.handle(command),
            Err(e) => Some(Outbound::Error { message: format!("malformed message: {}", e) }),
        };
        to_js(reply.as_ref())
    }

    /// String variant of `handle` for hosts that post JSON text.
    pub fn handle_json(&mut self, message: &str) -> Option<String> {
        let reply = match protocol::decode_command(message) {
            Ok(command) => self.session.handle(command)?,
            Err(e) => Outbound::Error { message: e.to_string() },
        };
        protocol::encode_outbound(&reply).ok()
    }

    pub fn fire_timer(&mut self) -> JsValue {
        let reply = self.session.on_timer();
        to_js(reply.as_ref())
    }

    /// Interval the host timer should run at, or `None` when it must be cleared.
    pub fn timer_interval_ms(&self) -> Option<u32> {
        self.session.scheduler().period().map(|p| p.as_millis().min(u32::MAX as u128) as u32)
    }

    pub fn is_running(&self) -> bool {
        self.session.scheduler().is_running()
    }

    pub fn snapshot(&self) -> JsValue {
        to_js(Some(&self.session.snapshot()))
    }
}

fn to_js(message: Option<&Outbound>) -> JsValue {
    match message {
        Some(m) => serde_wasm_bindgen::to_value(m).unwrap_or(JsValue::NULL),
        None => JsValue::NULL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // JsValue needs a JS host, so native tests go through the JSON surface.

    #[test]
    fn test_json_surface() {
        let mut w = ContagionWorker::new(4);
        let init = r#"{"type":"init","mode":"epidemic",
            "nodes":[{"id":"a","assets":100,"capitalRatio":0.1},{"id":"b","assets":100,"capitalRatio":0.1}],
            "links":[{"sourceId":"a","targetId":"b"}]}"#;
        let reply = w.handle_json(init).unwrap();
        assert!(reply.starts_with(r#"{"type":"tick""#));

        assert!(w.handle_json(r#"{"type":"start","tickRate":10}"#).is_none());
        assert_eq!(w.timer_interval_ms(), Some(100));
        assert!(w.is_running());
        assert!(w.handle_json(r#"{"type":"pause"}"#).is_none());
        assert_eq!(w.timer_interval_ms(), None);

        let err = w.handle_json(r#"{"type":"bogus"}"#).unwrap();
        assert!(err.starts_with(r#"{"type":"error","message":"malformed message"#));
    }
}
