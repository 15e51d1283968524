// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulator - Wall Clock
//
// `std::time::Instant` is unavailable on wasm32-unknown-unknown, so the
// browser build asks the host for `Date.now()`.

#[cfg(target_arch = "wasm32")]
mod host {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = Date, js_name = now)]
        fn date_now() -> f64;
    }

    pub fn now_ms() -> f64 {
        date_now()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn now_ms() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> f64 {
    host::now_ms()
}
