// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation ("Spark Bench")

pub mod types;
pub mod config;
pub mod waveform;
pub mod telemetry;
pub mod dwell;
pub mod scheduler;
pub mod projector;
pub mod coil;
pub mod engine;
pub mod sink;
pub mod clock;

pub use types::*;
pub use config::{ConfigError, SimulationConfig, MAX_CYLINDERS};
pub use coil::{CoilPhase, CoilStateMachine};
pub use engine::IgnitionEngine;
pub use sink::{RenderSink, RecordingSink, SinkEvent};
pub use clock::{Clock, ClockError, ManualClock, SimulationClock};
pub use waveform::{Channel, WaveformBuffer, WaveformHistory};

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────
//
// The page owns the timers: it calls `tick` from its interval callback with
// the milliseconds elapsed since it started, and renders whatever comes back.

#[wasm_bindgen]
impl IgnitionEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<IgnitionEngine, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        match SimulationConfig::from_json(config_json) {
            Ok(config) => Ok(IgnitionEngine::from_config(config)),
            Err(err) => {
                tracing::error!(%err, "failed to load ecu animation config");
                Err(JsValue::from_str(&err.to_string()))
            }
        }
    }

    /// Apply the cylinder transition if due, then run one tick.
    pub fn tick(&mut self, elapsed_ms: f64) -> JsValue {
        self.apply_cylinder_transition(elapsed_ms.max(0.0) as u64);
        let sample = self.tick_core();
        serde_wasm_bindgen::to_value(&sample).unwrap_or(JsValue::NULL)
    }

    pub fn get_waveforms(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.waveforms.snapshot()).unwrap_or(JsValue::NULL)
    }

    pub fn get_config(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.config).unwrap_or(JsValue::NULL)
    }

    pub fn get_status(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.status()).unwrap_or(JsValue::NULL)
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn active_cylinders(&self) -> u32 {
        self.active_cylinders
    }

    /// Line lit before the first tick, or -1 with no listing.
    pub fn initial_highlight(&self) -> i32 {
        self.initial_code_line().map_or(-1, |line| line as i32)
    }

    /// Restart from tick 0 with the same config.
    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&mut self) {
        self.reset();
    }
}
