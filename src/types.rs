// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Type Definitions

use serde::{Deserialize, Serialize};

use crate::coil::CoilPhase;
use crate::projector::EncoderGeometry;

/// Below this the engine is shown as stopped.
pub const ENGINE_RUNNING_RPM: f64 = 300.0;

// ─── TelemetrySample ─────────────────────────────────────────────────────────

/// Everything one tick produces. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub tick_index: u64,
    pub cylinder: u32,
    pub rpm: f64,
    pub vbat: f64,
    pub dwell_ms: f64,
    pub dwell_deg: f64,
    pub fire_deg: f64,
    pub coil_phase: CoilPhase,
    pub active_cylinder_count: u32,
    /// Pseudo-code line highlighted alongside this tick, if a listing is configured.
    #[serde(default)]
    pub code_line: Option<usize>,
}

impl TelemetrySample {
    pub fn engine_running(&self) -> bool {
        self.rpm > ENGINE_RUNNING_RPM
    }

    pub fn encoder(&self) -> EncoderGeometry {
        EncoderGeometry { fire_deg: self.fire_deg, dwell_deg: self.dwell_deg }
    }

    /// `[fire_deg - dwell_deg, fire_deg]`
    pub fn dwell_arc(&self) -> (f64, f64) {
        self.encoder().dwell_arc()
    }
}

// ─── EngineStatus ────────────────────────────────────────────────────────────

/// Counters reported to the page alongside the sample stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub tick_index: u64,
    pub active_cylinders: u32,
    pub transition_fired: bool,
}
