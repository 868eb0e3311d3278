// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Crank Angle Projection

use serde::{Deserialize, Serialize};

/// Fraction of a cylinder's angular slot at which its spark fires.
pub const FIRE_SLOT_FRACTION: f64 = 0.6;

/// Pointer angle and the dwell arc that precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncoderGeometry {
    pub fire_deg: f64,
    pub dwell_deg: f64,
}

impl EncoderGeometry {
    /// `[fire_deg - dwell_deg, fire_deg]`
    pub fn dwell_arc(&self) -> (f64, f64) {
        (self.fire_deg - self.dwell_deg, self.fire_deg)
    }

    /// Pointer tip around the wheel center, 0° at twelve o'clock, y down.
    pub fn pointer(&self, radius: f64) -> (f64, f64) {
        let rad = (self.fire_deg - 90.0).to_radians();
        (radius * rad.cos(), radius * rad.sin())
    }
}

/// Spreads firing events evenly across one crank cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleProjector {
    crank_cycle_deg: f64,
}

impl AngleProjector {
    pub fn new(crank_cycle_deg: f64) -> Self {
        Self { crank_cycle_deg }
    }

    pub fn degrees_per_cylinder(&self, active_cylinders: u32) -> f64 {
        self.crank_cycle_deg / active_cylinders.max(1) as f64
    }

    pub fn project(&self, cylinder: u32, active_cylinders: u32, dwell_deg: f64) -> EncoderGeometry {
        let deg_per_cyl = self.degrees_per_cylinder(active_cylinders);
        let slot = cylinder.saturating_sub(1) as f64;
        EncoderGeometry {
            fire_deg: slot * deg_per_cyl + deg_per_cyl * FIRE_SLOT_FRACTION,
            dwell_deg,
        }
    }
}
