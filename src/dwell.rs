// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Dwell Derivation

use serde::{Deserialize, Serialize};

use crate::config::{DwellRange, SignalRange};

/// Angular span drawn for a full-length dwell.
pub const MAX_DWELL_DEG: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellReading {
    pub dwell_ms: f64,
    pub dwell_deg: f64,
}

/// Lower supply voltage needs a longer coil charge to reach the same energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellCalculator {
    vbat: SignalRange,
    dwell: DwellRange,
}

impl DwellCalculator {
    pub fn new(vbat: SignalRange, dwell: DwellRange) -> Self {
        Self { vbat, dwell }
    }

    pub fn compute(&self, vbat: f64) -> DwellReading {
        let ceiling = self.vbat.base + self.vbat.variation;
        let t = ((ceiling - vbat) / (2.0 * self.vbat.variation)).max(0.0).min(1.0);
        let dwell_ms = self.dwell.min + (self.dwell.max - self.dwell.min) * t;
        let dwell_deg = (dwell_ms / self.dwell.max * MAX_DWELL_DEG).max(0.0).min(MAX_DWELL_DEG);
        DwellReading { dwell_ms, dwell_deg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> DwellCalculator {
        DwellCalculator::new(SignalRange::new(13.8, 1.2), DwellRange { min: 2.0, max: 6.0 })
    }

    #[test]
    fn minimum_voltage_gives_maximum_dwell() {
        let reading = calc().compute(12.6);
        assert!((reading.dwell_ms - 6.0).abs() < 1e-9);
        assert!((reading.dwell_deg - 60.0).abs() < 1e-9);
    }

    #[test]
    fn maximum_voltage_gives_minimum_dwell() {
        let reading = calc().compute(15.0);
        assert!((reading.dwell_ms - 2.0).abs() < 1e-9);
        assert!((reading.dwell_deg - 20.0).abs() < 1e-9);
    }

    #[test]
    fn nominal_voltage_sits_midway() {
        let reading = calc().compute(13.8);
        assert!((reading.dwell_ms - 4.0).abs() < 1e-9);
        assert!((reading.dwell_deg - 40.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_band_voltage_clamps() {
        let c = calc();
        assert_eq!(c.compute(5.0).dwell_ms, 6.0);
        assert_eq!(c.compute(30.0).dwell_ms, 2.0);
    }

    #[test]
    fn lower_voltage_never_shortens_dwell() {
        let c = calc();
        let mut last = 0.0;
        for step in 0..=100 {
            let vbat = 15.5 - step as f64 * 0.04;
            let dwell = c.compute(vbat).dwell_ms;
            assert!(dwell >= last);
            last = dwell;
        }
    }

    #[test]
    fn degenerate_band_falls_back_to_minimum() {
        let c = DwellCalculator::new(SignalRange::new(13.8, 0.0), DwellRange { min: 2.0, max: 6.0 });
        let reading = c.compute(13.8);
        assert_eq!(reading.dwell_ms, 2.0);
    }
}
