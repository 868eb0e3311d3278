// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - RPM / VBAT Trajectories

use std::f64::consts::PI;

use crate::config::SignalRange;

/// Ticks in one full RPM/VBAT cycle.
pub const TELEMETRY_PERIOD_TICKS: u64 = 64;

/// VBAT leads RPM by 60° so the two never peak together.
const VBAT_PHASE_OFFSET: f64 = PI / 3.0;

/// Maps a tick index to synthetic RPM and battery voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryModel {
    rpm: SignalRange,
    vbat: SignalRange,
}

impl TelemetryModel {
    pub fn new(rpm: SignalRange, vbat: SignalRange) -> Self {
        Self { rpm, vbat }
    }

    /// `base + variation·|sin 2πφ|`: never below base, peaks twice per period.
    pub fn compute_rpm(&self, tick_index: u64) -> f64 {
        self.rpm.base + self.rpm.variation * (cycle_phase(tick_index) * 2.0 * PI).sin().abs()
    }

    /// `base + variation·cos(2πφ + π/3)`.
    pub fn compute_vbat(&self, tick_index: u64) -> f64 {
        self.vbat.base
            + self.vbat.variation * (cycle_phase(tick_index) * 2.0 * PI + VBAT_PHASE_OFFSET).cos()
    }
}

/// Position within the 64-tick cycle, in [0, 1).
pub fn cycle_phase(tick_index: u64) -> f64 {
    (tick_index % TELEMETRY_PERIOD_TICKS) as f64 / TELEMETRY_PERIOD_TICKS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TelemetryModel {
        TelemetryModel::new(SignalRange::new(800.0, 400.0), SignalRange::new(13.8, 1.2))
    }

    #[test]
    fn rpm_starts_at_base() {
        assert!((model().compute_rpm(0) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn rpm_peaks_at_quarter_and_three_quarter_phase() {
        let m = model();
        assert!((m.compute_rpm(16) - 1200.0).abs() < 1e-9);
        assert!((m.compute_rpm(48) - 1200.0).abs() < 1e-9);
        assert!((m.compute_rpm(32) - 800.0).abs() < 1e-9);
    }

    #[test]
    fn signals_repeat_every_period() {
        let m = model();
        for tick in 0..TELEMETRY_PERIOD_TICKS {
            assert_eq!(m.compute_rpm(tick), m.compute_rpm(tick + TELEMETRY_PERIOD_TICKS * 7));
            assert_eq!(m.compute_vbat(tick), m.compute_vbat(tick + TELEMETRY_PERIOD_TICKS));
        }
    }

    #[test]
    fn vbat_is_offset_from_rpm() {
        let m = model();
        // cos(π/3) = 0.5 at phase 0
        assert!((m.compute_vbat(0) - (13.8 + 0.6)).abs() < 1e-9);
        // minimum where 2πφ + π/3 = π, i.e. φ = 1/3 (not on a tick boundary)
        let min = (0..TELEMETRY_PERIOD_TICKS)
            .map(|t| m.compute_vbat(t))
            .fold(f64::INFINITY, f64::min);
        assert!(min >= 13.8 - 1.2 - 1e-9);
        assert!(min < 13.8 - 1.19);
    }

    #[test]
    fn phase_wraps_at_period() {
        assert_eq!(cycle_phase(0), 0.0);
        assert_eq!(cycle_phase(16), 0.25);
        assert_eq!(cycle_phase(64), 0.0);
        assert_eq!(cycle_phase(u64::MAX), 63.0 / 64.0);
    }
}
