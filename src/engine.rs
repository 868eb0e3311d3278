// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Engine Core

use wasm_bindgen::prelude::*;

use crate::coil::CoilStateMachine;
use crate::config::SimulationConfig;
use crate::dwell::DwellCalculator;
use crate::projector::AngleProjector;
use crate::scheduler::{CylinderScheduler, CylinderTransition};
use crate::telemetry::TelemetryModel;
use crate::types::*;
use crate::waveform::WaveformHistory;

// ─── PseudoCodeCursor ────────────────────────────────────────────────────────

/// Which line of the configured pseudo-code listing is lit for a tick.
///
/// Line 0 lights up when the simulation starts, before any tick, so tick `n`
/// lights line `n + 1` (wrapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoCodeCursor {
    lines: usize,
}

impl PseudoCodeCursor {
    pub fn new(lines: usize) -> Self {
        Self { lines }
    }

    pub fn initial_line(&self) -> Option<usize> {
        (self.lines > 0).then_some(0)
    }

    pub fn line_for_tick(&self, tick_index: u64) -> Option<usize> {
        if self.lines == 0 {
            return None;
        }
        let lines = self.lines as u64;
        Some(((tick_index % lines + 1) % lines) as usize)
    }
}

// ─── IgnitionEngine struct ───────────────────────────────────────────────────

#[wasm_bindgen]
pub struct IgnitionEngine {
    pub(crate) config: SimulationConfig,

    pub(crate) tick_index: u64,
    pub(crate) active_cylinders: u32,
    pub(crate) transition: CylinderTransition,
    pub(crate) waveforms: WaveformHistory,

    pub(crate) telemetry: TelemetryModel,
    pub(crate) dwell: DwellCalculator,
    pub(crate) scheduler: CylinderScheduler,
    pub(crate) projector: AngleProjector,
    pub(crate) coil: CoilStateMachine,
    pub(crate) pseudo_code: PseudoCodeCursor,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl IgnitionEngine {
    /// Build an engine at tick 0. The config is taken as given; use
    /// [`SimulationConfig::from_json`] or [`SimulationConfig::validate`] to
    /// reject malformed parameters first.
    pub fn from_config(config: SimulationConfig) -> Self {
        Self {
            tick_index: 0,
            active_cylinders: config.initial_cylinders,
            transition: CylinderTransition::new(config.transition_after_ms, config.final_cylinders),
            waveforms: WaveformHistory::new(config.waveform.length, config.rpm, config.vbat),
            telemetry: TelemetryModel::new(config.rpm, config.vbat),
            dwell: DwellCalculator::new(config.vbat, config.dwell_ms),
            scheduler: CylinderScheduler::new(config.firing_order.clone()),
            projector: AngleProjector::new(config.encoder.crank_cycle_deg),
            coil: CoilStateMachine,
            pseudo_code: PseudoCodeCursor::new(config.pseudo_code.len()),
            config,
        }
    }

    /// Run one tick and advance the tick index.
    pub fn tick_core(&mut self) -> TelemetrySample {
        let sample = self.evaluate(self.tick_index, self.active_cylinders);

        // Waveforms record every evaluated tick in order.
        self.waveforms.push(sample.rpm, sample.vbat);

        tracing::trace!(
            tick = sample.tick_index,
            cylinder = sample.cylinder,
            phase = sample.coil_phase.label(),
            rpm = sample.rpm,
            "tick"
        );

        self.tick_index += 1;
        sample
    }

    /// The sample tick `tick_index` would produce at the current cylinder
    /// count, without touching any state.
    pub fn sample_at(&self, tick_index: u64) -> TelemetrySample {
        self.evaluate(tick_index, self.active_cylinders)
    }

    /// Apply the one-shot cylinder-count change if `elapsed_ms` has reached
    /// its threshold. Call only between ticks. Returns the new count the one
    /// time it takes effect.
    pub fn apply_cylinder_transition(&mut self, elapsed_ms: u64) -> Option<u32> {
        let count = self.transition.poll(elapsed_ms)?;
        tracing::info!(
            from = self.active_cylinders,
            to = count,
            elapsed_ms,
            tick = self.tick_index,
            "cylinder count transition"
        );
        self.active_cylinders = count;
        Some(count)
    }

    /// Back to tick 0 with the initial cylinder count and fresh histories.
    pub fn reset(&mut self) {
        *self = Self::from_config(self.config.clone());
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn waveforms(&self) -> &WaveformHistory {
        &self.waveforms
    }

    pub fn current_tick(&self) -> u64 {
        self.tick_index
    }

    pub fn cylinder_count(&self) -> u32 {
        self.active_cylinders
    }

    pub fn transition_fired(&self) -> bool {
        self.transition.has_fired()
    }

    pub fn initial_code_line(&self) -> Option<usize> {
        self.pseudo_code.initial_line()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            tick_index: self.tick_index,
            active_cylinders: self.active_cylinders,
            transition_fired: self.transition.has_fired(),
        }
    }

    /// Scheduler → telemetry → dwell → projection → coil phase.
    fn evaluate(&self, tick_index: u64, active_cylinders: u32) -> TelemetrySample {
        let cylinder = self.scheduler.select_cylinder(tick_index, active_cylinders);

        let rpm = self.telemetry.compute_rpm(tick_index);
        let vbat = self.telemetry.compute_vbat(tick_index);

        let dwell = self.dwell.compute(vbat);
        let geometry = self.projector.project(cylinder, active_cylinders, dwell.dwell_deg);
        let coil_phase = self.coil.phase_at(tick_index);

        TelemetrySample {
            tick_index,
            cylinder,
            rpm,
            vbat,
            dwell_ms: dwell.dwell_ms,
            dwell_deg: dwell.dwell_deg,
            fire_deg: geometry.fire_deg,
            coil_phase,
            active_cylinder_count: active_cylinders,
            code_line: self.pseudo_code.line_for_tick(tick_index),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coil::CoilPhase;
    use crate::waveform::Channel;

    fn engine() -> IgnitionEngine {
        IgnitionEngine::from_config(SimulationConfig::default())
    }

    #[test]
    fn first_tick_is_zero_and_charging() {
        let mut e = engine();
        let s = e.tick_core();
        assert_eq!(s.tick_index, 0);
        assert_eq!(s.cylinder, 1);
        assert_eq!(s.coil_phase, CoilPhase::CoilCharging);
        assert_eq!(s.active_cylinder_count, 4);
        assert!((s.rpm - 800.0).abs() < 1e-9);
        assert_eq!(e.current_tick(), 1);
    }

    #[test]
    fn tick_pushes_both_waveforms() {
        let mut e = engine();
        let len = e.config().waveform.length;
        let s = e.tick_core();
        assert_eq!(e.waveforms().buffer(Channel::Rpm).len(), len);
        assert_eq!(e.waveforms().buffer(Channel::Vbat).len(), len);
        assert_eq!(e.waveforms().buffer(Channel::Rpm).latest(), Some(s.rpm));
        assert_eq!(e.waveforms().buffer(Channel::Vbat).latest(), Some(s.vbat));
    }

    #[test]
    fn sample_at_matches_tick_core_without_mutation() {
        let mut e = engine();
        let preview = e.sample_at(0);
        assert_eq!(e.current_tick(), 0);
        assert_eq!(e.tick_core(), preview);
        assert_eq!(e.sample_at(17).tick_index, 17);
        assert_eq!(e.current_tick(), 1);
    }

    #[test]
    fn transition_changes_count_once() {
        let mut e = engine();
        assert_eq!(e.apply_cylinder_transition(7_999), None);
        assert_eq!(e.apply_cylinder_transition(8_000), Some(8));
        assert_eq!(e.cylinder_count(), 8);
        assert_eq!(e.apply_cylinder_transition(20_000), None);
        assert!(e.transition_fired());
        assert_eq!(e.tick_core().active_cylinder_count, 8);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut e = engine();
        for _ in 0..10 {
            e.tick_core();
        }
        e.apply_cylinder_transition(u64::MAX);
        e.reset();
        assert_eq!(e.current_tick(), 0);
        assert_eq!(e.cylinder_count(), 4);
        assert!(!e.transition_fired());
        assert!(e.waveforms().buffer(Channel::Rpm).iter().all(|v| v == 800.0));
    }

    #[test]
    fn code_line_follows_initial_highlight() {
        let mut config = SimulationConfig::default();
        config.pseudo_code = vec!["a".into(), "b".into(), "c".into()];
        let mut e = IgnitionEngine::from_config(config);
        assert_eq!(e.initial_code_line(), Some(0));
        let lines: Vec<Option<usize>> = (0..4).map(|_| e.tick_core().code_line).collect();
        assert_eq!(lines, vec![Some(1), Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn no_listing_means_no_code_line() {
        let mut e = engine();
        assert_eq!(e.initial_code_line(), None);
        assert_eq!(e.tick_core().code_line, None);
    }

    #[test]
    fn cursor_handles_single_line_listing() {
        let cursor = PseudoCodeCursor::new(1);
        assert_eq!(cursor.line_for_tick(0), Some(0));
        assert_eq!(cursor.line_for_tick(u64::MAX), Some(0));
    }
}
