// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Render Sinks

//! Consumers of emitted samples.
//!
//! The core never reads anything back from a sink: every notification is
//! fire-and-forget, and a sink that fails to draw or play audio swallows its
//! own error.

use serde::{Deserialize, Serialize};

use crate::coil::CoilPhase;
use crate::config::SoundConfig;
use crate::types::TelemetrySample;
use crate::waveform::{Channel, WaveformHistory};

/// Display/audio surface driven by the tick loop. All methods default to
/// no-ops so adapters only implement what they draw.
pub trait RenderSink {
    fn set_metrics(&mut self, _rpm: f64, _vbat: f64, _dwell_ms: f64) {}
    fn set_cylinder_mode(&mut self, _count: u32) {}
    fn set_engine_running(&mut self, _running: bool) {}
    fn set_active_cylinder(&mut self, _id: u32) {}
    fn set_coil_phase(&mut self, _id: u32, _phase: CoilPhase) {}
    fn append_waveform_sample(&mut self, _channel: Channel, _normalized: f64) {}
    fn set_encoder_geometry(&mut self, _fire_deg: f64, _dwell_deg: f64) {}
    fn highlight_code_line(&mut self, _line: usize) {}
    fn play_transient_sound(&mut self, _volume: f64) {}
}

/// Hand one sample to `sink`, in the order the page updates its widgets.
pub fn deliver<S: RenderSink + ?Sized>(
    sample: &TelemetrySample,
    waveforms: &WaveformHistory,
    sound: &SoundConfig,
    sink: &mut S,
) {
    sink.append_waveform_sample(Channel::Rpm, waveforms.normalize(Channel::Rpm, sample.rpm));
    sink.append_waveform_sample(Channel::Vbat, waveforms.normalize(Channel::Vbat, sample.vbat));
    sink.set_encoder_geometry(sample.fire_deg, sample.dwell_deg);
    sink.set_metrics(sample.rpm, sample.vbat, sample.dwell_ms);
    sink.set_engine_running(sample.engine_running());
    if let Some(line) = sample.code_line {
        sink.highlight_code_line(line);
    }
    sink.set_active_cylinder(sample.cylinder);
    sink.set_coil_phase(sample.cylinder, sample.coil_phase);
    if sound.enabled {
        sink.play_transient_sound(sound.volume);
    }
}

// ─── NullSink ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {}

// ─── RecordingSink ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    Metrics { rpm: f64, vbat: f64, dwell_ms: f64 },
    CylinderMode { count: u32 },
    EngineRunning { running: bool },
    ActiveCylinder { id: u32 },
    CoilPhase { id: u32, phase: CoilPhase },
    WaveformSample { channel: Channel, normalized: f64 },
    EncoderGeometry { fire_deg: f64, dwell_deg: f64 },
    CodeLine { line: usize },
    Sound { volume: f64 },
}

/// Keeps every notification in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cylinder_modes(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::CylinderMode { count } => Some(*count),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RenderSink for RecordingSink {
    fn set_metrics(&mut self, rpm: f64, vbat: f64, dwell_ms: f64) {
        self.events.push(SinkEvent::Metrics { rpm, vbat, dwell_ms });
    }
    fn set_cylinder_mode(&mut self, count: u32) {
        self.events.push(SinkEvent::CylinderMode { count });
    }
    fn set_engine_running(&mut self, running: bool) {
        self.events.push(SinkEvent::EngineRunning { running });
    }
    fn set_active_cylinder(&mut self, id: u32) {
        self.events.push(SinkEvent::ActiveCylinder { id });
    }
    fn set_coil_phase(&mut self, id: u32, phase: CoilPhase) {
        self.events.push(SinkEvent::CoilPhase { id, phase });
    }
    fn append_waveform_sample(&mut self, channel: Channel, normalized: f64) {
        self.events.push(SinkEvent::WaveformSample { channel, normalized });
    }
    fn set_encoder_geometry(&mut self, fire_deg: f64, dwell_deg: f64) {
        self.events.push(SinkEvent::EncoderGeometry { fire_deg, dwell_deg });
    }
    fn highlight_code_line(&mut self, line: usize) {
        self.events.push(SinkEvent::CodeLine { line });
    }
    fn play_transient_sound(&mut self, volume: f64) {
        self.events.push(SinkEvent::Sound { volume });
    }
}

// ─── TracingSink ─────────────────────────────────────────────────────────────

/// Logs mode changes at info and per-tick notifications at debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn set_metrics(&mut self, rpm: f64, vbat: f64, dwell_ms: f64) {
        tracing::debug!(rpm, vbat, dwell_ms, "metrics");
    }
    fn set_cylinder_mode(&mut self, count: u32) {
        tracing::info!(cylinders = count, "{count}-cylinder mode");
    }
    fn set_engine_running(&mut self, running: bool) {
        tracing::debug!(state = if running { "RUNNING" } else { "STOPPED" }, "engine");
    }
    fn set_active_cylinder(&mut self, id: u32) {
        tracing::debug!(cylinder = id, "active");
    }
    fn set_coil_phase(&mut self, id: u32, phase: CoilPhase) {
        tracing::debug!(cylinder = id, phase = phase.label(), "coil");
    }
    fn set_encoder_geometry(&mut self, fire_deg: f64, dwell_deg: f64) {
        tracing::debug!(fire_deg, dwell_deg, "encoder");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalRange;

    fn sample() -> TelemetrySample {
        TelemetrySample {
            tick_index: 4,
            cylinder: 3,
            rpm: 1200.0,
            vbat: 12.6,
            dwell_ms: 6.0,
            dwell_deg: 60.0,
            fire_deg: 468.0,
            coil_phase: CoilPhase::Ignition,
            active_cylinder_count: 4,
            code_line: Some(2),
        }
    }

    fn history() -> WaveformHistory {
        WaveformHistory::new(4, SignalRange::new(800.0, 400.0), SignalRange::new(13.8, 1.2))
    }

    #[test]
    fn delivers_in_widget_order() {
        let mut sink = RecordingSink::new();
        let sound = SoundConfig { enabled: true, volume: 0.4 };
        deliver(&sample(), &history(), &sound, &mut sink);

        let kinds: Vec<&'static str> = sink
            .events
            .iter()
            .map(|e| match e {
                SinkEvent::WaveformSample { .. } => "wave",
                SinkEvent::EncoderGeometry { .. } => "encoder",
                SinkEvent::Metrics { .. } => "metrics",
                SinkEvent::EngineRunning { .. } => "running",
                SinkEvent::CodeLine { .. } => "code",
                SinkEvent::ActiveCylinder { .. } => "active",
                SinkEvent::CoilPhase { .. } => "coil",
                SinkEvent::Sound { .. } => "sound",
                SinkEvent::CylinderMode { .. } => "mode",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["wave", "wave", "encoder", "metrics", "running", "code", "active", "coil", "sound"]
        );
        assert_eq!(sink.events[0], SinkEvent::WaveformSample { channel: Channel::Rpm, normalized: 1.0 });
        assert_eq!(sink.events[7], SinkEvent::CoilPhase { id: 3, phase: CoilPhase::Ignition });
        assert_eq!(sink.events[8], SinkEvent::Sound { volume: 0.4 });
    }

    #[test]
    fn muted_sound_is_skipped() {
        let mut sink = RecordingSink::new();
        deliver(&sample(), &history(), &SoundConfig::default(), &mut sink);
        assert_eq!(sink.count(|e| matches!(e, SinkEvent::Sound { .. })), 0);
    }

    #[test]
    fn low_rpm_reports_stopped() {
        let mut sink = RecordingSink::new();
        let mut s = sample();
        s.rpm = 250.0;
        deliver(&s, &history(), &SoundConfig::default(), &mut sink);
        assert!(sink.events.contains(&SinkEvent::EngineRunning { running: false }));
    }

    #[test]
    fn null_and_tracing_sinks_accept_everything() {
        let s = sample();
        let sound = SoundConfig { enabled: true, volume: 1.0 };
        deliver(&s, &history(), &sound, &mut NullSink);
        deliver(&s, &history(), &sound, &mut TracingSink);
        let mut boxed: Box<dyn RenderSink> = Box::new(NullSink);
        deliver(&s, &history(), &sound, boxed.as_mut());
    }

    #[test]
    fn sink_events_serialize_tagged() {
        let json = serde_json::to_string(&SinkEvent::CylinderMode { count: 6 }).unwrap();
        assert_eq!(json, r#"{"kind":"cylinder_mode","count":6}"#);
    }
}
