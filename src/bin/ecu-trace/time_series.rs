// Per-Tick JSONL Time Series Recorder
// Outputs one JSON line per tick for offline plotting

use ignition_engine::{CoilPhase, TelemetrySample, WaveformHistory};
use ignition_engine::waveform::Channel;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub cylinder: u32,
    pub active_cylinders: u32,
    pub rpm: f64,
    pub vbat: f64,
    pub rpm_normalized: f64,
    pub vbat_normalized: f64,
    pub dwell_ms: f64,
    pub dwell_deg: f64,
    pub fire_deg: f64,
    pub dwell_arc_start_deg: f64,
    pub coil_phase: CoilPhase,
    pub engine_running: bool,
    pub code_line: Option<usize>,
}

impl TickSnapshot {
    pub fn from_sample(sample: &TelemetrySample, waveforms: &WaveformHistory, elapsed_ms: u64) -> Self {
        let (arc_start, _) = sample.dwell_arc();
        Self {
            tick: sample.tick_index,
            elapsed_ms,
            cylinder: sample.cylinder,
            active_cylinders: sample.active_cylinder_count,
            rpm: sample.rpm,
            vbat: sample.vbat,
            rpm_normalized: waveforms.normalize(Channel::Rpm, sample.rpm),
            vbat_normalized: waveforms.normalize(Channel::Vbat, sample.vbat),
            dwell_ms: sample.dwell_ms,
            dwell_deg: sample.dwell_deg,
            fire_deg: sample.fire_deg,
            dwell_arc_start_deg: arc_start,
            coil_phase: sample.coil_phase,
            engine_running: sample.engine_running(),
            code_line: sample.code_line,
        }
    }
}

/// Accumulates snapshots and writes them as JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<TickSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, sample: &TelemetrySample, waveforms: &WaveformHistory, elapsed_ms: u64) {
        self.snapshots.push(TickSnapshot::from_sample(sample, waveforms, elapsed_ms));
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        file.flush()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
