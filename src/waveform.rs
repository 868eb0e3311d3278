// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Waveform History

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::SignalRange;

// ─── Channel ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Rpm,
    Vbat,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Rpm, Channel::Vbat];
}

// ─── WaveformBuffer ──────────────────────────────────────────────────────────

/// Fixed-capacity FIFO of samples. Pre-filled, so its length never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl WaveformBuffer {
    /// A buffer holding `capacity` copies of `fill`.
    pub fn filled(capacity: usize, fill: f64) -> Self {
        Self {
            samples: std::iter::repeat(fill).take(capacity).collect(),
            capacity,
        }
    }

    /// Append at the tail, evicting the head once over capacity.
    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

// ─── Chart projection ────────────────────────────────────────────────────────

/// Fixed chart coordinate frame the waveform polylines are drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartFrame {
    pub width: f64,
    /// y of a normalized 0.0 sample.
    pub baseline: f64,
    /// Vertical extent of a normalized 1.0 sample above the baseline.
    pub height: f64,
}

impl Default for ChartFrame {
    fn default() -> Self {
        Self { width: 200.0, baseline: 32.0, height: 24.0 }
    }
}

// ─── WaveformHistory ─────────────────────────────────────────────────────────

/// RPM and VBAT histories plus the ranges used to normalize them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveformHistory {
    rpm: WaveformBuffer,
    vbat: WaveformBuffer,
    rpm_range: SignalRange,
    vbat_range: SignalRange,
}

impl WaveformHistory {
    /// Both channels pre-filled with their base values.
    pub fn new(length: usize, rpm_range: SignalRange, vbat_range: SignalRange) -> Self {
        Self {
            rpm: WaveformBuffer::filled(length, rpm_range.base),
            vbat: WaveformBuffer::filled(length, vbat_range.base),
            rpm_range,
            vbat_range,
        }
    }

    pub fn push(&mut self, rpm: f64, vbat: f64) {
        self.rpm.push(rpm);
        self.vbat.push(vbat);
    }

    pub fn buffer(&self, channel: Channel) -> &WaveformBuffer {
        match channel {
            Channel::Rpm => &self.rpm,
            Channel::Vbat => &self.vbat,
        }
    }

    /// Project a raw value onto [0, 1]. Out-of-range values clamp silently.
    pub fn normalize(&self, channel: Channel, value: f64) -> f64 {
        let norm = match channel {
            Channel::Rpm => value / (self.rpm_range.base + self.rpm_range.variation),
            Channel::Vbat => {
                let floor = self.vbat_range.base - self.vbat_range.variation;
                (value - floor) / (2.0 * self.vbat_range.variation)
            }
        };
        // max/min rather than clamp: a NaN from a degenerate range lands on 0.
        norm.max(0.0).min(1.0)
    }

    pub fn normalized(&self, channel: Channel) -> Vec<f64> {
        self.buffer(channel)
            .iter()
            .map(|v| self.normalize(channel, v))
            .collect()
    }

    /// Polyline vertices for `channel`, oldest sample on the left.
    pub fn chart_points(&self, channel: Channel, frame: ChartFrame) -> Vec<(f64, f64)> {
        let len = self.buffer(channel).len();
        let span = len.saturating_sub(1).max(1) as f64;
        self.buffer(channel)
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = i as f64 / span * frame.width;
                let y = frame.baseline - self.normalize(channel, v) * frame.height;
                (x, y)
            })
            .collect()
    }

    pub fn snapshot(&self) -> WaveformSnapshot {
        WaveformSnapshot {
            rpm: self.rpm.to_vec(),
            vbat: self.vbat.to_vec(),
            rpm_normalized: self.normalized(Channel::Rpm),
            vbat_normalized: self.normalized(Channel::Vbat),
        }
    }
}

/// Serializable copy of both histories handed to the page.
#[derive(Debug, Clone, Serialize)]
pub struct WaveformSnapshot {
    pub rpm: Vec<f64>,
    pub vbat: Vec<f64>,
    pub rpm_normalized: Vec<f64>,
    pub vbat_normalized: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
