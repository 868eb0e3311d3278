// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Configuration

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Highest cylinder count the display surface lays out.
pub const MAX_CYLINDERS: u32 = 12;

const DEFAULT_SOUND_VOLUME: f64 = 0.2;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`SimulationConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("firing order key `{0}` is not a cylinder count")]
    FiringOrderKey(String),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

// ---------------------------------------------------------------------------
// Nested sections
// ---------------------------------------------------------------------------

/// A periodic signal: a base value and the amplitude around it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRange {
    pub base: f64,
    pub variation: f64,
}

impl SignalRange {
    pub fn new(base: f64, variation: f64) -> Self {
        Self { base, variation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveformConfig {
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderConfig {
    pub crank_cycle_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { enabled: false, volume: DEFAULT_SOUND_VOLUME }
    }
}

fn default_volume() -> f64 {
    DEFAULT_SOUND_VOLUME
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Parameter set for one simulation run, read once at startup.
///
/// Field names follow the JSON document consumed by the browser page
/// (`ecu_animation_config.json`). Colors and pseudo-code lines are carried
/// for the render side and never read by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    #[serde(default)]
    pub spark_color: String,
    #[serde(default)]
    pub spark_glow: String,
    #[serde(default)]
    pub coil_on_color: String,
    #[serde(default)]
    pub coil_off_color: String,

    pub initial_cylinders: u32,
    pub final_cylinders: u32,
    pub transition_after_ms: u64,

    pub rpm: SignalRange,
    pub vbat: SignalRange,
    pub dwell_ms: DwellRange,
    pub waveform: WaveformConfig,
    pub encoder: EncoderConfig,

    #[serde(default, deserialize_with = "deserialize_firing_order")]
    pub firing_order: BTreeMap<u32, Vec<u32>>,

    #[serde(default)]
    pub pseudo_code: Vec<String>,
    #[serde(default)]
    pub sound: SoundConfig,

    pub spark_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let mut firing_order = BTreeMap::new();
        firing_order.insert(4, vec![1, 3, 4, 2]);
        firing_order.insert(6, vec![1, 5, 3, 6, 2, 4]);
        firing_order.insert(8, vec![1, 8, 4, 3, 6, 5, 7, 2]);
        firing_order.insert(10, vec![1, 6, 5, 10, 2, 7, 3, 8, 4, 9]);

        Self {
            spark_color: "#ffd54a".to_string(),
            spark_glow: "rgba(255, 213, 74, 0.65)".to_string(),
            coil_on_color: "#4ade80".to_string(),
            coil_off_color: "#1f2937".to_string(),
            initial_cylinders: 4,
            final_cylinders: 8,
            transition_after_ms: 8_000,
            rpm: SignalRange::new(800.0, 400.0),
            vbat: SignalRange::new(13.8, 1.2),
            dwell_ms: DwellRange { min: 2.0, max: 6.0 },
            waveform: WaveformConfig { length: 64 },
            encoder: EncoderConfig { crank_cycle_deg: 720.0 },
            firing_order,
            pseudo_code: Vec::new(),
            sound: SoundConfig::default(),
            spark_interval_ms: 250,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file. There is no retry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Reject parameter sets the model cannot render meaningfully.
    ///
    /// A firing order whose length differs from its cylinder count is left
    /// in place and only reported: the scheduler indexes it as configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpm.base > 0.0) {
            return Err(ConfigError::invalid("rpm.base", "must be positive"));
        }
        if !(self.rpm.variation >= 0.0) {
            return Err(ConfigError::invalid("rpm.variation", "must not be negative"));
        }
        if !(self.vbat.base > 0.0) {
            return Err(ConfigError::invalid("vbat.base", "must be positive"));
        }
        if !(self.vbat.variation > 0.0) {
            return Err(ConfigError::invalid("vbat.variation", "must be positive"));
        }
        if !(self.dwell_ms.min > 0.0) {
            return Err(ConfigError::invalid("dwellMs.min", "must be positive"));
        }
        if !(self.dwell_ms.max >= self.dwell_ms.min) {
            return Err(ConfigError::invalid(
                "dwellMs.max",
                format!("{} is below dwellMs.min {}", self.dwell_ms.max, self.dwell_ms.min),
            ));
        }
        if self.waveform.length == 0 {
            return Err(ConfigError::invalid("waveform.length", "must be at least 1"));
        }
        if !(self.encoder.crank_cycle_deg > 0.0) {
            return Err(ConfigError::invalid("encoder.crankCycleDeg", "must be positive"));
        }
        if self.spark_interval_ms == 0 {
            return Err(ConfigError::invalid("sparkIntervalMs", "must be positive"));
        }
        check_cylinder_count("initialCylinders", self.initial_cylinders)?;
        check_cylinder_count("finalCylinders", self.final_cylinders)?;
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(ConfigError::invalid("sound.volume", "must lie in [0, 1]"));
        }

        for (&count, order) in &self.firing_order {
            check_cylinder_count("firingOrder", count)?;
            if order.is_empty() {
                return Err(ConfigError::invalid(
                    "firingOrder",
                    format!("order for {count} cylinders is empty"),
                ));
            }
            if order.contains(&0) {
                return Err(ConfigError::invalid(
                    "firingOrder",
                    format!("order for {count} cylinders contains id 0; ids are 1-based"),
                ));
            }
            if order.len() != count as usize {
                tracing::warn!(
                    cylinders = count,
                    order_len = order.len(),
                    "firing order length does not match its cylinder count; keeping it as configured"
                );
            }
        }
        Ok(())
    }
}

fn check_cylinder_count(field: &'static str, count: u32) -> Result<(), ConfigError> {
    if count == 0 || count > MAX_CYLINDERS {
        return Err(ConfigError::invalid(
            field,
            format!("{count} is outside 1..={MAX_CYLINDERS}"),
        ));
    }
    Ok(())
}

/// JSON object keys are strings; firing orders are keyed by cylinder count.
fn deserialize_firing_order<'de, D>(deserializer: D) -> Result<BTreeMap<u32, Vec<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<u32>>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, order)| {
            key.trim()
                .parse::<u32>()
                .map(|count| (count, order))
                .map_err(|_| serde::de::Error::custom(ConfigError::FiringOrderKey(key)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
