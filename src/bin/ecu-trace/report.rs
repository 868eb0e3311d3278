// Run Summary: per-signal statistics over the emitted samples

use ignition_engine::TelemetrySample;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        Self {
            mean: samples.iter().sum::<f64>() / n as f64,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: usize,
    pub rpm: Stats,
    pub vbat: Stats,
    pub dwell_ms: Stats,
    /// First tick that ran at the final cylinder count.
    pub transition_tick: Option<u64>,
    pub final_cylinders: u32,
}

impl RunSummary {
    pub fn from_samples(samples: &[TelemetrySample]) -> Self {
        let collect = |f: fn(&TelemetrySample) -> f64| samples.iter().map(f).collect::<Vec<f64>>();
        let initial = samples.first().map(|s| s.active_cylinder_count);
        let transition_tick = samples
            .iter()
            .find(|s| Some(s.active_cylinder_count) != initial)
            .map(|s| s.tick_index);
        Self {
            ticks: samples.len(),
            rpm: Stats::from_samples(&collect(|s| s.rpm)),
            vbat: Stats::from_samples(&collect(|s| s.vbat)),
            dwell_ms: Stats::from_samples(&collect(|s| s.dwell_ms)),
            transition_tick,
            final_cylinders: samples.last().map_or(0, |s| s.active_cylinder_count),
        }
    }

    pub fn print(&self) {
        println!("  {:<10} {:>10} {:>10} {:>10}", "Signal", "Min", "Mean", "Max");
        println!("  {}", "-".repeat(44));
        for (name, stats) in [("RPM", &self.rpm), ("VBAT", &self.vbat), ("Dwell ms", &self.dwell_ms)] {
            println!("  {:<10} {:>10.2} {:>10.2} {:>10.2}", name, stats.min, stats.mean, stats.max);
        }
        println!("  {}", "-".repeat(44));
        match self.transition_tick {
            Some(tick) => println!("  Ticks: {}  Cylinder transition at tick {} -> {} cylinders\n",
                self.ticks, tick, self.final_cylinders),
            None => println!("  Ticks: {}  No cylinder transition ({} cylinders)\n",
                self.ticks, self.final_cylinders),
        }
    }
}
