// ECU Trace Runner: headless ignition timing simulation
// Loads the animation config, drives the engine tick by tick, and records
// one JSON line per tick for offline plotting.
//
// Usage:
//   cargo run --bin ecu-trace                                   # 128 ticks, logical clock
//   cargo run --bin ecu-trace -- --ticks 512 --out trace.jsonl   # Write JSONL time series
//   cargo run --bin ecu-trace -- --realtime                      # Tick on the wall clock
//   cargo run --bin ecu-trace -- --config my_config.json --quiet
//   RUST_LOG=debug cargo run --bin ecu-trace                     # Log every sink notification

mod report;
mod time_series;

use ignition_engine::clock::{Clock, ClockError, ManualClock, SimulationClock, SystemClock};
use ignition_engine::sink::{NullSink, RenderSink, TracingSink};
use ignition_engine::{IgnitionEngine, SimulationConfig, TelemetrySample};
use report::RunSummary;
use std::path::PathBuf;
use std::time::Duration;
use time_series::TimeSeriesRecorder;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "demos/ecu_animation_config.json";

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    config: PathBuf,
    ticks: u64,
    realtime: bool,
    out: Option<PathBuf>,
    quiet: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        config: PathBuf::from(DEFAULT_CONFIG),
        ticks: 128,
        realtime: false,
        out: None,
        quiet: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if let Some(path) = args.get(i) {
                    cli.config = PathBuf::from(path);
                }
            }
            "--ticks" => {
                i += 1;
                if i < args.len() {
                    cli.ticks = args[i].parse().unwrap_or(128);
                }
            }
            "--out" => {
                i += 1;
                cli.out = args.get(i).map(PathBuf::from);
            }
            "--realtime" => {
                cli.realtime = true;
            }
            "--quiet" => {
                cli.quiet = true;
            }
            _ => {
                tracing::warn!(argument = %args[i], "unknown argument");
            }
        }
        i += 1;
    }

    cli
}

// ─── Driver ─────────────────────────────────────────────────────────────────

/// Run until `ticks` samples have been emitted, calling `wait` between pumps.
fn drive<C: Clock>(
    mut clock: SimulationClock<C>,
    ticks: u64,
    sink: &mut dyn RenderSink,
    mut recorder: Option<&mut TimeSeriesRecorder>,
    mut wait: impl FnMut(&SimulationClock<C>),
) -> Result<(Vec<TelemetrySample>, IgnitionEngine), ClockError> {
    clock.start(&mut *sink)?;
    let mut samples = Vec::with_capacity(ticks as usize);

    while (samples.len() as u64) < ticks {
        for sample in clock.pump(&mut *sink)? {
            if let Some(rec) = recorder.as_deref_mut() {
                let scheduled_ms = sample.tick_index * clock.interval_ms();
                rec.record(&sample, clock.engine().waveforms(), scheduled_ms);
            }
            samples.push(sample);
        }
        wait(&clock);
    }

    clock.stop()?;
    Ok((samples, clock.dispose()))
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = parse_args();

    let config = match SimulationConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(path = %cli.config.display(), %err, "failed to load config; simulation not started");
            std::process::exit(1);
        }
    };

    println!("\n  ECU Ignition Trace");
    println!("  Config: {} | Ticks: {} | Interval: {}ms | Clock: {}",
        cli.config.display(),
        cli.ticks,
        config.spark_interval_ms,
        if cli.realtime { "realtime" } else { "logical" });
    println!("  Cylinders: {} -> {} after {}ms\n",
        config.initial_cylinders, config.final_cylinders, config.transition_after_ms);

    let engine = IgnitionEngine::from_config(config);
    let mut sink: Box<dyn RenderSink> = if cli.quiet {
        Box::new(NullSink)
    } else {
        Box::new(TracingSink)
    };
    let mut recorder = cli.out.as_ref().map(|_| TimeSeriesRecorder::new());

    let result = if cli.realtime {
        let clock = SimulationClock::new(engine, SystemClock::new());
        drive(clock, cli.ticks, sink.as_mut(), recorder.as_mut(), |c| {
            if let Some(wait_ms) = c.next_due_in_ms() {
                std::thread::sleep(Duration::from_millis(wait_ms));
            }
        })
    } else {
        let handle = ManualClock::new();
        let clock = SimulationClock::new(engine, handle.clone());
        drive(clock, cli.ticks, sink.as_mut(), recorder.as_mut(), |c| {
            handle.advance(c.next_due_in_ms().unwrap_or(0).max(1));
        })
    };

    let (samples, engine) = match result {
        Ok(run) => run,
        Err(err) => {
            tracing::error!(%err, "simulation clock failed");
            std::process::exit(1);
        }
    };

    RunSummary::from_samples(&samples).print();
    tracing::info!(tick = engine.current_tick(), cylinders = engine.cylinder_count(), "run complete");

    if let (Some(path), Some(recorder)) = (&cli.out, &recorder) {
        if let Err(err) = recorder.write_jsonl(path) {
            tracing::error!(path = %path.display(), %err, "failed to write time series");
            std::process::exit(1);
        }
        println!("  Time series ({} ticks) saved to: {}\n", recorder.len(), path.display());
    }
}
