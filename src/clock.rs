// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Tick Clock & Lifecycle

use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;

use crate::engine::IgnitionEngine;
use crate::sink::{deliver, RenderSink};
use crate::types::TelemetrySample;

// ---------------------------------------------------------------------------
// Clock sources
// ---------------------------------------------------------------------------

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Logical time that only moves when told to. Clones share the same reading,
/// so a test can keep a handle after moving the clock into a [`SimulationClock`].
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Wall-clock time since construction.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self { origin: std::time::Instant::now() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("simulation clock is already running")]
    AlreadyRunning,
    #[error("simulation clock is not running")]
    NotRunning,
}

// ---------------------------------------------------------------------------
// SimulationClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClockState {
    Idle,
    Running,
    Stopped,
}

/// Drives an [`IgnitionEngine`] at a fixed tick interval.
///
/// Tick `n` is due `n * interval` ms of *running* time after the first
/// `start`; time spent stopped does not count. Each call to [`pump`] runs
/// every tick that has come due, so a late caller catches up in order. The
/// cylinder-count transition is checked against each tick's scheduled time,
/// never in the middle of a tick.
///
/// [`pump`]: SimulationClock::pump
pub struct SimulationClock<C: Clock> {
    engine: IgnitionEngine,
    clock: C,
    interval_ms: u64,
    state: ClockState,
    banked_ms: u64,
    resumed_at_ms: u64,
    next_due_ms: u64,
    announced: bool,
}

impl<C: Clock> SimulationClock<C> {
    pub fn new(engine: IgnitionEngine, clock: C) -> Self {
        let interval_ms = engine.config().spark_interval_ms.max(1);
        Self {
            engine,
            clock,
            interval_ms,
            state: ClockState::Idle,
            banked_ms: 0,
            resumed_at_ms: 0,
            next_due_ms: 0,
            announced: false,
        }
    }

    /// Begin or resume ticking. The first start announces the cylinder mode
    /// and the opening pseudo-code line to `sink`.
    pub fn start<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ClockError> {
        if self.state == ClockState::Running {
            return Err(ClockError::AlreadyRunning);
        }
        self.resumed_at_ms = self.clock.now_ms();
        self.state = ClockState::Running;

        if !self.announced {
            sink.set_cylinder_mode(self.engine.cylinder_count());
            if let Some(line) = self.engine.initial_code_line() {
                sink.highlight_code_line(line);
            }
            self.announced = true;
        }
        tracing::info!(
            interval_ms = self.interval_ms,
            elapsed_ms = self.banked_ms,
            tick = self.engine.current_tick(),
            "simulation clock started"
        );
        Ok(())
    }

    /// Pause. Elapsed run time freezes until the next `start`.
    pub fn stop(&mut self) -> Result<(), ClockError> {
        if self.state != ClockState::Running {
            return Err(ClockError::NotRunning);
        }
        self.banked_ms = self.elapsed_ms();
        self.state = ClockState::Stopped;
        tracing::info!(elapsed_ms = self.banked_ms, tick = self.engine.current_tick(), "simulation clock stopped");
        Ok(())
    }

    /// Run every tick due by now, delivering each sample to `sink`.
    pub fn pump<S: RenderSink + ?Sized>(&mut self, sink: &mut S) -> Result<Vec<TelemetrySample>, ClockError> {
        if self.state != ClockState::Running {
            return Err(ClockError::NotRunning);
        }
        let elapsed = self.elapsed_ms();
        let mut samples = Vec::new();

        while self.next_due_ms <= elapsed {
            let due = self.next_due_ms;
            if let Some(count) = self.engine.apply_cylinder_transition(due) {
                sink.set_cylinder_mode(count);
            }
            let sample = self.engine.tick_core();
            deliver(&sample, self.engine.waveforms(), &self.engine.config().sound, &mut *sink);
            samples.push(sample);
            self.next_due_ms = self.next_due_ms.saturating_add(self.interval_ms);
        }

        // The transition timer is independent of ticks; let it land between them.
        if let Some(count) = self.engine.apply_cylinder_transition(elapsed) {
            sink.set_cylinder_mode(count);
        }
        Ok(samples)
    }

    /// Run time in ms, excluding stopped periods.
    pub fn elapsed_ms(&self) -> u64 {
        match self.state {
            ClockState::Running => self
                .banked_ms
                .saturating_add(self.clock.now_ms().saturating_sub(self.resumed_at_ms)),
            _ => self.banked_ms,
        }
    }

    /// How long until the next tick is due, while running.
    pub fn next_due_in_ms(&self) -> Option<u64> {
        (self.state == ClockState::Running).then(|| self.next_due_ms.saturating_sub(self.elapsed_ms()))
    }

    /// End the run and hand the engine back.
    pub fn dispose(self) -> IgnitionEngine {
        tracing::info!(tick = self.engine.current_tick(), "simulation clock disposed");
        self.engine
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn engine(&self) -> &IgnitionEngine {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
