// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Coil State Machine

use serde::{Deserialize, Serialize};

/// State of the ignition coil on the currently firing cylinder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoilPhase {
    Idle,
    CoilCharging,
    Ignition,
}

impl CoilPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::CoilCharging => "COIL_CHARGING",
            Self::Ignition => "IGNITION",
        }
    }
}

/// One process-wide coil cycle, applied to whichever cylinder fires this tick.
///
/// The phase is a function of the tick index alone: CHARGING, IGNITION, IDLE,
/// then around again. There is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoilStateMachine;

impl CoilStateMachine {
    pub const CYCLE_LEN: u64 = 3;

    pub fn phase_at(&self, tick_index: u64) -> CoilPhase {
        match tick_index % Self::CYCLE_LEN {
            0 => CoilPhase::CoilCharging,
            1 => CoilPhase::Ignition,
            _ => CoilPhase::Idle,
        }
    }
}
