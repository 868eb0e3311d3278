// Copyright 2026 Hypermesh Foundation. All rights reserved.
// ECU Ignition Timing Simulation - Firing Order Scheduling

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// DefaultSequentialOrder
// ---------------------------------------------------------------------------

/// Fallback used when no firing order is configured for a cylinder count:
/// cylinders fire in ascending order `1, 2, …, count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSequentialOrder {
    count: u32,
}

impl DefaultSequentialOrder {
    pub fn new(count: u32) -> Self {
        Self { count: count.max(1) }
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn cylinder_at(&self, tick_index: u64) -> u32 {
        (tick_index % self.count as u64) as u32 + 1
    }

    pub fn to_vec(&self) -> Vec<u32> {
        (1..=self.count).collect()
    }
}

// ---------------------------------------------------------------------------
// FiringSequence
// ---------------------------------------------------------------------------

/// The order in force for one cylinder count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringSequence<'a> {
    Configured(&'a [u32]),
    DefaultSequential(DefaultSequentialOrder),
}

impl FiringSequence<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Configured(order) => order.len(),
            Self::DefaultSequential(order) => order.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strictly periodic with period `len()`.
    pub fn cylinder_at(&self, tick_index: u64) -> u32 {
        match self {
            Self::Configured(order) if order.is_empty() => 1,
            Self::Configured(order) => order[(tick_index % order.len() as u64) as usize],
            Self::DefaultSequential(order) => order.cylinder_at(tick_index),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::DefaultSequential(_))
    }
}

// ---------------------------------------------------------------------------
// CylinderScheduler
// ---------------------------------------------------------------------------

/// Picks the firing cylinder for a tick.
///
/// A configured order whose length differs from the cylinder count is used
/// exactly as written, so it can name cylinders outside `1..=count`.
#[derive(Debug, Clone, Default)]
pub struct CylinderScheduler {
    firing_order: BTreeMap<u32, Vec<u32>>,
}

impl CylinderScheduler {
    pub fn new(firing_order: BTreeMap<u32, Vec<u32>>) -> Self {
        Self { firing_order }
    }

    pub fn sequence(&self, active_cylinders: u32) -> FiringSequence<'_> {
        match self.firing_order.get(&active_cylinders) {
            Some(order) if !order.is_empty() => FiringSequence::Configured(order),
            _ => FiringSequence::DefaultSequential(DefaultSequentialOrder::new(active_cylinders)),
        }
    }

    pub fn select_cylinder(&self, tick_index: u64, active_cylinders: u32) -> u32 {
        self.sequence(active_cylinders).cylinder_at(tick_index)
    }
}

// ---------------------------------------------------------------------------
// CylinderTransition
// ---------------------------------------------------------------------------

/// One-shot switch from the initial to the final cylinder count, armed on
/// elapsed wall-clock time rather than tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CylinderTransition {
    after_ms: u64,
    final_cylinders: u32,
    fired: bool,
}

impl CylinderTransition {
    pub fn new(after_ms: u64, final_cylinders: u32) -> Self {
        Self { after_ms, final_cylinders, fired: false }
    }

    /// Yields the final count the first time `elapsed_ms` reaches the
    /// threshold, and `None` on every call before or after.
    pub fn poll(&mut self, elapsed_ms: u64) -> Option<u32> {
        if self.fired || elapsed_ms < self.after_ms {
            return None;
        }
        self.fired = true;
        Some(self.final_cylinders)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn after_ms(&self) -> u64 {
        self.after_ms
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> CylinderScheduler {
        let mut orders = BTreeMap::new();
        orders.insert(4, vec![1, 3, 4, 2]);
        orders.insert(6, vec![1, 5, 3, 6, 2, 4]);
        CylinderScheduler::new(orders)
    }

    #[test]
    fn configured_order_indexed_by_tick() {
        let s = scheduler();
        assert_eq!(s.select_cylinder(5, 4), 3);
        let fired: Vec<u32> = (0..8).map(|t| s.select_cylinder(t, 4)).collect();
        assert_eq!(fired, vec![1, 3, 4, 2, 1, 3, 4, 2]);
    }

    #[test]
    fn missing_order_falls_back_to_sequential() {
        let s = scheduler();
        let seq = s.sequence(5);
        assert!(seq.is_fallback());
        let fired: Vec<u32> = (0..6).map(|t| s.select_cylinder(t, 5)).collect();
        assert_eq!(fired, vec![1, 2, 3, 4, 5, 1]);
    }

    #[test]
    fn empty_configured_order_falls_back() {
        let mut orders = BTreeMap::new();
        orders.insert(3, Vec::new());
        let s = CylinderScheduler::new(orders);
        assert!(s.sequence(3).is_fallback());
        assert_eq!(s.select_cylinder(2, 3), 3);
    }

    #[test]
    fn default_order_lists_all_cylinders() {
        assert_eq!(DefaultSequentialOrder::new(4).to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(DefaultSequentialOrder::new(0).to_vec(), vec![1]);
    }

    #[test]
    fn sequence_period_matches_order_length() {
        let s = scheduler();
        let seq = s.sequence(6);
        assert_eq!(seq.len(), 6);
        for t in 0..24 {
            assert_eq!(seq.cylinder_at(t), seq.cylinder_at(t + seq.len() as u64));
        }
    }

    #[test]
    fn mismatched_order_is_used_as_written() {
        let mut orders = BTreeMap::new();
        orders.insert(4, vec![1, 7, 3, 9, 2, 4]);
        let s = CylinderScheduler::new(orders);
        assert_eq!(s.sequence(4).len(), 6);
        assert_eq!(s.select_cylinder(1, 4), 7);
        assert_eq!(s.select_cylinder(3, 4), 9);
    }

    #[test]
    fn transition_waits_for_threshold() {
        let mut t = CylinderTransition::new(1_000, 8);
        assert_eq!(t.poll(0), None);
        assert_eq!(t.poll(999), None);
        assert!(!t.has_fired());
        assert_eq!(t.poll(1_000), Some(8));
        assert!(t.has_fired());
    }

    #[test]
    fn transition_fires_exactly_once() {
        let mut t = CylinderTransition::new(0, 6);
        assert_eq!(t.poll(0), Some(6));
        for elapsed in [0, 1, 10_000, u64::MAX] {
            assert_eq!(t.poll(elapsed), None);
        }
    }
}
