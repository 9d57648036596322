// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Clock tick accounting for time-slice preemption
//! OWNERS: @kernel-sched-team
//! PUBLIC API: TickAggregator, Tick, DEFAULT_TICK_THRESHOLD
//! INVARIANTS: Single writer (the clock handler, via &mut); counter resets when it exceeds the threshold

/// Ticks counted before the slice boundary fires on the next one.
pub const DEFAULT_TICK_THRESHOLD: u32 = 4;

/// Result of accounting one clock interrupt.
#[must_use = "slice boundaries must trigger the time-slice check"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Counter advanced, still at or below the threshold.
    Counted {
        /// Ticks since the last boundary, this one included.
        count: u32,
    },
    /// Counter exceeded the threshold and was reset to zero.
    SliceBoundary,
}

/// Counts clock interrupts and reports every `threshold + 1`-th one.
#[derive(Debug, Clone)]
pub struct TickAggregator {
    count: u32,
    threshold: u32,
    total: u64,
    boundaries: u64,
}

impl TickAggregator {
    /// Starts counting from zero with the given threshold.
    pub const fn new(threshold: u32) -> Self {
        Self { count: 0, threshold, total: 0, boundaries: 0 }
    }

    /// Accounts one clock interrupt.
    pub fn tick(&mut self) -> Tick {
        self.total = self.total.wrapping_add(1);
        // count + 1 > threshold, without overflowing at u32::MAX
        if self.count >= self.threshold {
            self.count = 0;
            self.boundaries = self.boundaries.wrapping_add(1);
            Tick::SliceBoundary
        } else {
            self.count += 1;
            Tick::Counted { count: self.count }
        }
    }

    /// Ticks since the last slice boundary.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Ticks counted before the boundary.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Clock interrupts accounted since boot.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Slice boundaries reported since boot.
    pub fn boundaries(&self) -> u64 {
        self.boundaries
    }
}

impl Default for TickAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_THRESHOLD)
    }
}
