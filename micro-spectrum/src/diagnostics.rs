use core::sync::atomic::{AtomicU32, Ordering};

/// Counters shared between the sampling interrupt and the main context.
///
/// The interrupt only increments; the main context reads through
/// [`Diagnostics::snapshot`].
#[derive(Debug, Default)]
pub struct Diagnostics {
    ticks: AtomicU32,
    collected: AtomicU32,
    missed: AtomicU32,
    overruns: AtomicU32,
    passes: AtomicU32,
    stalls: AtomicU32,
    hand_off_conflicts: AtomicU32,
    longest_wait: AtomicU32,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            collected: AtomicU32::new(0),
            missed: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
            passes: AtomicU32::new(0),
            stalls: AtomicU32::new(0),
            hand_off_conflicts: AtomicU32::new(0),
            longest_wait: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sample(&self) {
        self.collected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.missed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pass(&self, polls: u32) {
        self.passes.fetch_add(1, Ordering::Relaxed);
        self.longest_wait.fetch_max(polls, Ordering::Relaxed);
    }

    pub(crate) fn record_stall(&self, polls: u32) {
        self.stalls.fetch_add(1, Ordering::Relaxed);
        self.longest_wait.fetch_max(polls, Ordering::Relaxed);
    }

    pub(crate) fn record_hand_off_conflict(&self) {
        self.hand_off_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            collected: self.collected.load(Ordering::Relaxed),
            missed: self.missed.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            stalls: self.stalls.load(Ordering::Relaxed),
            hand_off_conflicts: self.hand_off_conflicts.load(Ordering::Relaxed),
            longest_wait: self.longest_wait.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Diagnostics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticsSnapshot {
    /// Timer interrupts taken.
    pub ticks: u32,
    /// Samples stored into a window.
    pub collected: u32,
    /// Ticks that found the active window locked.
    pub missed: u32,
    /// Ticks that found the active window already full.
    pub overruns: u32,
    pub passes: u32,
    pub stalls: u32,
    pub hand_off_conflicts: u32,
    /// Most polls any pass spent waiting for a full window.
    pub longest_wait: u32,
}

impl DiagnosticsSnapshot {
    /// Fraction of ticks that produced a sample. Ideally close to 1.
    pub fn consumption(&self) -> f32 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.collected as f32 / self.ticks as f32
    }
}
