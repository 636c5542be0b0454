//! Wall-clock accounting of the solver phases.
//!
//! Off unless [`enable_timing`] is called or `AX_TIMING` is set. Totals are
//! reported through `tracing` at the end of a run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var_os("AX_TIMING").is_some()
}

/// Running measurement; a no-op when timing is off.
pub struct Timer(Option<Instant>);

impl Timer {
    pub fn start() -> Self {
        Self(is_enabled().then(Instant::now))
    }

    /// Charge the elapsed time to `phase`.
    pub fn stop_into(self, phase: &PhaseTimer) {
        if let Some(start) = self.0 {
            phase.charge(start.elapsed().as_nanos() as u64);
        }
    }
}

/// Total time and call count of one solver phase.
pub struct PhaseTimer {
    label: &'static str,
    nanos: AtomicU64,
    calls: AtomicU64,
}

impl PhaseTimer {
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            nanos: AtomicU64::new(0),
            calls: AtomicU64::new(0),
        }
    }

    fn charge(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Seconds spent in the phase.
    pub fn total(&self) -> f64 {
        self.nanos.load(Ordering::Relaxed) as f64 * 1e-9
    }

    /// Mean seconds per call, zero before the first call.
    pub fn mean(&self) -> f64 {
        match self.calls() {
            0 => 0.0,
            n => self.total() / n as f64,
        }
    }

    pub fn reset(&self) {
        self.nanos.store(0, Ordering::Relaxed);
        self.calls.store(0, Ordering::Relaxed);
    }
}

/// Phases of the coupling loop.
pub mod solver_timing {
    use super::PhaseTimer;

    pub static STRUCTURE_SOLVE: PhaseTimer = PhaseTimer::new("structure solve");
    /// Influence assembly, circulation solve and forces
    pub static AERO_SOLVE: PhaseTimer = PhaseTimer::new("aero solve");
    pub static WAKE_CONVECTION: PhaseTimer = PhaseTimer::new("wake convection");

    fn phases() -> [&'static PhaseTimer; 3] {
        [&STRUCTURE_SOLVE, &AERO_SOLVE, &WAKE_CONVECTION]
    }

    pub fn reset_all() {
        phases().iter().for_each(|p| p.reset());
    }

    pub fn log_summary() {
        if !super::is_enabled() {
            return;
        }
        for phase in phases().into_iter().filter(|p| p.calls() > 0) {
            tracing::info!(
                target: "ax::timing",
                phase = phase.label(),
                calls = phase.calls(),
                total_s = phase.total(),
                mean_ms = phase.mean() * 1e3,
                "phase timing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_mean_and_reset() {
        let phase = PhaseTimer::new("test");
        assert_eq!(phase.mean(), 0.0);
        phase.charge(500_000_000);
        phase.charge(1_500_000_000);
        assert_eq!(phase.calls(), 2);
        assert!((phase.total() - 2.0).abs() < 1e-9);
        assert!((phase.mean() - 1.0).abs() < 1e-9);
        phase.reset();
        assert_eq!(phase.calls(), 0);
    }

    #[test]
    fn disabled_timer_charges_nothing() {
        let phase = PhaseTimer::new("off");
        Timer(None).stop_into(&phase);
        assert_eq!(phase.calls(), 0);
    }
}
