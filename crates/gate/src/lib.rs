use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{error, warn};

/// Placeholder markers that identify synthetic input. Shared with the
/// scanner's structural false-positive sieve.
pub const SYNTHETIC_MARKERS: &[&str] = &[
    "mock",
    "test",
    "demo",
    "sample",
    "example",
    "lorem ipsum",
    "placeholder",
    "dummy",
    "fictional",
    "hypothetical",
    "not real",
];

/// Boilerplate phrases that machine-generated fixtures tend to carry even
/// when the individual markers above have been stripped out.
const FIXTURE_PHRASES: &[&str] = &[
    "this is a sample for testing purposes",
    "example content for demonstration",
    "lorem ipsum dolor sit amet",
    "placeholder content here",
    "generated for demonstration purposes",
];

#[derive(Debug, Error)]
pub enum GateError {
    /// Input failed live-data validation. Recoverable: the caller can
    /// supply corrected input.
    #[error("live-data validation failed at '{origin}': {reason}")]
    Validation { origin: String, reason: String },

    /// Simulation data reached a live entry point. Fatal for the whole
    /// call: no partial results, no silent continuation.
    #[error("simulation blocked at '{origin}': synthetic data must not reach a live assessment")]
    SimulationBlocked { origin: String },
}

/// Cross-cutting guard rejecting synthetic input before it reaches the
/// pipeline. Passed explicitly into every entry point; clones share the
/// simulation latch.
#[derive(Debug, Clone, Default)]
pub struct LiveDataGate {
    simulation_detected: Arc<AtomicBool>,
}

impl LiveDataGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the input looks like genuine live data.
    pub fn validate(&self, input: &str, source: &str) -> bool {
        match find_synthetic_reason(input) {
            Some(reason) => {
                warn!(source = source, reason = reason, "input failed live-data validation");
                false
            }
            None => true,
        }
    }

    /// Validate, failing with a recoverable `ValidationError` on synthetic
    /// input.
    pub fn ensure_live(&self, input: &str, source: &str) -> Result<(), GateError> {
        match find_synthetic_reason(input) {
            Some(reason) => Err(GateError::Validation {
                origin: source.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Raise the simulation latch and build the fatal error the caller must
    /// return immediately, aborting the operation with no partial results.
    pub fn block_simulation(&self, origin: &str) -> GateError {
        self.raise_simulation_alert(origin);
        GateError::SimulationBlocked {
            origin: origin.to_string(),
        }
    }

    /// Mark the whole system as contaminated. Every entry point sharing
    /// this gate refuses to proceed until the process restarts.
    pub fn raise_simulation_alert(&self, origin: &str) {
        error!(origin = origin, "simulation detected; latching gate closed");
        self.simulation_detected.store(true, Ordering::SeqCst);
    }

    pub fn simulation_detected(&self) -> bool {
        self.simulation_detected.load(Ordering::SeqCst)
    }

    /// Entry-point check: refuse to proceed while the latch is raised.
    pub fn check_clear(&self, origin: &str) -> Result<(), GateError> {
        if self.simulation_detected() {
            return Err(GateError::SimulationBlocked {
                origin: origin.to_string(),
            });
        }
        Ok(())
    }
}

fn find_synthetic_reason(input: &str) -> Option<String> {
    let folded = input.to_lowercase();
    for marker in SYNTHETIC_MARKERS {
        if folded.contains(marker) {
            return Some(format!("synthetic marker '{}' in input", marker));
        }
    }
    for phrase in FIXTURE_PHRASES {
        if folded.contains(phrase) {
            return Some(format!("fixture phrase '{}' in input", phrase));
        }
    }
    None
}
