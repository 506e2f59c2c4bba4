//! Seeded randomized testing of the evaluator.
//!
//! Random graphs and solution sequences are generated from a seed, run
//! through the algebra and the processor, and checked against invariants
//! that must hold for every input:
//! - OPTIONAL keeps every left solution
//! - MINUS never removes a solution that shares no variable with the right side
//! - DISTINCT is idempotent
//! - Repetition paths terminate on cyclic graphs
//! - Terms of different kinds never compare
//! - Triple terms are the same term regardless of graph
//!
//! Given the same seed, a run is identical.
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulator::new(SimulatorConfig::new(12345));
//! let result = sim.run(100);
//! assert!(result.passed(), "{:?}", result.invariant_violations);
//! ```

mod invariants;

pub use graph_gen::{GraphGenConfig, GraphGenerator};
pub use invariants::{InvariantChecker, InvariantViolation};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
