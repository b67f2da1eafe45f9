//! Scenario-driven simulation of the submission lifecycle.

pub mod runner;
pub mod scenario;
pub mod trace;

pub use runner::{SimulationReport, simulate};
pub use scenario::{Scenario, load_scenario};
pub use trace::{EventType, Recorder, TraceEvent};
