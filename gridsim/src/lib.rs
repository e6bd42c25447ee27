pub mod api;
pub mod circuit;
pub mod controlled;
pub mod gates;
pub mod probability;
pub mod simulator;
pub mod state;
pub mod tensor;

pub mod events;

// Re-export key components for easier access from the binary or other libraries.
pub use api::{SimError, SimulatorApi, simulate, simulate_json, simulate_with_trace};
pub use circuit::{Circuit, GateCell};
pub use gates::{ControlledKind, SingleQubitGate};
pub use probability::ProbabilityMap;
pub use simulator::GridSimulator;
pub use state::StateVector;
