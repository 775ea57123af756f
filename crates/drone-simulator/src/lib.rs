//! # Drone Simulator
//!
//! Traffic simulator for exercising the dispatch engine end to end.
//!
//! ## Features
//!
//! - Seeded random fleets and order books on the delivery grid
//! - Tick loop driving dispatch, delivery, failure and recharge
//! - Periodic fleet route planning

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod runner;
pub mod scenario;

pub use runner::{FleetSimulator, SimulationSettings, TickSummary};
pub use scenario::ScenarioGenerator;
