//! # Drone Dispatch Engine
//!
//! Assigns delivery orders to drones on a 10x10 urban grid, plans multi-stop
//! routes and drives every order, drone and delivery through its lifecycle.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 DispatchService (async, RwLock)              │
//! │          events ─► broadcast::Sender<FleetEvent>             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ one write lock per atomic unit
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            lifecycle (validate, then commit; sync)           │
//! └─────────────────────────────────────────────────────────────┘
//!          │                   │                    │
//!          ▼                   ▼                    ▼
//! ┌────────────────┐  ┌────────────────┐  ┌────────────────────┐
//! │ queue          │  │ selector       │  │ planner            │
//! │ priority, age  │  │ eligibility,   │  │ greedy nearest-    │
//! │                │  │ policy ranking │  │ neighbour routes   │
//! └────────────────┘  └────────────────┘  └────────────────────┘
//!                              │
//!                              ▼
//!                     cost (flight time, battery drain)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drone_dispatch::{DispatchConfig, DispatchService};
//!
//! let svc = DispatchService::in_memory(DispatchConfig::default());
//! svc.register_drone(NewDrone::new("Alpha", 10.0, 20.0)).await?;
//! let order = svc.create_order(NewOrder::new(3, 3, 5.0, Priority::High)).await?;
//! let report = svc.dispatch_all().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod cost;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod planner;
pub mod queue;
pub mod selector;
pub mod service;
pub mod stats;

// Re-export commonly used types
pub use config::DispatchConfig;
pub use error::{DispatchError, NO_ELIGIBLE_DRONE, Result};
pub use events::{FleetEvent, FleetEventKind};
pub use lifecycle::{BatteryAction, DeliveryOutcome};
pub use queue::QueueEntry;
pub use selector::{Ineligible, SelectionPolicy, select_drone};
pub use service::{BatchFailure, BatchReport, DispatchService, DroneCommand, FleetPlan};
pub use stats::{DeliveryStats, FleetStats, Overview, QueueStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
