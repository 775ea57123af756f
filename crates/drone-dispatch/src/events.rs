//! # Fleet Events
//!
//! Change notifications published after each committed operation. Delivery
//! is best effort: with no subscribers, events are dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;

use drone_domain::{
    DeliveryId, DeliveryStatus, DroneId, DroneStatus, OrderId, OrderStatus, Position, RouteId,
    RouteStatus,
};

/// What changed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FleetEventKind {
    OrderCreated {
        order_id: OrderId,
    },
    OrderStatusChanged {
        order_id: OrderId,
        status: OrderStatus,
    },
    OrderDispatched {
        order_id: OrderId,
        drone_id: DroneId,
        delivery_id: DeliveryId,
    },
    DeliveryStatusChanged {
        delivery_id: DeliveryId,
        order_id: OrderId,
        drone_id: DroneId,
        status: DeliveryStatus,
    },
    DroneRegistered {
        drone_id: DroneId,
    },
    DroneStatusChanged {
        drone_id: DroneId,
        status: DroneStatus,
        battery: f64,
        position: Position,
    },
    RoutePlanned {
        route_id: RouteId,
        drone_id: DroneId,
        stops: usize,
    },
    RouteStatusChanged {
        route_id: RouteId,
        status: RouteStatus,
    },
}

impl FleetEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated { .. } => "order_created",
            Self::OrderStatusChanged { .. } => "order_status_changed",
            Self::OrderDispatched { .. } => "order_dispatched",
            Self::DeliveryStatusChanged { .. } => "delivery_status_changed",
            Self::DroneRegistered { .. } => "drone_registered",
            Self::DroneStatusChanged { .. } => "drone_status_changed",
            Self::RoutePlanned { .. } => "route_planned",
            Self::RouteStatusChanged { .. } => "route_status_changed",
        }
    }

    /// Drone the event concerns, if any
    #[must_use]
    pub const fn drone_id(&self) -> Option<DroneId> {
        match self {
            Self::OrderDispatched { drone_id, .. }
            | Self::DeliveryStatusChanged { drone_id, .. }
            | Self::DroneRegistered { drone_id }
            | Self::DroneStatusChanged { drone_id, .. }
            | Self::RoutePlanned { drone_id, .. } => Some(*drone_id),
            _ => None,
        }
    }
}

/// Timestamped fleet event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetEvent {
    #[serde(flatten)]
    pub kind: FleetEventKind,
    pub at: DateTime<Utc>,
}

impl FleetEvent {
    #[must_use]
    pub const fn new(kind: FleetEventKind, at: DateTime<Utc>) -> Self {
        Self { kind, at }
    }
}
