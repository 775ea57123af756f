//! # GraphQL Enum Types
//!
//! Enum definitions for the GraphQL schema.

use async_graphql::Enum;
use drone_dispatch as dispatch;
use drone_domain as domain;

/// Order priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Default)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Served first (1)
    High,
    /// Default tier (2)
    #[default]
    Medium,
    /// Served last (3)
    Low,
}

impl From<domain::Priority> for Priority {
    fn from(p: domain::Priority) -> Self {
        match p {
            domain::Priority::High => Self::High,
            domain::Priority::Medium => Self::Medium,
            domain::Priority::Low => Self::Low,
        }
    }
}

impl From<Priority> for domain::Priority {
    fn from(p: Priority) -> Self {
        match p {
            Priority::High => Self::High,
            Priority::Medium => Self::Medium,
            Priority::Low => Self::Low,
        }
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Waiting in the queue
    Pending,
    /// Bound to a drone
    Assigned,
    /// Delivery underway
    InTransit,
    /// Handed over to the customer
    Delivered,
    /// Withdrawn
    Cancelled,
}

impl From<domain::OrderStatus> for OrderStatus {
    fn from(s: domain::OrderStatus) -> Self {
        match s {
            domain::OrderStatus::Pending => Self::Pending,
            domain::OrderStatus::Assigned => Self::Assigned,
            domain::OrderStatus::InTransit => Self::InTransit,
            domain::OrderStatus::Delivered => Self::Delivered,
            domain::OrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<OrderStatus> for domain::OrderStatus {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::Pending => Self::Pending,
            OrderStatus::Assigned => Self::Assigned,
            OrderStatus::InTransit => Self::InTransit,
            OrderStatus::Delivered => Self::Delivered,
            OrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Drone operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum DroneStatus {
    /// On the ground, ready for dispatch
    Idle,
    /// Carrying assigned orders
    Flying,
    /// Working an in-transit delivery
    Delivering,
    /// On a charger
    Charging,
    /// Battery at or below 20%
    LowBattery,
    /// Withdrawn from service
    Maintenance,
}

impl From<domain::DroneStatus> for DroneStatus {
    fn from(s: domain::DroneStatus) -> Self {
        match s {
            domain::DroneStatus::Idle => Self::Idle,
            domain::DroneStatus::Flying => Self::Flying,
            domain::DroneStatus::Delivering => Self::Delivering,
            domain::DroneStatus::Charging => Self::Charging,
            domain::DroneStatus::LowBattery => Self::LowBattery,
            domain::DroneStatus::Maintenance => Self::Maintenance,
        }
    }
}

impl From<DroneStatus> for domain::DroneStatus {
    fn from(s: DroneStatus) -> Self {
        match s {
            DroneStatus::Idle => Self::Idle,
            DroneStatus::Flying => Self::Flying,
            DroneStatus::Delivering => Self::Delivering,
            DroneStatus::Charging => Self::Charging,
            DroneStatus::LowBattery => Self::LowBattery,
            DroneStatus::Maintenance => Self::Maintenance,
        }
    }
}

/// Delivery record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
    Failed,
}

impl From<domain::DeliveryStatus> for DeliveryStatus {
    fn from(s: domain::DeliveryStatus) -> Self {
        match s {
            domain::DeliveryStatus::Pending => Self::Pending,
            domain::DeliveryStatus::InTransit => Self::InTransit,
            domain::DeliveryStatus::Delivered => Self::Delivered,
            domain::DeliveryStatus::Cancelled => Self::Cancelled,
            domain::DeliveryStatus::Failed => Self::Failed,
        }
    }
}

impl From<DeliveryStatus> for domain::DeliveryStatus {
    fn from(s: DeliveryStatus) -> Self {
        match s {
            DeliveryStatus::Pending => Self::Pending,
            DeliveryStatus::InTransit => Self::InTransit,
            DeliveryStatus::Delivered => Self::Delivered,
            DeliveryStatus::Cancelled => Self::Cancelled,
            DeliveryStatus::Failed => Self::Failed,
        }
    }
}

/// Route plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl From<domain::RouteStatus> for RouteStatus {
    fn from(s: domain::RouteStatus) -> Self {
        match s {
            domain::RouteStatus::Planned => Self::Planned,
            domain::RouteStatus::Active => Self::Active,
            domain::RouteStatus::Completed => Self::Completed,
            domain::RouteStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<RouteStatus> for domain::RouteStatus {
    fn from(s: RouteStatus) -> Self {
        match s {
            RouteStatus::Planned => Self::Planned,
            RouteStatus::Active => Self::Active,
            RouteStatus::Completed => Self::Completed,
            RouteStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// Operator battery action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum BatteryAction {
    /// Instant full charge, drone returns to idle
    Charge,
    /// Park on a charger
    Dock,
}

impl From<BatteryAction> for dispatch::BatteryAction {
    fn from(a: BatteryAction) -> Self {
        match a {
            BatteryAction::Charge => Self::Charge,
            BatteryAction::Dock => Self::Dock,
        }
    }
}

/// Drone ranking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum SelectionPolicy {
    MinDeliveryTime,
    EfficiencyScore,
}

impl From<dispatch::SelectionPolicy> for SelectionPolicy {
    fn from(p: dispatch::SelectionPolicy) -> Self {
        match p {
            dispatch::SelectionPolicy::MinDeliveryTime => Self::MinDeliveryTime,
            dispatch::SelectionPolicy::EfficiencyScore => Self::EfficiencyScore,
        }
    }
}

/// Kind of fleet event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum FleetEventType {
    OrderCreated,
    OrderStatusChanged,
    OrderDispatched,
    DeliveryStatusChanged,
    DroneRegistered,
    DroneStatusChanged,
    RoutePlanned,
    RouteStatusChanged,
}

impl From<&dispatch::FleetEventKind> for FleetEventType {
    fn from(kind: &dispatch::FleetEventKind) -> Self {
        use dispatch::FleetEventKind as K;
        match kind {
            K::OrderCreated { .. } => Self::OrderCreated,
            K::OrderStatusChanged { .. } => Self::OrderStatusChanged,
            K::OrderDispatched { .. } => Self::OrderDispatched,
            K::DeliveryStatusChanged { .. } => Self::DeliveryStatusChanged,
            K::DroneRegistered { .. } => Self::DroneRegistered,
            K::DroneStatusChanged { .. } => Self::DroneStatusChanged,
            K::RoutePlanned { .. } => Self::RoutePlanned,
            K::RouteStatusChanged { .. } => Self::RouteStatusChanged,
        }
    }
}
