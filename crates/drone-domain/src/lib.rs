//! # Drone Delivery Dispatch - Domain Model
//!
//! Core domain entities, value objects, and enums for urban drone delivery
//! logistics. These types are the single source of truth across all layers:
//! persistence, dispatch engine, API, and simulator.
//!
//! Entities reference each other only by typed identifier. Resolving an
//! `OrderId` or `DroneId` is always a lookup against the entity store.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Largest coordinate on either axis of the delivery grid (inclusive).
pub const GRID_MAX: i32 = 10;

/// Heaviest order a customer may place.
pub const MAX_ORDER_WEIGHT: f64 = 50.0;

/// Largest payload capacity a drone may be registered with.
pub const MAX_DRONE_CAPACITY: f64 = 100.0;

/// Longest flight range a drone may be registered with.
pub const MAX_DRONE_RANGE: f64 = 50.0;

/// Highest battery drain rate (percent per unit distance).
pub const MAX_BATTERY_CONSUMPTION: f64 = 10.0;

/// Drain rate used when a drone is registered without one.
pub const DEFAULT_BATTERY_CONSUMPTION: f64 = 0.5;

/// Full charge, in percent.
pub const FULL_BATTERY: f64 = 100.0;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Order`]
    OrderId
);
entity_id!(
    /// Identifier of a [`Drone`]
    DroneId
);
entity_id!(
    /// Identifier of a [`Delivery`]
    DeliveryId
);
entity_id!(
    /// Identifier of a [`Route`]
    RouteId
);

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Integer point on the delivery grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Depot where drones are registered
    pub const DEPOT: Self = Self::new(0, 0);

    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another grid point
    #[must_use]
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        dx.hypot(dy)
    }

    /// Whether both coordinates lie inside `[0, GRID_MAX]`
    #[must_use]
    pub const fn in_grid(&self) -> bool {
        self.x >= 0 && self.x <= GRID_MAX && self.y >= 0 && self.y <= GRID_MAX
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Order priority. Lower value is served first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            other => Err(DomainError::Validation {
                field: "priority",
                message: format!("must be 1 (high), 2 (medium) or 3 (low), got {other}"),
            }),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.value()
    }
}

/// Entity status with a fixed table of legal transitions
pub trait StatusMachine: Copy + PartialEq + fmt::Debug {
    /// Entity kind used in error messages
    const ENTITY: &'static str;

    /// Whether `self -> next` is a legal transition
    fn can_transition_to(self, next: Self) -> bool;

    /// Terminal states accept no further transitions
    fn is_terminal(self) -> bool;

    /// Validate a transition, returning the new status
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] when the table forbids it.
    fn transition_to(self, next: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                entity_type: Self::ENTITY,
                from: format!("{self:?}"),
                to: format!("{next:?}"),
            })
        }
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses in which the order must reference a drone
    #[must_use]
    pub const fn requires_drone(self) -> bool {
        matches!(self, Self::Assigned | Self::InTransit | Self::Delivered)
    }
}

impl StatusMachine for OrderStatus {
    const ENTITY: &'static str = "Order";

    fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::{Assigned, Cancelled, Delivered, InTransit, Pending};
        matches!(
            (self, next),
            (Pending, Assigned | Cancelled)
                // Assigned -> Delivered covers completion without an explicit start
                | (Assigned, InTransit | Delivered | Cancelled)
                // InTransit -> Pending requeues after a failed delivery
                | (InTransit, Delivered | Pending)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Drone operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneStatus {
    Idle,
    Flying,
    Delivering,
    Charging,
    LowBattery,
    Maintenance,
}

impl DroneStatus {
    pub const ALL: [DroneStatus; 6] = [
        Self::Idle,
        Self::Flying,
        Self::Delivering,
        Self::Charging,
        Self::LowBattery,
        Self::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Flying => "flying",
            Self::Delivering => "delivering",
            Self::Charging => "charging",
            Self::LowBattery => "low_battery",
            Self::Maintenance => "maintenance",
        }
    }

    /// Flying or delivering
    #[must_use]
    pub const fn is_airborne(self) -> bool {
        matches!(self, Self::Flying | Self::Delivering)
    }
}

/// Delivery record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
    Failed,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 5] = [
        Self::Pending,
        Self::InTransit,
        Self::Delivered,
        Self::Cancelled,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl StatusMachine for DeliveryStatus {
    const ENTITY: &'static str = "Delivery";

    fn can_transition_to(self, next: Self) -> bool {
        use DeliveryStatus::{Cancelled, Delivered, Failed, InTransit, Pending};
        matches!(
            (self, next),
            (Pending, InTransit | Delivered | Cancelled) | (InTransit, Delivered | Failed)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Failed)
    }
}

/// Route plan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl StatusMachine for RouteStatus {
    const ENTITY: &'static str = "Route";

    fn can_transition_to(self, next: Self) -> bool {
        use RouteStatus::{Active, Cancelled, Completed, Planned};
        matches!(
            (self, next),
            (Planned, Active | Cancelled) | (Active, Completed | Cancelled)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Order entity - a pickup request waiting for, or carried by, a drone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub location: Position,
    pub weight: f64,
    pub priority: Priority,
    pub status: OrderStatus,

    /// Set iff `status` is assigned, in transit or delivered
    pub assigned_drone: Option<DroneId>,

    // Customer details
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,

    // Temporal
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Build a pending order from a validated spec
    #[must_use]
    pub fn new(id: OrderId, spec: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            location: spec.location,
            weight: spec.weight,
            priority: spec.priority,
            status: OrderStatus::Pending,
            assigned_drone: None,
            description: spec.description,
            client_name: spec.client_name,
            client_phone: spec.client_phone,
            created_at: now,
            updated_at: now,
            assigned_at: None,
            delivered_at: None,
        }
    }

    /// Check the drone-reference invariant
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.status.requires_drone() == self.assigned_drone.is_some()
    }
}

/// Drone entity - a delivery unit in the fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: DroneId,
    pub name: String,
    pub model: Option<String>,

    // Platform limits
    pub capacity: f64,
    pub range: f64,
    /// Percent battery per unit distance at zero load
    pub battery_consumption_rate: f64,

    // Current state
    pub battery: f64,
    pub current_load: f64,
    pub current_range: f64,
    pub position: Position,
    pub status: DroneStatus,
    pub assigned_orders: BTreeSet<OrderId>,

    // Performance counters
    pub total_deliveries: u32,
    pub total_flight_time: f64,

    // Metadata
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drone {
    /// Register a fully charged, idle drone at the depot
    #[must_use]
    pub fn new(id: DroneId, spec: NewDrone, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: spec.name,
            model: spec.model,
            capacity: spec.capacity,
            range: spec.range,
            battery_consumption_rate: spec.battery_consumption_rate,
            battery: FULL_BATTERY,
            current_load: 0.0,
            current_range: spec.range,
            position: Position::DEPOT,
            status: DroneStatus::Idle,
            assigned_orders: BTreeSet::new(),
            total_deliveries: 0,
            total_flight_time: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Payload still available on this drone
    #[must_use]
    pub fn remaining_capacity(&self) -> f64 {
        (self.capacity - self.current_load).max(0.0)
    }

    /// Fraction of capacity in use (0.0 - 1.0)
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        if self.capacity > 0.0 {
            self.current_load / self.capacity
        } else {
            0.0
        }
    }

    /// Whether the drone carries the given order
    #[must_use]
    pub fn carries(&self, order_id: OrderId) -> bool {
        self.assigned_orders.contains(&order_id)
    }
}

/// Delivery entity - historical record of one dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub drone_id: DroneId,
    pub status: DeliveryStatus,

    /// Distance from the drone to the order at dispatch time
    pub distance: f64,
    /// Estimated flight minutes at dispatch time
    pub estimated_time: f64,

    pub start_time: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Elapsed minutes between start and delivery
    pub actual_time: Option<f64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stop of a planned route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub order_id: OrderId,
    pub location: Position,
    pub weight: f64,
    pub priority: Priority,
    /// Leg distance from the previous stop (or the drone)
    pub distance: f64,
    /// Leg flight minutes
    pub estimated_time: f64,
}

/// Route entity - multi-stop itinerary for one drone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub drone_id: DroneId,
    pub stops: Vec<RouteStop>,
    pub total_distance: f64,
    pub total_time: f64,
    pub total_weight: f64,
    pub status: RouteStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Route {
    /// Build a planned route, summing the stop legs
    #[must_use]
    pub fn planned(
        id: RouteId,
        drone_id: DroneId,
        stops: Vec<RouteStop>,
        now: DateTime<Utc>,
    ) -> Self {
        let total_distance = stops.iter().map(|s| s.distance).sum();
        let total_time = stops.iter().map(|s| s.estimated_time).sum();
        let total_weight = stops.iter().map(|s| s.weight).sum();

        Self {
            id,
            drone_id,
            stops,
            total_distance,
            total_time,
            total_weight,
            status: RouteStatus::Planned,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Payload moved per unit distance
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.total_distance > 0.0 {
            self.total_weight / self.total_distance
        } else {
            0.0
        }
    }

    /// Order ids in visiting order
    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.stops.iter().map(|s| s.order_id)
    }
}

// =============================================================================
// INPUT SPECS
// =============================================================================

/// Request to create an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub location: Position,
    pub weight: f64,
    #[serde(default)]
    pub priority: Priority,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

impl NewOrder {
    #[must_use]
    pub fn new(x: i32, y: i32, weight: f64, priority: Priority) -> Self {
        Self {
            location: Position::new(x, y),
            weight,
            priority,
            description: None,
            client_name: None,
            client_phone: None,
        }
    }

    /// Enforce grid, weight and text bounds
    ///
    /// # Errors
    ///
    /// Returns the first violated field as [`DomainError::Validation`].
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_position("location", &self.location)?;
        if !(self.weight > 0.0 && self.weight <= MAX_ORDER_WEIGHT) {
            return Err(DomainError::Validation {
                field: "weight",
                message: format!("must be in (0, {MAX_ORDER_WEIGHT}], got {}", self.weight),
            });
        }
        validate_len("description", self.description.as_deref(), 0, 500)?;
        validate_len("client_name", self.client_name.as_deref(), 0, 100)?;
        validate_len("client_phone", self.client_phone.as_deref(), 0, 20)?;
        Ok(())
    }
}

/// Request to register a drone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDrone {
    pub name: String,
    pub model: Option<String>,
    pub capacity: f64,
    pub range: f64,
    #[serde(default = "default_consumption")]
    pub battery_consumption_rate: f64,
}

fn default_consumption() -> f64 {
    DEFAULT_BATTERY_CONSUMPTION
}

impl NewDrone {
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: f64, range: f64) -> Self {
        Self {
            name: name.into(),
            model: None,
            capacity,
            range,
            battery_consumption_rate: DEFAULT_BATTERY_CONSUMPTION,
        }
    }

    /// Enforce platform limits
    ///
    /// # Errors
    ///
    /// Returns the first violated field as [`DomainError::Validation`].
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_len("name", Some(self.name.as_str()), 2, 50)?;
        validate_len("model", self.model.as_deref(), 0, 50)?;
        validate_positive("capacity", self.capacity, MAX_DRONE_CAPACITY)?;
        validate_positive("range", self.range, MAX_DRONE_RANGE)?;
        validate_positive(
            "battery_consumption_rate",
            self.battery_consumption_rate,
            MAX_BATTERY_CONSUMPTION,
        )?;
        Ok(())
    }
}

/// Editable order fields (pending orders only)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub priority: Option<Priority>,
    pub description: Option<String>,
}

/// Validate a grid point
///
/// # Errors
///
/// Returns [`DomainError::Validation`] when outside `[0, GRID_MAX]`.
pub fn validate_position(field: &'static str, position: &Position) -> Result<(), DomainError> {
    if position.in_grid() {
        Ok(())
    } else {
        Err(DomainError::Validation {
            field,
            message: format!("{position} is outside the 0..={GRID_MAX} grid"),
        })
    }
}

fn validate_positive(field: &'static str, value: f64, max: f64) -> Result<(), DomainError> {
    if value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(DomainError::Validation {
            field,
            message: format!("must be in (0, {max}], got {value}"),
        })
    }
}

fn validate_len(
    field: &'static str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Result<(), DomainError> {
    let Some(value) = value else {
        return Ok(());
    };
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::Validation {
            field,
            message: format!("length must be between {min} and {max} characters, got {len}"),
        });
    }
    Ok(())
}

// =============================================================================
// QUERY/FILTER TYPES
// =============================================================================

/// Order listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub assigned_drone: Option<DroneId>,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status == s)
            && self.priority.is_none_or(|p| order.priority == p)
            && self
                .assigned_drone
                .is_none_or(|d| order.assigned_drone == Some(d))
    }
}

/// Drone listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DroneFilter {
    pub status: Option<DroneStatus>,
    pub min_battery: Option<f64>,
}

impl DroneFilter {
    #[must_use]
    pub fn matches(&self, drone: &Drone) -> bool {
        self.status.is_none_or(|s| drone.status == s)
            && self.min_battery.is_none_or(|b| drone.battery >= b)
    }
}

/// Delivery listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFilter {
    pub status: Option<DeliveryStatus>,
    pub drone_id: Option<DroneId>,
}

impl DeliveryFilter {
    #[must_use]
    pub fn matches(&self, delivery: &Delivery) -> bool {
        self.status.is_none_or(|s| delivery.status == s)
            && self.drone_id.is_none_or(|d| delivery.drone_id == d)
    }
}

/// Route listing filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFilter {
    pub status: Option<RouteStatus>,
    pub drone_id: Option<DroneId>,
}

impl RouteFilter {
    #[must_use]
    pub fn matches(&self, route: &Route) -> bool {
        self.status.is_none_or(|s| route.status == s)
            && self.drone_id.is_none_or(|d| route.drone_id == d)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Illegal {entity_type} transition: {from} -> {to}")]
    InvalidTransition {
        entity_type: &'static str,
        from: String,
        to: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::name::en::Name;

    #[test]
    fn test_distance_is_euclidean() {
        let origin = Position::default();
        let d = origin.distance_to(&Position::new(3, 3));
        assert!((d - 4.2426).abs() < 1e-3);
        assert_eq!(Position::new(3, 4).distance_to(&origin), 5.0);
    }

    #[test]
    fn test_priority_ordering_and_wire_format() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "3");
        let parsed: Priority = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, Priority::High);
        assert!(serde_json::from_str::<Priority>("4").is_err());
    }

    #[test]
    fn test_order_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Assigned));
        assert!(OrderStatus::Assigned.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::InTransit.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));

        let err = OrderStatus::Cancelled
            .transition_to(OrderStatus::Assigned)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { entity_type: "Order", .. }));
    }

    #[test]
    fn test_delivery_and_route_terminal_states() {
        for status in DeliveryStatus::ALL {
            if status.is_terminal() {
                for next in DeliveryStatus::ALL {
                    assert!(!status.can_transition_to(next));
                }
            }
        }
        assert!(RouteStatus::Planned.can_transition_to(RouteStatus::Active));
        assert!(!RouteStatus::Planned.can_transition_to(RouteStatus::Completed));
        assert!(RouteStatus::Completed.is_terminal());
    }

    #[test]
    fn test_new_drone_defaults() {
        let name: String = Name().fake();
        let drone = Drone::new(DroneId(7), NewDrone::new(name, 10.0, 20.0), Utc::now());
        assert_eq!(drone.status, DroneStatus::Idle);
        assert_eq!(drone.battery, FULL_BATTERY);
        assert_eq!(drone.current_range, 20.0);
        assert_eq!(drone.position, Position::DEPOT);
        assert!(drone.assigned_orders.is_empty());
    }

    #[test]
    fn test_order_validation() {
        assert!(NewOrder::new(3, 3, 5.0, Priority::High).validate().is_ok());
        assert!(NewOrder::new(11, 3, 5.0, Priority::High).validate().is_err());
        assert!(NewOrder::new(3, 3, 0.0, Priority::High).validate().is_err());
        assert!(NewOrder::new(3, 3, 50.5, Priority::High).validate().is_err());

        let mut spec = NewOrder::new(1, 1, 1.0, Priority::Low);
        spec.client_phone = Some("0".repeat(21));
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "client_phone", .. }));
    }

    #[test]
    fn test_drone_validation() {
        assert!(NewDrone::new("Falcon", 10.0, 20.0).validate().is_ok());
        assert!(NewDrone::new("F", 10.0, 20.0).validate().is_err());
        assert!(NewDrone::new("Falcon", 101.0, 20.0).validate().is_err());
        assert!(NewDrone::new("Falcon", 10.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_route_totals_and_efficiency() {
        let stops = vec![
            RouteStop {
                order_id: OrderId(1),
                location: Position::new(3, 0),
                weight: 2.0,
                priority: Priority::High,
                distance: 3.0,
                estimated_time: 6.0,
            },
            RouteStop {
                order_id: OrderId(2),
                location: Position::new(3, 4),
                weight: 4.0,
                priority: Priority::Low,
                distance: 4.0,
                estimated_time: 8.0,
            },
        ];
        let route = Route::planned(RouteId(9), DroneId(1), stops, Utc::now());
        assert_eq!(route.total_distance, 7.0);
        assert_eq!(route.total_time, 14.0);
        assert_eq!(route.total_weight, 6.0);
        assert!((route.efficiency() - 6.0 / 7.0).abs() < 1e-9);
        assert_eq!(route.order_ids().collect::<Vec<_>>(), vec![OrderId(1), OrderId(2)]);
    }

    #[test]
    fn test_filters() {
        let now = Utc::now();
        let mut order = Order::new(OrderId(1), NewOrder::new(1, 1, 1.0, Priority::High), now);
        assert!(OrderFilter::default().matches(&order));
        assert!(
            OrderFilter {
                status: Some(OrderStatus::Pending),
                priority: Some(Priority::High),
                assigned_drone: None,
            }
            .matches(&order)
        );
        order.status = OrderStatus::Assigned;
        order.assigned_drone = Some(DroneId(4));
        assert!(order.is_consistent());
        assert!(
            !OrderFilter {
                assigned_drone: Some(DroneId(5)),
                ..Default::default()
            }
            .matches(&order)
        );
    }
}
