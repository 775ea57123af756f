//! # GraphQL Input Types
//!
//! Input object definitions for mutations and queries.

use async_graphql::{ID, InputObject, Result};

use super::enums::*;
use crate::context::parse_id;
use crate::error::ApiError;
use drone_dispatch::DroneCommand;
use drone_domain as domain;

// =============================================================================
// POSITION
// =============================================================================

/// Grid coordinates input
#[derive(Debug, Clone, Copy, InputObject)]
pub struct PositionInput {
    pub x: i32,
    pub y: i32,
}

impl From<PositionInput> for domain::Position {
    fn from(p: PositionInput) -> Self {
        Self::new(p.x, p.y)
    }
}

// =============================================================================
// ORDER INPUTS
// =============================================================================

/// Input for creating an order
#[derive(Debug, Clone, InputObject)]
pub struct CreateOrderInput {
    /// Drop-off point
    pub location: PositionInput,
    /// Payload weight (0, 50]
    pub weight: f64,
    #[graphql(default)]
    pub priority: Priority,
    pub description: Option<String>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

impl From<CreateOrderInput> for domain::NewOrder {
    fn from(input: CreateOrderInput) -> Self {
        Self {
            location: input.location.into(),
            weight: input.weight,
            priority: input.priority.into(),
            description: input.description,
            client_name: input.client_name,
            client_phone: input.client_phone,
        }
    }
}

/// Editable fields of a pending order
#[derive(Debug, Clone, InputObject)]
pub struct UpdateOrderInput {
    pub priority: Option<Priority>,
    pub description: Option<String>,
}

impl From<UpdateOrderInput> for domain::OrderUpdate {
    fn from(input: UpdateOrderInput) -> Self {
        Self {
            priority: input.priority.map(Into::into),
            description: input.description,
        }
    }
}

// =============================================================================
// DRONE INPUTS
// =============================================================================

/// Input for registering a drone
#[derive(Debug, Clone, InputObject)]
pub struct CreateDroneInput {
    pub name: String,
    pub model: Option<String>,
    /// Maximum payload
    pub capacity: f64,
    /// Maximum distance on a full charge
    pub range: f64,
    /// Battery percent per unit distance at zero load
    #[graphql(default = 0.5)]
    pub battery_consumption_rate: f64,
}

impl From<CreateDroneInput> for domain::NewDrone {
    fn from(input: CreateDroneInput) -> Self {
        Self {
            name: input.name,
            model: input.model,
            capacity: input.capacity,
            range: input.range,
            battery_consumption_rate: input.battery_consumption_rate,
        }
    }
}

/// Operator state change; set exactly one field
#[derive(Debug, Clone, InputObject)]
pub struct DroneStateInput {
    /// Fly to a grid point
    pub position: Option<PositionInput>,
    /// Charge or dock
    pub battery_action: Option<BatteryAction>,
    /// Manual status override
    pub status: Option<DroneStatus>,
}

impl TryFrom<DroneStateInput> for DroneCommand {
    type Error = ApiError;

    fn try_from(input: DroneStateInput) -> Result<Self, Self::Error> {
        match (input.position, input.battery_action, input.status) {
            (Some(p), None, None) => Ok(Self::MoveTo(p.into())),
            (None, Some(a), None) => Ok(Self::Battery(a.into())),
            (None, None, Some(s)) => Ok(Self::SetStatus(s.into())),
            _ => Err(ApiError::InvalidInput(
                "exactly one of position, batteryAction or status must be set".to_string(),
            )),
        }
    }
}

// =============================================================================
// ROUTE INPUTS
// =============================================================================

/// Input for planning one drone's route
#[derive(Debug, Clone, InputObject)]
pub struct PlanRouteInput {
    pub drone_id: ID,
    /// Candidate orders; the pending queue when omitted
    pub order_ids: Option<Vec<ID>>,
    /// Reorder stops nearest-first
    #[graphql(default = true)]
    pub optimize: bool,
}

impl PlanRouteInput {
    pub fn order_ids(&self) -> Result<Option<Vec<domain::OrderId>>> {
        self.order_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| parse_id("order", id)).collect())
            .transpose()
    }
}

// =============================================================================
// QUERY FILTERS
// =============================================================================

/// Pagination input
#[derive(Debug, Clone, InputObject)]
pub struct PaginationInput {
    /// Maximum results to return
    #[graphql(default = 20)]
    pub limit: i32,
    /// Number of results to skip
    #[graphql(default = 0)]
    pub offset: i32,
}

impl Default for PaginationInput {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Order query filter
#[derive(Debug, Clone, InputObject, Default)]
pub struct OrderFilterInput {
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub assigned_drone_id: Option<ID>,
}

impl OrderFilterInput {
    pub fn into_filter(self) -> Result<domain::OrderFilter> {
        Ok(domain::OrderFilter {
            status: self.status.map(Into::into),
            priority: self.priority.map(Into::into),
            assigned_drone: self
                .assigned_drone_id
                .map(|id| parse_id("drone", &id))
                .transpose()?,
        })
    }
}

/// Drone query filter
#[derive(Debug, Clone, InputObject, Default)]
pub struct DroneFilterInput {
    pub status: Option<DroneStatus>,
    /// Minimum battery percentage
    pub min_battery: Option<f64>,
}

impl From<DroneFilterInput> for domain::DroneFilter {
    fn from(input: DroneFilterInput) -> Self {
        Self {
            status: input.status.map(Into::into),
            min_battery: input.min_battery,
        }
    }
}

/// Delivery query filter
#[derive(Debug, Clone, InputObject, Default)]
pub struct DeliveryFilterInput {
    pub status: Option<DeliveryStatus>,
    pub drone_id: Option<ID>,
}

impl DeliveryFilterInput {
    pub fn into_filter(self) -> Result<domain::DeliveryFilter> {
        Ok(domain::DeliveryFilter {
            status: self.status.map(Into::into),
            drone_id: self.drone_id.map(|id| parse_id("drone", &id)).transpose()?,
        })
    }
}

/// Route query filter
#[derive(Debug, Clone, InputObject, Default)]
pub struct RouteFilterInput {
    pub status: Option<RouteStatus>,
    pub drone_id: Option<ID>,
}

impl RouteFilterInput {
    pub fn into_filter(self) -> Result<domain::RouteFilter> {
        Ok(domain::RouteFilter {
            status: self.status.map(Into::into),
            drone_id: self.drone_id.map(|id| parse_id("drone", &id)).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drone_state_requires_exactly_one_field() {
        let none = DroneStateInput {
            position: None,
            battery_action: None,
            status: None,
        };
        assert!(DroneCommand::try_from(none).is_err());

        let both = DroneStateInput {
            position: Some(PositionInput { x: 1, y: 1 }),
            battery_action: Some(BatteryAction::Charge),
            status: None,
        };
        assert!(DroneCommand::try_from(both).is_err());

        let dock = DroneStateInput {
            position: None,
            battery_action: Some(BatteryAction::Dock),
            status: None,
        };
        assert!(matches!(
            DroneCommand::try_from(dock),
            Ok(DroneCommand::Battery(drone_dispatch::BatteryAction::Dock))
        ));
    }

    #[test]
    fn test_order_filter_rejects_bad_drone_id() {
        let filter = OrderFilterInput {
            assigned_drone_id: Some(ID::from("drone-7")),
            ..Default::default()
        };
        assert!(filter.into_filter().is_err());
    }
}
