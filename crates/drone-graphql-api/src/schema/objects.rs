//! # GraphQL Output Types
//!
//! Object type definitions for GraphQL responses.

use async_graphql::{Context, ID, Object, OutputType, Result, SimpleObject};
use chrono::{DateTime, Utc};

use super::enums::*;
use super::inputs::PaginationInput;
use crate::context::ApiContext;
use crate::error::graphql_error;
use drone_dispatch as dispatch;
use drone_domain as domain;

/// Saturating count conversion for GraphQL `Int`
pub(crate) fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn id_of(raw: impl ToString) -> ID {
    ID(raw.to_string())
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Point on the delivery grid
#[derive(Debug, Clone, Copy, SimpleObject)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl From<domain::Position> for Position {
    fn from(p: domain::Position) -> Self {
        Self { x: p.x, y: p.y }
    }
}

// =============================================================================
// ORDER
// =============================================================================

/// Delivery order
#[derive(Debug, Clone)]
pub struct Order(pub domain::Order);

impl From<domain::Order> for Order {
    fn from(o: domain::Order) -> Self {
        Self(o)
    }
}

#[Object]
impl Order {
    /// Unique order identifier
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    /// Drop-off point
    async fn location(&self) -> Position {
        self.0.location.into()
    }

    /// Payload weight
    async fn weight(&self) -> f64 {
        self.0.weight
    }

    async fn priority(&self) -> Priority {
        self.0.priority.into()
    }

    /// Numeric priority (1 = high, 3 = low)
    async fn priority_value(&self) -> i32 {
        i32::from(self.0.priority.value())
    }

    async fn status(&self) -> OrderStatus {
        self.0.status.into()
    }

    async fn assigned_drone_id(&self) -> Option<ID> {
        self.0.assigned_drone.map(id_of)
    }

    /// Drone carrying this order, if any
    async fn assigned_drone(&self, ctx: &Context<'_>) -> Result<Option<Drone>> {
        let Some(drone_id) = self.0.assigned_drone else {
            return Ok(None);
        };
        let api_ctx = ctx.data::<ApiContext>()?;
        match api_ctx.dispatch.get_drone(drone_id).await {
            Ok(drone) => Ok(Some(drone.into())),
            Err(dispatch::DispatchError::NotFound { .. }) => Ok(None),
            Err(e) => Err(graphql_error(e)),
        }
    }

    async fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    async fn client_name(&self) -> Option<&str> {
        self.0.client_name.as_deref()
    }

    async fn client_phone(&self) -> Option<&str> {
        self.0.client_phone.as_deref()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }

    async fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.0.assigned_at
    }

    async fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.0.delivered_at
    }
}

// =============================================================================
// DRONE
// =============================================================================

/// Fleet drone
#[derive(Debug, Clone)]
pub struct Drone(pub domain::Drone);

impl From<domain::Drone> for Drone {
    fn from(d: domain::Drone) -> Self {
        Self(d)
    }
}

#[Object]
impl Drone {
    /// Unique drone identifier
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn model(&self) -> Option<&str> {
        self.0.model.as_deref()
    }

    /// Maximum payload
    async fn capacity(&self) -> f64 {
        self.0.capacity
    }

    /// Maximum flight distance on a full charge
    async fn range(&self) -> f64 {
        self.0.range
    }

    /// Battery percent per unit distance at zero load
    async fn battery_consumption_rate(&self) -> f64 {
        self.0.battery_consumption_rate
    }

    /// Battery percentage (0-100)
    async fn battery(&self) -> f64 {
        self.0.battery
    }

    /// Is battery at or below the dispatch minimum
    async fn battery_critical(&self) -> bool {
        self.0.battery <= dispatch::cost::DISPATCH_MIN_BATTERY
    }

    async fn current_load(&self) -> f64 {
        self.0.current_load
    }

    async fn remaining_capacity(&self) -> f64 {
        self.0.remaining_capacity()
    }

    /// Fraction of capacity in use (0.0 - 1.0)
    async fn load_factor(&self) -> f64 {
        self.0.load_factor()
    }

    async fn current_range(&self) -> f64 {
        self.0.current_range
    }

    async fn position(&self) -> Position {
        self.0.position.into()
    }

    async fn status(&self) -> DroneStatus {
        self.0.status.into()
    }

    /// Idle with enough battery to be dispatched
    async fn is_available(&self) -> bool {
        dispatch::stats::is_available(&self.0)
    }

    async fn assigned_order_ids(&self) -> Vec<ID> {
        self.0.assigned_orders.iter().copied().map(id_of).collect()
    }

    /// Orders currently carried
    async fn orders(&self, ctx: &Context<'_>) -> Result<Vec<Order>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let orders = api_ctx
            .dispatch
            .drone_orders(self.0.id)
            .await
            .map_err(graphql_error)?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    async fn total_deliveries(&self) -> i32 {
        i32::try_from(self.0.total_deliveries).unwrap_or(i32::MAX)
    }

    /// Accumulated flight minutes
    async fn total_flight_time(&self) -> f64 {
        self.0.total_flight_time
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Record of one dispatch
#[derive(Debug, Clone)]
pub struct Delivery(pub domain::Delivery);

impl From<domain::Delivery> for Delivery {
    fn from(d: domain::Delivery) -> Self {
        Self(d)
    }
}

#[Object]
impl Delivery {
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn order_id(&self) -> ID {
        id_of(self.0.order_id)
    }

    async fn drone_id(&self) -> ID {
        id_of(self.0.drone_id)
    }

    async fn order(&self, ctx: &Context<'_>) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .get_order(self.0.order_id)
            .await
            .map_err(graphql_error)?;
        Ok(order.into())
    }

    async fn drone(&self, ctx: &Context<'_>) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone = api_ctx
            .dispatch
            .get_drone(self.0.drone_id)
            .await
            .map_err(graphql_error)?;
        Ok(drone.into())
    }

    async fn status(&self) -> DeliveryStatus {
        self.0.status.into()
    }

    /// Distance from drone to order at dispatch time
    async fn distance(&self) -> f64 {
        self.0.distance
    }

    /// Estimated flight minutes at dispatch time
    async fn estimated_time(&self) -> f64 {
        self.0.estimated_time
    }

    async fn start_time(&self) -> Option<DateTime<Utc>> {
        self.0.start_time
    }

    async fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.0.delivered_at
    }

    /// Elapsed minutes between start and delivery
    async fn actual_time(&self) -> Option<f64> {
        self.0.actual_time
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

// =============================================================================
// ROUTES
// =============================================================================

/// One stop of a route
#[derive(Debug, Clone, SimpleObject)]
pub struct RouteStop {
    /// 1-based visiting order
    pub sequence: i32,
    pub order_id: ID,
    pub location: Position,
    pub weight: f64,
    pub priority: Priority,
    /// Leg distance from the previous stop
    pub distance: f64,
    /// Leg flight minutes
    pub estimated_time: f64,
}

/// Multi-stop itinerary for one drone
#[derive(Debug, Clone)]
pub struct Route(pub domain::Route);

impl From<domain::Route> for Route {
    fn from(r: domain::Route) -> Self {
        Self(r)
    }
}

#[Object]
impl Route {
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn drone_id(&self) -> ID {
        id_of(self.0.drone_id)
    }

    async fn drone(&self, ctx: &Context<'_>) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone = api_ctx
            .dispatch
            .get_drone(self.0.drone_id)
            .await
            .map_err(graphql_error)?;
        Ok(drone.into())
    }

    async fn stops(&self) -> Vec<RouteStop> {
        self.0
            .stops
            .iter()
            .enumerate()
            .map(|(idx, stop)| RouteStop {
                sequence: count(idx + 1),
                order_id: id_of(stop.order_id),
                location: stop.location.into(),
                weight: stop.weight,
                priority: stop.priority.into(),
                distance: stop.distance,
                estimated_time: stop.estimated_time,
            })
            .collect()
    }

    async fn total_distance(&self) -> f64 {
        self.0.total_distance
    }

    async fn total_time(&self) -> f64 {
        self.0.total_time
    }

    async fn total_weight(&self) -> f64 {
        self.0.total_weight
    }

    /// Payload moved per unit distance
    async fn efficiency(&self) -> f64 {
        self.0.efficiency()
    }

    async fn status(&self) -> RouteStatus {
        self.0.status.into()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn started_at(&self) -> Option<DateTime<Utc>> {
        self.0.started_at
    }

    async fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.0.completed_at
    }
}

// =============================================================================
// QUEUE & DISPATCH RESULTS
// =============================================================================

/// Queue position with the drone that would take it now
#[derive(Debug, Clone, SimpleObject)]
pub struct QueueEntry {
    /// 1-based queue position
    pub position: i32,
    pub order: Order,
    pub recommended_drone_id: Option<ID>,
    pub recommended_drone_name: Option<String>,
    /// Flight minutes for the recommended drone
    pub estimated_time: Option<f64>,
    pub can_be_assigned: bool,
}

impl From<dispatch::QueueEntry> for QueueEntry {
    fn from(e: dispatch::QueueEntry) -> Self {
        Self {
            position: count(e.position),
            order: e.order.into(),
            recommended_drone_id: e.recommended_drone.map(id_of),
            recommended_drone_name: e.recommended_drone_name,
            estimated_time: e.estimated_time,
            can_be_assigned: e.can_be_assigned,
        }
    }
}

/// Entities committed by one dispatch or delivery step
#[derive(Debug, Clone, SimpleObject)]
pub struct DispatchResult {
    pub order: Order,
    pub drone: Drone,
    pub delivery: Delivery,
}

impl From<dispatch::DeliveryOutcome> for DispatchResult {
    fn from(o: dispatch::DeliveryOutcome) -> Self {
        Self {
            order: o.order.into(),
            drone: o.drone.into(),
            delivery: o.delivery.into(),
        }
    }
}

/// Order the batch could not place
#[derive(Debug, Clone, SimpleObject)]
pub struct DispatchFailure {
    pub order: Order,
    pub reason: String,
}

/// Result of processing the whole queue
#[derive(Debug, Clone, SimpleObject)]
pub struct BatchResult {
    pub processed: Vec<DispatchResult>,
    pub failed: Vec<DispatchFailure>,
    pub total: i32,
}

impl From<dispatch::BatchReport> for BatchResult {
    fn from(r: dispatch::BatchReport) -> Self {
        let total = count(r.total());
        Self {
            processed: r.processed.into_iter().map(Into::into).collect(),
            failed: r
                .failed
                .into_iter()
                .map(|f| DispatchFailure {
                    order: f.order.into(),
                    reason: f.reason,
                })
                .collect(),
            total,
        }
    }
}

/// Routes planned across the idle fleet
#[derive(Debug, Clone, SimpleObject)]
pub struct FleetPlan {
    pub routes: Vec<Route>,
    pub drones_considered: i32,
    pub pending_orders: i32,
    pub total_distance: f64,
    pub total_weight: f64,
}

impl From<dispatch::FleetPlan> for FleetPlan {
    fn from(p: dispatch::FleetPlan) -> Self {
        Self {
            routes: p.routes.into_iter().map(Into::into).collect(),
            drones_considered: count(p.drones_considered),
            pending_orders: count(p.pending_orders),
            total_distance: p.total_distance,
            total_weight: p.total_weight,
        }
    }
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Pending queue breakdown
#[derive(Debug, Clone, SimpleObject)]
pub struct QueueStats {
    pub total: i32,
    pub high_priority: i32,
    pub medium_priority: i32,
    pub low_priority: i32,
    /// Weight <= 5
    pub light: i32,
    /// 5 < weight <= 15
    pub medium_weight: i32,
    /// Weight > 15
    pub heavy: i32,
    pub total_weight: f64,
}

impl From<dispatch::QueueStats> for QueueStats {
    fn from(s: dispatch::QueueStats) -> Self {
        Self {
            total: count(s.total),
            high_priority: count(s.high),
            medium_priority: count(s.medium),
            low_priority: count(s.low),
            light: count(s.light),
            medium_weight: count(s.medium_weight),
            heavy: count(s.heavy),
            total_weight: s.total_weight,
        }
    }
}

/// Fleet status and battery breakdown
#[derive(Debug, Clone, SimpleObject)]
pub struct FleetStats {
    pub total: i32,
    pub idle: i32,
    pub flying: i32,
    pub delivering: i32,
    pub charging: i32,
    pub low_battery: i32,
    pub maintenance: i32,
    pub available: i32,
    /// Battery above 50%
    pub battery_healthy: i32,
    /// Battery in (20%, 50%]
    pub battery_medium: i32,
    /// Battery at or below 20%
    pub battery_critical: i32,
    pub average_battery: f64,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub total_deliveries: i32,
}

impl From<dispatch::FleetStats> for FleetStats {
    fn from(s: dispatch::FleetStats) -> Self {
        Self {
            total: count(s.total),
            idle: count(s.idle),
            flying: count(s.flying),
            delivering: count(s.delivering),
            charging: count(s.charging),
            low_battery: count(s.low_battery),
            maintenance: count(s.maintenance),
            available: count(s.available),
            battery_healthy: count(s.battery_healthy),
            battery_medium: count(s.battery_medium),
            battery_critical: count(s.battery_critical),
            average_battery: s.average_battery,
            total_capacity: s.total_capacity,
            used_capacity: s.used_capacity,
            total_deliveries: i32::try_from(s.total_deliveries).unwrap_or(i32::MAX),
        }
    }
}

/// Delivery outcome breakdown
#[derive(Debug, Clone, SimpleObject)]
pub struct DeliveryStats {
    pub total: i32,
    pub pending: i32,
    pub in_transit: i32,
    pub delivered: i32,
    pub cancelled: i32,
    pub failed: i32,
    /// Mean actual minutes over delivered records
    pub average_time: f64,
    pub total_distance: f64,
}

impl From<dispatch::DeliveryStats> for DeliveryStats {
    fn from(s: dispatch::DeliveryStats) -> Self {
        Self {
            total: count(s.total),
            pending: count(s.pending),
            in_transit: count(s.in_transit),
            delivered: count(s.delivered),
            cancelled: count(s.cancelled),
            failed: count(s.failed),
            average_time: s.average_time,
            total_distance: s.total_distance,
        }
    }
}

/// Headline counters
#[derive(Debug, Clone, SimpleObject)]
pub struct Overview {
    pub orders_total: i32,
    pub orders_pending: i32,
    pub orders_delivered: i32,
    pub drones_total: i32,
    pub drones_available: i32,
    pub deliveries_total: i32,
    pub routes_total: i32,
    pub selection_policy: SelectionPolicy,
}

impl Overview {
    pub fn new(o: dispatch::Overview, policy: dispatch::SelectionPolicy) -> Self {
        Self {
            orders_total: count(o.orders_total),
            orders_pending: count(o.orders_pending),
            orders_delivered: count(o.orders_delivered),
            drones_total: count(o.drones_total),
            drones_available: count(o.drones_available),
            deliveries_total: count(o.deliveries_total),
            routes_total: count(o.routes_total),
            selection_policy: policy.into(),
        }
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Fleet change notification
#[derive(Debug, Clone, SimpleObject)]
pub struct FleetEvent {
    pub event_type: FleetEventType,
    pub order_id: Option<ID>,
    pub drone_id: Option<ID>,
    pub delivery_id: Option<ID>,
    pub route_id: Option<ID>,
    /// New status of the affected entity, lower snake case
    pub status: Option<String>,
    pub battery: Option<f64>,
    pub position: Option<Position>,
    pub stops: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl FleetEvent {
    fn empty(event_type: FleetEventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type,
            order_id: None,
            drone_id: None,
            delivery_id: None,
            route_id: None,
            status: None,
            battery: None,
            position: None,
            stops: None,
            timestamp,
        }
    }
}

impl From<dispatch::FleetEvent> for FleetEvent {
    fn from(e: dispatch::FleetEvent) -> Self {
        use dispatch::FleetEventKind as K;

        let mut out = Self::empty(FleetEventType::from(&e.kind), e.at);
        match e.kind {
            K::OrderCreated { order_id } => out.order_id = Some(id_of(order_id)),
            K::OrderStatusChanged { order_id, status } => {
                out.order_id = Some(id_of(order_id));
                out.status = Some(status.as_str().to_string());
            }
            K::OrderDispatched {
                order_id,
                drone_id,
                delivery_id,
            } => {
                out.order_id = Some(id_of(order_id));
                out.drone_id = Some(id_of(drone_id));
                out.delivery_id = Some(id_of(delivery_id));
            }
            K::DeliveryStatusChanged {
                delivery_id,
                order_id,
                drone_id,
                status,
            } => {
                out.delivery_id = Some(id_of(delivery_id));
                out.order_id = Some(id_of(order_id));
                out.drone_id = Some(id_of(drone_id));
                out.status = Some(status.as_str().to_string());
            }
            K::DroneRegistered { drone_id } => out.drone_id = Some(id_of(drone_id)),
            K::DroneStatusChanged {
                drone_id,
                status,
                battery,
                position,
            } => {
                out.drone_id = Some(id_of(drone_id));
                out.status = Some(status.as_str().to_string());
                out.battery = Some(battery);
                out.position = Some(position.into());
            }
            K::RoutePlanned {
                route_id,
                drone_id,
                stops,
            } => {
                out.route_id = Some(id_of(route_id));
                out.drone_id = Some(id_of(drone_id));
                out.stops = Some(count(stops));
            }
            K::RouteStatusChanged { route_id, status } => {
                out.route_id = Some(id_of(route_id));
                out.status = Some(status.as_str().to_string());
            }
        }
        out
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Paginated list wrapper
#[derive(Debug, Clone, SimpleObject)]
#[graphql(concrete(name = "OrderConnection", params(Order)))]
#[graphql(concrete(name = "DroneConnection", params(Drone)))]
#[graphql(concrete(name = "DeliveryConnection", params(Delivery)))]
#[graphql(concrete(name = "RouteConnection", params(Route)))]
pub struct Connection<T: OutputType> {
    /// Items in this page
    pub items: Vec<T>,
    /// Total count across all pages
    pub total_count: i32,
    /// Has more pages
    pub has_next_page: bool,
    /// Has previous pages
    pub has_previous_page: bool,
}

impl<T: OutputType> Connection<T> {
    /// Slice one page out of a full, ordered result set
    pub fn paginate<D>(all: Vec<D>, page: &PaginationInput) -> Self
    where
        T: From<D>,
    {
        let total = all.len();
        let offset = usize::try_from(page.offset).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        let items: Vec<T> = all.into_iter().skip(offset).take(limit).map(T::from).collect();

        Self {
            has_next_page: offset + items.len() < total,
            has_previous_page: offset > 0,
            total_count: count(total),
            items,
        }
    }
}
