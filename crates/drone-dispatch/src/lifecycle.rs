//! # Delivery Lifecycle
//!
//! State transitions that span orders, drones and deliveries.
//!
//! Every function takes exclusive access to the store, reads and validates
//! everything it needs first, then writes. An error return leaves the store
//! exactly as it was, so callers holding a write lock get all-or-nothing
//! semantics per call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drone_domain::{
    Delivery, DeliveryId, DeliveryStatus, Drone, DroneId, DroneStatus, FULL_BATTERY, NewDrone,
    NewOrder, Order, OrderId, OrderStatus, OrderUpdate, Position, Route, RouteId, RouteStatus,
    RouteStop, StatusMachine,
};
use drone_persistence::{EntityStore, Repository};

use crate::cost::{self, CRITICAL_BATTERY_PCT, DISPATCH_MIN_BATTERY, LOW_BATTERY_PCT};
use crate::error::{DispatchError, NO_ELIGIBLE_DRONE, Result};
use crate::selector::SelectionPolicy;

/// Order, drone and delivery as committed by one lifecycle step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub order: Order,
    pub drone: Drone,
    pub delivery: Delivery,
}

/// Operator action on a drone's battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryAction {
    /// Instant full charge; the drone returns to idle
    Charge,
    /// Park the drone on a charger
    Dock,
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Insert a pending order
pub fn create_order<S: EntityStore>(
    store: &mut S,
    spec: NewOrder,
    now: DateTime<Utc>,
) -> Result<Order> {
    let order = Order::new(store.next_order_id(), spec, now);
    store.orders_mut().insert(order.clone())?;
    Ok(order)
}

/// Insert an idle, fully charged drone at the depot
pub fn register_drone<S: EntityStore>(
    store: &mut S,
    spec: NewDrone,
    now: DateTime<Utc>,
) -> Result<Drone> {
    let drone = Drone::new(store.next_drone_id(), spec, now);
    store.drones_mut().insert(drone.clone())?;
    Ok(drone)
}

// =============================================================================
// ORDER MAINTENANCE
// =============================================================================

/// Edit priority or description of a pending order
pub fn update_order<S: EntityStore>(
    store: &mut S,
    order_id: OrderId,
    update: OrderUpdate,
    now: DateTime<Utc>,
) -> Result<Order> {
    let mut order = store.orders().require(order_id)?.clone();
    if order.status != OrderStatus::Pending {
        return Err(DispatchError::invalid_state(format!(
            "order {order_id} is {} and can no longer be edited",
            order.status.as_str()
        )));
    }
    if let Some(priority) = update.priority {
        order.priority = priority;
    }
    if let Some(description) = update.description {
        order.description = Some(description);
    }
    order.updated_at = now;
    store.orders_mut().save(order.clone())?;
    Ok(order)
}

/// Remove an order that no drone is carrying
pub fn delete_order<S: EntityStore>(store: &mut S, order_id: OrderId) -> Result<Order> {
    let order = store.orders().require(order_id)?;
    if matches!(order.status, OrderStatus::Assigned | OrderStatus::InTransit) {
        return Err(DispatchError::invalid_state(format!(
            "order {order_id} is {}; cancel it first",
            order.status.as_str()
        )));
    }
    Ok(store.orders_mut().remove(order_id)?)
}

/// Cancel a pending or assigned order.
///
/// An assigned order also cancels its open delivery and frees the drone.
pub fn cancel_order<S: EntityStore>(
    store: &mut S,
    order_id: OrderId,
    now: DateTime<Utc>,
) -> Result<Order> {
    let mut order = store.orders().require(order_id)?.clone();
    order.status.transition_to(OrderStatus::Cancelled)?;

    let open = store
        .deliveries()
        .list_where(&|d| d.order_id == order_id && d.status == DeliveryStatus::Pending);
    if let Some(delivery) = open.first() {
        return cancel_delivery(store, delivery.id, now).map(|outcome| outcome.order);
    }

    order.status = OrderStatus::Cancelled;
    order.updated_at = now;
    if let Some(drone_id) = order.assigned_drone.take()
        && let Some(drone) = store.drones().get(drone_id)
    {
        let mut drone = drone.clone();
        release_order(store, &mut drone, order_id, now);
        store.drones_mut().save(drone)?;
    }
    store.orders_mut().save(order.clone())?;
    Ok(order)
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Assign a pending order to a drone and open its delivery record.
///
/// With `drone_id` the named drone is used after checking it is idle,
/// charged and has room; otherwise `policy` picks among the fleet.
pub fn dispatch_order<S: EntityStore>(
    store: &mut S,
    order_id: OrderId,
    drone_id: Option<DroneId>,
    policy: SelectionPolicy,
    now: DateTime<Utc>,
) -> Result<DeliveryOutcome> {
    let mut order = store.orders().require(order_id)?.clone();
    if order.status != OrderStatus::Pending {
        return Err(DispatchError::invalid_state(format!(
            "order {order_id} is {}, not pending",
            order.status.as_str()
        )));
    }

    let mut drone = match drone_id {
        Some(id) => requested_drone(store, id, &order)?,
        None => {
            let fleet = store.drones().list_all();
            policy
                .select(&order, &fleet)
                .cloned()
                .ok_or_else(|| DispatchError::infeasible(NO_ELIGIBLE_DRONE))?
        }
    };

    let distance = cost::distance(&drone.position, &order.location);
    let estimated_time = cost::flight_time(&drone, &order.location);

    order.status = order.status.transition_to(OrderStatus::Assigned)?;
    order.assigned_drone = Some(drone.id);
    order.assigned_at = Some(now);
    order.updated_at = now;

    drone.status = DroneStatus::Flying;
    drone.assigned_orders.insert(order.id);
    drone.current_load += order.weight;
    drone.updated_at = now;

    let delivery = Delivery {
        id: store.next_delivery_id(),
        order_id: order.id,
        drone_id: drone.id,
        status: DeliveryStatus::Pending,
        distance,
        estimated_time,
        start_time: None,
        delivered_at: None,
        actual_time: None,
        created_at: now,
        updated_at: now,
    };

    store.orders_mut().save(order.clone())?;
    store.drones_mut().save(drone.clone())?;
    store.deliveries_mut().insert(delivery.clone())?;

    tracing::info!(
        order_id = %order.id,
        drone_id = %drone.id,
        delivery_id = %delivery.id,
        distance,
        estimated_time,
        "order dispatched"
    );
    Ok(DeliveryOutcome {
        order,
        drone,
        delivery,
    })
}

fn requested_drone<S: EntityStore>(store: &S, drone_id: DroneId, order: &Order) -> Result<Drone> {
    let drone = store.drones().require(drone_id)?;
    if drone.status != DroneStatus::Idle {
        return Err(DispatchError::invalid_state(format!(
            "drone {drone_id} is {}, not idle",
            drone.status.as_str()
        )));
    }
    if drone.battery < DISPATCH_MIN_BATTERY {
        return Err(DispatchError::invalid_state(format!(
            "drone {drone_id} battery {:.1}% is below {DISPATCH_MIN_BATTERY}%",
            drone.battery
        )));
    }
    if drone.current_load + order.weight > drone.capacity {
        return Err(DispatchError::infeasible(format!(
            "order weight {:.1} exceeds drone {drone_id} free capacity {:.1}",
            order.weight,
            drone.remaining_capacity()
        )));
    }
    Ok(drone.clone())
}

// =============================================================================
// DELIVERY PROGRESS
// =============================================================================

/// Mark a pending delivery as in transit and stamp its start time
pub fn start_delivery<S: EntityStore>(
    store: &mut S,
    delivery_id: DeliveryId,
    now: DateTime<Utc>,
) -> Result<DeliveryOutcome> {
    let (mut delivery, mut order, mut drone) =
        load_delivery(store, delivery_id, DeliveryStatus::InTransit)?;

    order.status = order.status.transition_to(OrderStatus::InTransit)?;

    delivery.start_time = Some(now);
    delivery.updated_at = now;
    order.updated_at = now;
    if drone.status == DroneStatus::Flying {
        drone.status = DroneStatus::Delivering;
        drone.updated_at = now;
    }

    commit(store, order, drone, delivery)
}

/// Close a delivery as delivered.
///
/// Records the actual time (minutes since start, 0 if never started),
/// marks the order delivered and frees the drone's capacity. Completing an
/// already closed delivery is rejected.
pub fn complete_delivery<S: EntityStore>(
    store: &mut S,
    delivery_id: DeliveryId,
    now: DateTime<Utc>,
) -> Result<DeliveryOutcome> {
    let (mut delivery, mut order, mut drone) =
        load_delivery(store, delivery_id, DeliveryStatus::Delivered)?;

    order.status = order.status.transition_to(OrderStatus::Delivered)?;

    delivery.actual_time = Some(
        delivery
            .start_time
            .map_or(0.0, |start| elapsed_minutes(start, now)),
    );
    delivery.delivered_at = Some(now);
    delivery.updated_at = now;

    order.delivered_at = Some(now);
    order.updated_at = now;

    release_order(store, &mut drone, order.id, now);
    drone.total_deliveries += 1;

    let outcome = commit(store, order, drone, delivery)?;
    tracing::info!(
        delivery_id = %outcome.delivery.id,
        order_id = %outcome.order.id,
        drone_id = %outcome.drone.id,
        actual_time = outcome.delivery.actual_time,
        "delivery completed"
    );
    Ok(outcome)
}

/// Fail an in-transit delivery; the order goes back to the queue
pub fn fail_delivery<S: EntityStore>(
    store: &mut S,
    delivery_id: DeliveryId,
    now: DateTime<Utc>,
) -> Result<DeliveryOutcome> {
    let (mut delivery, mut order, mut drone) =
        load_delivery(store, delivery_id, DeliveryStatus::Failed)?;

    order.status = order.status.transition_to(OrderStatus::Pending)?;

    delivery.updated_at = now;
    order.assigned_drone = None;
    order.assigned_at = None;
    order.updated_at = now;
    release_order(store, &mut drone, order.id, now);

    tracing::warn!(
        delivery_id = %delivery.id,
        order_id = %order.id,
        "delivery failed, order requeued"
    );
    commit(store, order, drone, delivery)
}

/// Cancel a delivery that has not started, together with its order
pub fn cancel_delivery<S: EntityStore>(
    store: &mut S,
    delivery_id: DeliveryId,
    now: DateTime<Utc>,
) -> Result<DeliveryOutcome> {
    let (mut delivery, mut order, mut drone) =
        load_delivery(store, delivery_id, DeliveryStatus::Cancelled)?;

    order.status = order.status.transition_to(OrderStatus::Cancelled)?;

    delivery.updated_at = now;
    order.assigned_drone = None;
    order.updated_at = now;
    release_order(store, &mut drone, order.id, now);

    commit(store, order, drone, delivery)
}

/// Load a delivery moved to `next`, with its order and drone.
///
/// The transition is checked before the order and drone are resolved, so a
/// closed delivery reports its state even after those records are deleted.
fn load_delivery<S: EntityStore>(
    store: &S,
    delivery_id: DeliveryId,
    next: DeliveryStatus,
) -> Result<(Delivery, Order, Drone)> {
    let mut delivery = store.deliveries().require(delivery_id)?.clone();
    delivery.status = delivery.status.transition_to(next)?;
    let order = store.orders().require(delivery.order_id)?.clone();
    let drone = store.drones().require(delivery.drone_id)?.clone();
    Ok((delivery, order, drone))
}

fn commit<S: EntityStore>(
    store: &mut S,
    order: Order,
    drone: Drone,
    delivery: Delivery,
) -> Result<DeliveryOutcome> {
    store.orders_mut().save(order.clone())?;
    store.drones_mut().save(drone.clone())?;
    store.deliveries_mut().save(delivery.clone())?;
    Ok(DeliveryOutcome {
        order,
        drone,
        delivery,
    })
}

/// Drop `order_id` from the drone and settle its load and status.
///
/// Load is recomputed from the orders still carried. Dispatch-driven
/// statuses settle to idle or flying; battery and maintenance statuses
/// are left for the operator.
fn release_order<S: EntityStore>(
    store: &S,
    drone: &mut Drone,
    order_id: OrderId,
    now: DateTime<Utc>,
) {
    drone.assigned_orders.remove(&order_id);
    drone.current_load = drone
        .assigned_orders
        .iter()
        .filter_map(|id| store.orders().get(*id))
        .map(|o| o.weight)
        .sum();
    if drone.status.is_airborne() || drone.status == DroneStatus::Idle {
        drone.status = if drone.assigned_orders.is_empty() {
            DroneStatus::Idle
        } else {
            DroneStatus::Flying
        };
    }
    drone.updated_at = now;
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 60_000.0).max(0.0)
}

// =============================================================================
// DRONE STATE
// =============================================================================

/// Fly a drone to `to`, draining battery and range.
///
/// Battery at or below 20% flags `low_battery`; at or below 5% the drone is
/// forced onto a charger.
pub fn move_drone<S: EntityStore>(
    store: &mut S,
    drone_id: DroneId,
    to: Position,
    now: DateTime<Utc>,
) -> Result<Drone> {
    let mut drone = store.drones().require(drone_id)?.clone();

    let distance = cost::distance(&drone.position, &to);
    let drain = cost::battery_consumption(&drone, distance);
    let before = drone.status;

    drone.battery = (drone.battery - drain).max(0.0);
    drone.current_range = (drone.current_range - distance).max(0.0);
    drone.total_flight_time += cost::leg_time(distance);
    drone.position = to;

    if drone.battery <= LOW_BATTERY_PCT && drone.status != DroneStatus::Charging {
        drone.status = DroneStatus::LowBattery;
    }
    if drone.battery <= CRITICAL_BATTERY_PCT {
        drone.status = DroneStatus::Charging;
    }
    drone.updated_at = now;

    if drone.status != before {
        tracing::warn!(
            drone_id = %drone.id,
            battery = drone.battery,
            status = drone.status.as_str(),
            "battery threshold crossed"
        );
    }
    tracing::debug!(
        drone_id = %drone.id,
        position = %drone.position,
        battery = drone.battery,
        status = drone.status.as_str(),
        "drone moved"
    );
    store.drones_mut().save(drone.clone())?;
    Ok(drone)
}

/// Charge or dock a drone that is on the ground with nothing aboard
pub fn battery_action<S: EntityStore>(
    store: &mut S,
    drone_id: DroneId,
    action: BatteryAction,
    now: DateTime<Utc>,
) -> Result<Drone> {
    let mut drone = store.drones().require(drone_id)?.clone();
    ensure_grounded(&drone)?;

    match action {
        BatteryAction::Charge => {
            drone.battery = FULL_BATTERY;
            drone.current_range = drone.range;
            drone.status = DroneStatus::Idle;
        }
        BatteryAction::Dock => drone.status = DroneStatus::Charging,
    }
    drone.updated_at = now;
    store.drones_mut().save(drone.clone())?;
    Ok(drone)
}

/// Operator status override.
///
/// Flying and delivering are owned by dispatch and cannot be set directly.
pub fn set_drone_status<S: EntityStore>(
    store: &mut S,
    drone_id: DroneId,
    status: DroneStatus,
    now: DateTime<Utc>,
) -> Result<Drone> {
    let mut drone = store.drones().require(drone_id)?.clone();
    match status {
        DroneStatus::Maintenance | DroneStatus::LowBattery => {}
        DroneStatus::Idle | DroneStatus::Charging => ensure_grounded(&drone)?,
        DroneStatus::Flying | DroneStatus::Delivering => {
            return Err(DispatchError::invalid_state(format!(
                "status {} is set by dispatch",
                status.as_str()
            )));
        }
    }
    drone.status = status;
    drone.updated_at = now;
    store.drones_mut().save(drone.clone())?;
    Ok(drone)
}

/// Remove an idle drone
pub fn delete_drone<S: EntityStore>(store: &mut S, drone_id: DroneId) -> Result<Drone> {
    let drone = store.drones().require(drone_id)?;
    if drone.status != DroneStatus::Idle || !drone.assigned_orders.is_empty() {
        return Err(DispatchError::invalid_state(format!(
            "drone {drone_id} is {}; only idle drones can be removed",
            drone.status.as_str()
        )));
    }
    Ok(store.drones_mut().remove(drone_id)?)
}

fn ensure_grounded(drone: &Drone) -> Result<()> {
    if drone.status.is_airborne() {
        return Err(DispatchError::invalid_state(format!(
            "drone {} is {}",
            drone.id,
            drone.status.as_str()
        )));
    }
    if !drone.assigned_orders.is_empty() {
        return Err(DispatchError::invalid_state(format!(
            "drone {} still carries {} order(s)",
            drone.id,
            drone.assigned_orders.len()
        )));
    }
    Ok(())
}

// =============================================================================
// ROUTES
// =============================================================================

/// Persist a planned route
pub fn create_route<S: EntityStore>(
    store: &mut S,
    drone_id: DroneId,
    stops: Vec<RouteStop>,
    now: DateTime<Utc>,
) -> Result<Route> {
    let route = Route::planned(store.next_route_id(), drone_id, stops, now);
    store.routes_mut().insert(route.clone())?;
    Ok(route)
}

/// Move a route through planned -> active -> completed, or cancel it
pub fn set_route_status<S: EntityStore>(
    store: &mut S,
    route_id: RouteId,
    status: RouteStatus,
    now: DateTime<Utc>,
) -> Result<Route> {
    let mut route = store.routes().require(route_id)?.clone();
    route.status = route.status.transition_to(status)?;
    match status {
        RouteStatus::Active => route.started_at = Some(now),
        RouteStatus::Completed => route.completed_at = Some(now),
        RouteStatus::Planned | RouteStatus::Cancelled => {}
    }
    route.updated_at = now;
    store.routes_mut().save(route.clone())?;
    Ok(route)
}
