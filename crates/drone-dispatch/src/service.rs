//! # Dispatch Service
//!
//! Async facade over the entity store. All engine state lives behind one
//! `tokio::sync::RwLock`:
//!
//! - every mutating operation takes the write lock for exactly one atomic
//!   unit (one dispatch, one completion, one route)
//! - reads take the read lock and return owned copies
//! - batch operations snapshot their work list under a read lock, then
//!   commit each item under its own write lock, re-validating it there
//!
//! Committed changes are published as [`FleetEvent`]s on a broadcast channel.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};

use drone_domain::{
    Delivery, DeliveryFilter, DeliveryId, DeliveryStatus, Drone, DroneFilter, DroneId, DroneStatus,
    NewDrone, NewOrder, Order, OrderFilter, OrderId, OrderStatus, OrderUpdate, Position, Priority,
    Route, RouteFilter, RouteId, RouteStatus, validate_position,
};
use drone_persistence::{EntityStore, InMemoryStore, Repository};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::events::{FleetEvent, FleetEventKind};
use crate::lifecycle::{self, BatteryAction, DeliveryOutcome};
use crate::planner;
use crate::queue::{self, QueueEntry};
use crate::selector::SelectionPolicy;
use crate::stats::{self, DeliveryStats, FleetStats, Overview, QueueStats};

// =============================================================================
// RESULT TYPES
// =============================================================================

/// An order the batch could not place, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub order: Order,
    pub reason: String,
}

/// Result of draining the queue
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<DeliveryOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

/// Routes planned across the idle fleet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetPlan {
    pub routes: Vec<Route>,
    pub drones_considered: usize,
    pub pending_orders: usize,
    pub total_distance: f64,
    pub total_weight: f64,
}

/// Operator update to one drone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DroneCommand {
    MoveTo(Position),
    Battery(BatteryAction),
    SetStatus(DroneStatus),
}

// =============================================================================
// SERVICE
// =============================================================================

/// Dispatch engine shared across tasks
pub struct DispatchService<S: EntityStore = InMemoryStore> {
    store: Arc<RwLock<S>>,
    config: DispatchConfig,
    events: broadcast::Sender<FleetEvent>,
}

impl<S: EntityStore> Clone for DispatchService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
            events: self.events.clone(),
        }
    }
}

impl DispatchService<InMemoryStore> {
    /// Service over a fresh in-memory store
    #[must_use]
    pub fn in_memory(config: DispatchConfig) -> Self {
        Self::new(InMemoryStore::new(), config)
    }
}

impl<S: EntityStore> DispatchService<S> {
    pub fn new(store: S, config: DispatchConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        tracing::info!(policy = %config.policy, "dispatch service ready");
        Self {
            store: Arc::new(RwLock::new(store)),
            config,
            events,
        }
    }

    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub const fn policy(&self) -> SelectionPolicy {
        self.config.policy
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }

    fn emit(&self, kind: FleetEventKind) {
        if self.events.send(FleetEvent::new(kind, Utc::now())).is_err() {
            tracing::trace!("no event subscribers");
        }
    }

    fn emit_outcome(&self, outcome: &DeliveryOutcome) {
        self.emit(FleetEventKind::DeliveryStatusChanged {
            delivery_id: outcome.delivery.id,
            order_id: outcome.order.id,
            drone_id: outcome.drone.id,
            status: outcome.delivery.status,
        });
        self.emit_drone(&outcome.drone);
    }

    fn emit_drone(&self, drone: &Drone) {
        self.emit(FleetEventKind::DroneStatusChanged {
            drone_id: drone.id,
            status: drone.status,
            battery: drone.battery,
            position: drone.position,
        });
    }

    // =========================================================================
    // ORDERS
    // =========================================================================

    /// Validate and enqueue a new order
    pub async fn create_order(&self, spec: NewOrder) -> Result<Order> {
        spec.validate()?;
        let order = {
            let mut store = self.store.write().await;
            lifecycle::create_order(&mut *store, spec, Utc::now())?
        };
        tracing::info!(
            order_id = %order.id,
            location = %order.location,
            weight = order.weight,
            priority = order.priority.as_str(),
            "order created"
        );
        self.emit(FleetEventKind::OrderCreated { order_id: order.id });
        Ok(order)
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        Ok(self.store.read().await.orders().require(id)?.clone())
    }

    pub async fn list_orders(&self, filter: OrderFilter) -> Vec<Order> {
        self.store
            .read()
            .await
            .orders()
            .list_where(&|o| filter.matches(o))
    }

    pub async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<Order> {
        let mut store = self.store.write().await;
        lifecycle::update_order(&mut *store, id, update, Utc::now())
    }

    pub async fn delete_order(&self, id: OrderId) -> Result<Order> {
        let order = {
            let mut store = self.store.write().await;
            lifecycle::delete_order(&mut *store, id)?
        };
        tracing::info!(order_id = %id, "order deleted");
        Ok(order)
    }

    pub async fn cancel_order(&self, id: OrderId) -> Result<Order> {
        let order = {
            let mut store = self.store.write().await;
            lifecycle::cancel_order(&mut *store, id, Utc::now())?
        };
        tracing::info!(order_id = %id, "order cancelled");
        self.emit(FleetEventKind::OrderStatusChanged {
            order_id: id,
            status: OrderStatus::Cancelled,
        });
        Ok(order)
    }

    // =========================================================================
    // DRONES
    // =========================================================================

    /// Validate and register a new drone at the depot
    pub async fn register_drone(&self, spec: NewDrone) -> Result<Drone> {
        spec.validate()?;
        let drone = {
            let mut store = self.store.write().await;
            lifecycle::register_drone(&mut *store, spec, Utc::now())?
        };
        tracing::info!(
            drone_id = %drone.id,
            name = %drone.name,
            capacity = drone.capacity,
            range = drone.range,
            "drone registered"
        );
        self.emit(FleetEventKind::DroneRegistered { drone_id: drone.id });
        Ok(drone)
    }

    pub async fn get_drone(&self, id: DroneId) -> Result<Drone> {
        Ok(self.store.read().await.drones().require(id)?.clone())
    }

    pub async fn list_drones(&self, filter: DroneFilter) -> Vec<Drone> {
        self.store
            .read()
            .await
            .drones()
            .list_where(&|d| filter.matches(d))
    }

    /// Orders the drone is currently carrying
    pub async fn drone_orders(&self, id: DroneId) -> Result<Vec<Order>> {
        let store = self.store.read().await;
        let drone = store.drones().require(id)?;
        Ok(drone
            .assigned_orders
            .iter()
            .filter_map(|order_id| store.orders().get(*order_id).cloned())
            .collect())
    }

    pub async fn delete_drone(&self, id: DroneId) -> Result<Drone> {
        let drone = {
            let mut store = self.store.write().await;
            lifecycle::delete_drone(&mut *store, id)?
        };
        tracing::info!(drone_id = %id, "drone removed");
        Ok(drone)
    }

    /// Apply a position, battery or status update
    pub async fn update_drone(&self, id: DroneId, command: DroneCommand) -> Result<Drone> {
        if let DroneCommand::MoveTo(position) = command {
            validate_position("position", &position)?;
        }
        let drone = {
            let mut store = self.store.write().await;
            let now = Utc::now();
            match command {
                DroneCommand::MoveTo(position) => {
                    lifecycle::move_drone(&mut *store, id, position, now)?
                }
                DroneCommand::Battery(action) => {
                    lifecycle::battery_action(&mut *store, id, action, now)?
                }
                DroneCommand::SetStatus(status) => {
                    lifecycle::set_drone_status(&mut *store, id, status, now)?
                }
            }
        };
        self.emit_drone(&drone);
        Ok(drone)
    }

    pub async fn move_drone(&self, id: DroneId, to: Position) -> Result<Drone> {
        self.update_drone(id, DroneCommand::MoveTo(to)).await
    }

    pub async fn charge_drone(&self, id: DroneId) -> Result<Drone> {
        self.update_drone(id, DroneCommand::Battery(BatteryAction::Charge))
            .await
    }

    // =========================================================================
    // QUEUE & DISPATCH
    // =========================================================================

    /// Pending orders in service order
    pub async fn queue(&self) -> Vec<Order> {
        queue::order_queue(self.store.read().await.orders().list_all())
    }

    /// Queue with per-order drone recommendations
    pub async fn queue_view(&self, priority: Option<Priority>) -> Vec<QueueEntry> {
        let store = self.store.read().await;
        let pending = queue::order_queue(store.orders().list_all());
        let drones = store.drones().list_all();
        queue::annotate(pending, &drones, self.config.policy, priority)
    }

    /// Dispatch one order, optionally to a named drone
    pub async fn dispatch(
        &self,
        order_id: OrderId,
        drone_id: Option<DroneId>,
    ) -> Result<DeliveryOutcome> {
        let outcome = {
            let mut store = self.store.write().await;
            let policy = self.config.policy;
            lifecycle::dispatch_order(&mut *store, order_id, drone_id, policy, Utc::now())?
        };
        self.emit(FleetEventKind::OrderDispatched {
            order_id: outcome.order.id,
            drone_id: outcome.drone.id,
            delivery_id: outcome.delivery.id,
        });
        self.emit_drone(&outcome.drone);
        Ok(outcome)
    }

    /// Dispatch the head of the queue
    pub async fn process_next(&self) -> Result<DeliveryOutcome> {
        let head = {
            let store = self.store.read().await;
            queue::order_queue(store.orders().list_all()).into_iter().next()
        };
        let Some(order) = head else {
            return Err(DispatchError::infeasible("queue is empty"));
        };
        self.dispatch(order.id, None).await
    }

    /// Attempt every pending order once, in queue order.
    ///
    /// Each order commits under its own write lock, so earlier assignments
    /// shape later ones and concurrent callers interleave between orders.
    pub async fn dispatch_all(&self) -> Result<BatchReport> {
        let snapshot = self.queue().await;
        let mut report = BatchReport::default();

        for order in snapshot {
            match self.dispatch(order.id, None).await {
                Ok(outcome) => report.processed.push(outcome),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    tracing::warn!(order_id = %order.id, reason = %err, "order left in queue");
                    report.failed.push(BatchFailure {
                        reason: err.reason(),
                        order,
                    });
                }
            }
        }

        tracing::info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            "queue drained"
        );
        Ok(report)
    }

    // =========================================================================
    // DELIVERIES
    // =========================================================================

    pub async fn get_delivery(&self, id: DeliveryId) -> Result<Delivery> {
        Ok(self.store.read().await.deliveries().require(id)?.clone())
    }

    pub async fn list_deliveries(&self, filter: DeliveryFilter) -> Vec<Delivery> {
        self.store
            .read()
            .await
            .deliveries()
            .list_where(&|d| filter.matches(d))
    }

    /// Move a delivery forward: in transit, delivered or failed
    pub async fn advance_delivery(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
    ) -> Result<DeliveryOutcome> {
        let outcome = {
            let mut store = self.store.write().await;
            let now = Utc::now();
            match status {
                DeliveryStatus::InTransit => lifecycle::start_delivery(&mut *store, id, now)?,
                DeliveryStatus::Delivered => lifecycle::complete_delivery(&mut *store, id, now)?,
                DeliveryStatus::Failed => lifecycle::fail_delivery(&mut *store, id, now)?,
                DeliveryStatus::Cancelled => lifecycle::cancel_delivery(&mut *store, id, now)?,
                DeliveryStatus::Pending => {
                    return Err(DispatchError::invalid_state("deliveries cannot return to pending"));
                }
            }
        };
        self.emit_outcome(&outcome);
        Ok(outcome)
    }

    pub async fn start_delivery(&self, id: DeliveryId) -> Result<DeliveryOutcome> {
        self.advance_delivery(id, DeliveryStatus::InTransit).await
    }

    pub async fn complete_delivery(&self, id: DeliveryId) -> Result<DeliveryOutcome> {
        self.advance_delivery(id, DeliveryStatus::Delivered).await
    }

    pub async fn fail_delivery(&self, id: DeliveryId) -> Result<DeliveryOutcome> {
        self.advance_delivery(id, DeliveryStatus::Failed).await
    }

    pub async fn cancel_delivery(&self, id: DeliveryId) -> Result<DeliveryOutcome> {
        self.advance_delivery(id, DeliveryStatus::Cancelled).await
    }

    // =========================================================================
    // ROUTES
    // =========================================================================

    /// Plan and persist a route for one drone.
    ///
    /// Without `order_ids` every pending order is a candidate, in queue
    /// order. With `optimize` off, stops keep the candidate order.
    pub async fn plan_route(
        &self,
        drone_id: DroneId,
        order_ids: Option<Vec<OrderId>>,
        optimize: bool,
    ) -> Result<Route> {
        let route = {
            let mut store = self.store.write().await;
            let drone = store.drones().require(drone_id)?.clone();
            let candidates = match order_ids {
                Some(ids) => requested_orders(&*store, &ids)?,
                None => queue::order_queue(store.orders().list_all()),
            };

            let stops = if optimize {
                planner::plan_route(&drone, &candidates)
            } else {
                planner::plan_in_order(&drone, &candidates)
            };
            if stops.is_empty() {
                return Err(DispatchError::infeasible(format!(
                    "no candidate order fits drone {drone_id}"
                )));
            }
            lifecycle::create_route(&mut *store, drone_id, stops, Utc::now())?
        };

        tracing::info!(
            route_id = %route.id,
            drone_id = %drone_id,
            stops = route.stops.len(),
            total_distance = route.total_distance,
            "route planned"
        );
        self.emit(FleetEventKind::RoutePlanned {
            route_id: route.id,
            drone_id,
            stops: route.stops.len(),
        });
        Ok(route)
    }

    /// Plan a greedy route for every idle drone over the pending orders.
    ///
    /// Every drone plans against the full pending pool, so routes may
    /// overlap; reconciling them is up to the caller. Drones whose plan
    /// comes out empty are skipped. Each drone is planned and committed
    /// under its own write lock against fresh state.
    pub async fn optimize_fleet(&self) -> Result<FleetPlan> {
        let (idle, pending_orders) = {
            let store = self.store.read().await;
            let idle: Vec<DroneId> = store
                .drones()
                .list_where(&|d| d.status == DroneStatus::Idle)
                .into_iter()
                .map(|d| d.id)
                .collect();
            let pending = store
                .orders()
                .list_where(&|o| o.status == OrderStatus::Pending)
                .len();
            (idle, pending)
        };

        let mut plan = FleetPlan {
            drones_considered: idle.len(),
            pending_orders,
            ..FleetPlan::default()
        };

        for drone_id in idle {
            let route = {
                let mut store = self.store.write().await;
                let Some(drone) = store.drones().get(drone_id).cloned() else {
                    continue;
                };
                if drone.status != DroneStatus::Idle {
                    continue;
                }
                let pending = store
                    .orders()
                    .list_where(&|o| o.status == OrderStatus::Pending);
                let stops = planner::plan_route(&drone, &pending);
                if stops.is_empty() {
                    continue;
                }
                lifecycle::create_route(&mut *store, drone_id, stops, Utc::now())?
            };
            self.emit(FleetEventKind::RoutePlanned {
                route_id: route.id,
                drone_id,
                stops: route.stops.len(),
            });
            plan.total_distance += route.total_distance;
            plan.total_weight += route.total_weight;
            plan.routes.push(route);
        }

        tracing::info!(
            drones = plan.drones_considered,
            routes = plan.routes.len(),
            total_distance = plan.total_distance,
            "fleet routes optimized"
        );
        Ok(plan)
    }

    pub async fn get_route(&self, id: RouteId) -> Result<Route> {
        Ok(self.store.read().await.routes().require(id)?.clone())
    }

    pub async fn list_routes(&self, filter: RouteFilter) -> Vec<Route> {
        self.store
            .read()
            .await
            .routes()
            .list_where(&|r| filter.matches(r))
    }

    pub async fn set_route_status(&self, id: RouteId, status: RouteStatus) -> Result<Route> {
        let route = {
            let mut store = self.store.write().await;
            lifecycle::set_route_status(&mut *store, id, status, Utc::now())?
        };
        self.emit(FleetEventKind::RouteStatusChanged {
            route_id: id,
            status: route.status,
        });
        Ok(route)
    }

    // =========================================================================
    // STATISTICS
    // =========================================================================

    pub async fn queue_stats(&self) -> QueueStats {
        stats::queue_stats(&self.queue().await)
    }

    pub async fn fleet_stats(&self) -> FleetStats {
        stats::fleet_stats(&self.store.read().await.drones().list_all())
    }

    pub async fn delivery_stats(&self) -> DeliveryStats {
        stats::delivery_stats(&self.store.read().await.deliveries().list_all())
    }

    pub async fn overview(&self) -> Overview {
        let store = self.store.read().await;
        let orders = store.orders().list_all();
        let drones = store.drones().list_all();
        Overview {
            orders_total: orders.len(),
            orders_pending: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
            orders_delivered: orders.iter().filter(|o| o.status == OrderStatus::Delivered).count(),
            drones_total: drones.len(),
            drones_available: drones.iter().filter(|d| stats::is_available(d)).count(),
            deliveries_total: store.deliveries().len(),
            routes_total: store.routes().len(),
        }
    }
}

/// Resolve caller-supplied order ids; every one must exist and be pending.
///
/// Repeated ids collapse onto their first occurrence.
fn requested_orders<S: EntityStore>(store: &S, ids: &[OrderId]) -> Result<Vec<Order>> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .map(|id| -> Result<Order> {
            let order = store.orders().require(*id)?;
            if order.status == OrderStatus::Pending {
                Ok(order.clone())
            } else {
                Err(DispatchError::invalid_state(format!(
                    "order {id} is {}, not pending",
                    order.status.as_str()
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn service() -> DispatchService {
        DispatchService::in_memory(DispatchConfig::default())
    }

    #[tokio::test]
    async fn test_events_follow_dispatch() {
        let svc = service();
        let mut rx = svc.subscribe();

        assert_ok!(svc.register_drone(NewDrone::new("Swift", 10.0, 20.0)).await);
        let order = assert_ok!(svc.create_order(NewOrder::new(2, 2, 1.0, Priority::High)).await);
        assert_ok!(svc.dispatch(order.id, None).await);

        let kinds: Vec<&'static str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec!["drone_registered", "order_created", "order_dispatched", "drone_status_changed"]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let svc = service();
        let err = svc
            .create_order(NewOrder::new(12, 0, 1.0, Priority::Low))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
        assert!(svc.list_orders(OrderFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_process_next_on_empty_queue() {
        let svc = service();
        let err = svc.process_next().await.unwrap_err();
        assert_eq!(err, DispatchError::Infeasible("queue is empty".into()));
    }

    #[tokio::test]
    async fn test_plan_route_with_explicit_orders() {
        let svc = service();
        let drone = assert_ok!(svc.register_drone(NewDrone::new("Merlin", 10.0, 30.0)).await);
        let far = assert_ok!(svc.create_order(NewOrder::new(6, 0, 1.0, Priority::Low)).await);
        let near = assert_ok!(svc.create_order(NewOrder::new(2, 0, 1.0, Priority::Low)).await);

        let greedy = assert_ok!(svc.plan_route(drone.id, Some(vec![far.id, near.id]), true).await);
        assert_eq!(greedy.order_ids().collect::<Vec<_>>(), vec![near.id, far.id]);
        assert_eq!(greedy.total_distance, 6.0);

        let fixed = assert_ok!(svc.plan_route(drone.id, Some(vec![far.id, near.id]), false).await);
        assert_eq!(fixed.order_ids().collect::<Vec<_>>(), vec![far.id, near.id]);
        assert_eq!(fixed.total_distance, 10.0);

        let missing = svc.plan_route(drone.id, Some(vec![OrderId(404)]), true).await;
        assert!(matches!(missing, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_plan_route_ignores_repeated_order_ids() {
        let svc = service();
        let drone = assert_ok!(svc.register_drone(NewDrone::new("Osprey", 10.0, 30.0)).await);
        let order = assert_ok!(svc.create_order(NewOrder::new(3, 0, 3.0, Priority::Medium)).await);

        let ids = vec![order.id, order.id, order.id];
        for optimize in [true, false] {
            let route = assert_ok!(svc.plan_route(drone.id, Some(ids.clone()), optimize).await);
            assert_eq!(route.order_ids().collect::<Vec<_>>(), vec![order.id]);
            assert_eq!(route.total_weight, 3.0);
            assert_eq!(route.total_distance, 3.0);
        }
    }

    #[tokio::test]
    async fn test_drone_orders_and_delete_guard() {
        let svc = service();
        let drone = assert_ok!(svc.register_drone(NewDrone::new("Heron", 10.0, 30.0)).await);
        let order = assert_ok!(svc.create_order(NewOrder::new(1, 1, 2.0, Priority::Medium)).await);
        assert_ok!(svc.dispatch(order.id, Some(drone.id)).await);

        let carried = assert_ok!(svc.drone_orders(drone.id).await);
        assert_eq!(carried.len(), 1);
        assert!(svc.delete_drone(drone.id).await.is_err());

        let overview = svc.overview().await;
        assert_eq!(overview.orders_total, 1);
        assert_eq!(overview.drones_available, 0);
        assert_eq!(overview.deliveries_total, 1);
    }

    #[tokio::test]
    async fn test_update_drone_rejects_off_grid_position() {
        let svc = service();
        let drone = assert_ok!(svc.register_drone(NewDrone::new("Kite", 10.0, 30.0)).await);
        let err = svc.move_drone(drone.id, Position::new(-1, 3)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }
}
