//! # Repository Traits
//!
//! Abstract repository interfaces for domain entities.
//! Implementations can be swapped for different backends (in-memory, durable, mock)
//! without touching dispatch logic.

use std::fmt::{Debug, Display};

use crate::error::{PersistenceError, Result};
use drone_domain::{
    Delivery, DeliveryId, Drone, DroneId, Order, OrderId, Route, RouteId,
};

// =============================================================================
// ENTITY
// =============================================================================

/// A record addressable by a typed identifier
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Display + Debug + Send + Sync + 'static;

    /// Entity kind used in error messages
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
}

impl Entity for Order {
    type Id = OrderId;
    const KIND: &'static str = "Order";

    fn id(&self) -> OrderId {
        self.id
    }
}

impl Entity for Drone {
    type Id = DroneId;
    const KIND: &'static str = "Drone";

    fn id(&self) -> DroneId {
        self.id
    }
}

impl Entity for Delivery {
    type Id = DeliveryId;
    const KIND: &'static str = "Delivery";

    fn id(&self) -> DeliveryId {
        self.id
    }
}

impl Entity for Route {
    type Id = RouteId;
    const KIND: &'static str = "Route";

    fn id(&self) -> RouteId {
        self.id
    }
}

// =============================================================================
// REPOSITORY
// =============================================================================

/// Create/read/update/delete and filtered enumeration for one entity kind
pub trait Repository<E: Entity>: Send + Sync {
    /// Get entity by ID
    fn get(&self, id: E::Id) -> Option<&E>;

    /// Insert a new entity; fails if the id is taken
    fn insert(&mut self, entity: E) -> Result<()>;

    /// Replace an existing entity; fails if it does not exist
    fn save(&mut self, entity: E) -> Result<()>;

    /// Remove and return an entity
    fn remove(&mut self, id: E::Id) -> Result<E>;

    /// Owned copies of every entity matching `predicate`, ordered by id
    fn list_where(&self, predicate: &dyn Fn(&E) -> bool) -> Vec<E>;

    /// Number of stored entities
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get entity by ID or fail with `NotFound`
    fn require(&self, id: E::Id) -> Result<&E> {
        self.get(id)
            .ok_or_else(|| PersistenceError::not_found(E::KIND, id))
    }

    /// Owned copies of every entity, ordered by id
    fn list_all(&self) -> Vec<E> {
        self.list_where(&|_| true)
    }
}

// =============================================================================
// UNIT OF WORK
// =============================================================================

/// Unit of Work pattern: one owner for every table plus the id sequence.
///
/// Callers that hold `&mut` to the store hold the only write path, so a
/// sequence of reads and saves made through it is atomic.
pub trait EntityStore: Send + Sync {
    type OrderRepo: Repository<Order>;
    type DroneRepo: Repository<Drone>;
    type DeliveryRepo: Repository<Delivery>;
    type RouteRepo: Repository<Route>;

    fn orders(&self) -> &Self::OrderRepo;
    fn orders_mut(&mut self) -> &mut Self::OrderRepo;

    fn drones(&self) -> &Self::DroneRepo;
    fn drones_mut(&mut self) -> &mut Self::DroneRepo;

    fn deliveries(&self) -> &Self::DeliveryRepo;
    fn deliveries_mut(&mut self) -> &mut Self::DeliveryRepo;

    fn routes(&self) -> &Self::RouteRepo;
    fn routes_mut(&mut self) -> &mut Self::RouteRepo;

    /// Next value of the store-wide monotonic id sequence
    fn next_id(&mut self) -> u64;

    fn next_order_id(&mut self) -> OrderId {
        OrderId(self.next_id())
    }

    fn next_drone_id(&mut self) -> DroneId {
        DroneId(self.next_id())
    }

    fn next_delivery_id(&mut self) -> DeliveryId {
        DeliveryId(self.next_id())
    }

    fn next_route_id(&mut self) -> RouteId {
        RouteId(self.next_id())
    }
}
