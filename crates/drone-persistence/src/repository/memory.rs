//! In-memory repository implementation.

use std::collections::BTreeMap;

use crate::error::{PersistenceError, Result};
use crate::repository::traits::{Entity, EntityStore, Repository};
use drone_domain::{Delivery, Drone, Order, Route};

// =============================================================================
// TABLE
// =============================================================================

/// Ordered map of entities keyed by id.
#[derive(Debug, Clone)]
pub struct MemoryTable<E: Entity> {
    rows: BTreeMap<E::Id, E>,
}

impl<E: Entity> MemoryTable<E> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<E: Entity> Default for MemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> for MemoryTable<E> {
    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    fn insert(&mut self, entity: E) -> Result<()> {
        let id = entity.id();
        if self.rows.contains_key(&id) {
            return Err(PersistenceError::WriteConflict(format!(
                "{} {id} already exists",
                E::KIND
            )));
        }
        tracing::trace!(kind = E::KIND, %id, "insert");
        self.rows.insert(id, entity);
        Ok(())
    }

    fn save(&mut self, entity: E) -> Result<()> {
        let id = entity.id();
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(PersistenceError::not_found(E::KIND, id)),
        }
    }

    fn remove(&mut self, id: E::Id) -> Result<E> {
        self.rows
            .remove(&id)
            .ok_or_else(|| PersistenceError::not_found(E::KIND, id))
    }

    fn list_where(&self, predicate: &dyn Fn(&E) -> bool) -> Vec<E> {
        self.rows
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

// =============================================================================
// ID SEQUENCE
// =============================================================================

/// Store-wide monotonic id generator starting at 1.
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Entity store holding every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    orders: MemoryTable<Order>,
    drones: MemoryTable<Drone>,
    deliveries: MemoryTable<Delivery>,
    routes: MemoryTable<Route>,
    ids: IdSequence,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for InMemoryStore {
    type OrderRepo = MemoryTable<Order>;
    type DroneRepo = MemoryTable<Drone>;
    type DeliveryRepo = MemoryTable<Delivery>;
    type RouteRepo = MemoryTable<Route>;

    fn orders(&self) -> &Self::OrderRepo {
        &self.orders
    }

    fn orders_mut(&mut self) -> &mut Self::OrderRepo {
        &mut self.orders
    }

    fn drones(&self) -> &Self::DroneRepo {
        &self.drones
    }

    fn drones_mut(&mut self) -> &mut Self::DroneRepo {
        &mut self.drones
    }

    fn deliveries(&self) -> &Self::DeliveryRepo {
        &self.deliveries
    }

    fn deliveries_mut(&mut self) -> &mut Self::DeliveryRepo {
        &mut self.deliveries
    }

    fn routes(&self) -> &Self::RouteRepo {
        &self.routes
    }

    fn routes_mut(&mut self) -> &mut Self::RouteRepo {
        &mut self.routes
    }

    fn next_id(&mut self) -> u64 {
        self.ids.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drone_domain::{NewDrone, NewOrder, OrderStatus, Priority};

    fn order(store: &mut InMemoryStore) -> Order {
        let id = store.next_order_id();
        Order::new(id, NewOrder::new(1, 2, 3.0, Priority::Medium), Utc::now())
    }

    #[test]
    fn test_ids_are_monotonic_across_kinds() {
        let mut store = InMemoryStore::new();
        let a = store.next_order_id();
        let b = store.next_drone_id();
        let c = store.next_order_id();
        assert_eq!((a.get(), b.get(), c.get()), (1, 2, 3));
    }

    #[test]
    fn test_insert_get_save_remove() {
        let mut store = InMemoryStore::new();
        let mut o = order(&mut store);
        let id = o.id;

        store.orders_mut().insert(o.clone()).unwrap();
        assert_eq!(store.orders().get(id), Some(&o));
        assert!(matches!(
            store.orders_mut().insert(o.clone()),
            Err(PersistenceError::WriteConflict(_))
        ));

        o.status = OrderStatus::Cancelled;
        store.orders_mut().save(o.clone()).unwrap();
        assert_eq!(store.orders().require(id).unwrap().status, OrderStatus::Cancelled);

        let removed = store.orders_mut().remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(store.orders().is_empty());
        assert!(matches!(
            store.orders().require(id),
            Err(PersistenceError::NotFound { .. })
        ));
        assert!(store.orders_mut().save(o).is_err());
    }

    #[test]
    fn test_list_where_is_ordered_by_id() {
        let mut store = InMemoryStore::new();
        for name in ["Bravo", "Alpha", "Charlie"] {
            let id = store.next_drone_id();
            let drone = Drone::new(id, NewDrone::new(name, 10.0, 20.0), Utc::now());
            store.drones_mut().insert(drone).unwrap();
        }
        let names: Vec<_> = store
            .drones()
            .list_all()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["Bravo", "Alpha", "Charlie"]);

        let filtered = store.drones().list_where(&|d| d.name.starts_with('C'));
        assert_eq!(filtered.len(), 1);
    }
}
