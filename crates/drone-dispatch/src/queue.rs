//! # Order Queue
//!
//! The queue is a view, not a stored structure: every pending order, ordered
//! by priority (high first), then creation time, then id.

use serde::Serialize;

use drone_domain::{Drone, DroneId, Order, OrderStatus, Priority};

use crate::cost;
use crate::selector::SelectionPolicy;

/// Build the queue from any set of orders, dropping non-pending ones
#[must_use]
pub fn order_queue(orders: impl IntoIterator<Item = Order>) -> Vec<Order> {
    let mut queue: Vec<Order> = orders
        .into_iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .collect();
    queue.sort_by_key(|o| (o.priority, o.created_at, o.id));
    queue
}

/// Queue position enriched with the drone that would take it right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    /// 1-based position in the queue
    pub position: usize,
    pub order: Order,
    pub recommended_drone: Option<DroneId>,
    pub recommended_drone_name: Option<String>,
    /// Flight minutes for the recommended drone
    pub estimated_time: Option<f64>,
    pub can_be_assigned: bool,
}

/// Annotate a queue with recommendations.
///
/// Each entry is evaluated independently against the current fleet, so two
/// entries may recommend the same drone.
#[must_use]
pub fn annotate(
    queue: Vec<Order>,
    drones: &[Drone],
    policy: SelectionPolicy,
    priority: Option<Priority>,
) -> Vec<QueueEntry> {
    queue
        .into_iter()
        .filter(|o| priority.is_none_or(|p| o.priority == p))
        .enumerate()
        .map(|(idx, order)| {
            let pick = policy.select(&order, drones);
            QueueEntry {
                position: idx + 1,
                recommended_drone: pick.map(|d| d.id),
                recommended_drone_name: pick.map(|d| d.name.clone()),
                estimated_time: pick.map(|d| cost::flight_time(d, &order.location)),
                can_be_assigned: pick.is_some(),
                order,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use drone_domain::{NewDrone, NewOrder, OrderId};

    fn order(id: u64, priority: Priority, age_secs: i64) -> Order {
        let created = Utc::now() - Duration::seconds(age_secs);
        Order::new(OrderId(id), NewOrder::new(2, 2, 1.0, priority), created)
    }

    #[test]
    fn test_priority_then_age() {
        let orders = vec![
            order(1, Priority::Low, 100),
            order(2, Priority::High, 10),
            order(3, Priority::Medium, 50),
            order(4, Priority::High, 20),
        ];
        let ids: Vec<u64> = order_queue(orders).iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_equal_timestamps_fall_back_to_id() {
        let now = Utc::now();
        let a = Order::new(OrderId(9), NewOrder::new(1, 1, 1.0, Priority::High), now);
        let b = Order::new(OrderId(3), NewOrder::new(1, 1, 1.0, Priority::High), now);
        let ids: Vec<u64> = order_queue([a, b]).iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn test_excludes_non_pending() {
        let mut done = order(1, Priority::High, 10);
        done.status = OrderStatus::Cancelled;
        let queue = order_queue([done, order(2, Priority::Low, 5)]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, OrderId(2));
    }

    #[test]
    fn test_annotate_positions_and_recommendations() {
        let drones = vec![Drone::new(DroneId(50), NewDrone::new("Osprey", 10.0, 30.0), Utc::now())];
        let queue = order_queue([order(1, Priority::Low, 10), order(2, Priority::High, 5)]);

        let view = annotate(queue.clone(), &drones, SelectionPolicy::default(), None);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].position, 1);
        assert_eq!(view[0].order.id, OrderId(2));
        assert_eq!(view[0].recommended_drone, Some(DroneId(50)));
        assert!(view[1].can_be_assigned);

        let only_low = annotate(queue, &[], SelectionPolicy::default(), Some(Priority::Low));
        assert_eq!(only_low.len(), 1);
        assert_eq!(only_low[0].position, 1);
        assert!(!only_low[0].can_be_assigned);
        assert!(only_low[0].estimated_time.is_none());
    }
}
