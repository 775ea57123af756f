//! # Route Planner
//!
//! Builds a multi-stop itinerary for one drone over a set of candidate
//! orders. Planning is pure: nothing is reserved or mutated here.
//!
//! Two strategies are available:
//! - [`plan_route`]: greedy nearest-neighbour under capacity and range budgets
//! - [`plan_in_order`]: visit candidates in the given order, skipping any that
//!   do not fit the remaining budgets

use drone_domain::{Drone, Order, Position, RouteStop};

use crate::cost;

/// Budgets consumed as stops are added
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanBudget {
    pub position: Position,
    pub capacity: f64,
    pub range: f64,
}

impl PlanBudget {
    /// Start from the drone's current position, free capacity and remaining range
    #[must_use]
    pub fn for_drone(drone: &Drone) -> Self {
        Self {
            position: drone.position,
            capacity: drone.remaining_capacity(),
            range: drone.current_range,
        }
    }

    fn exhausted(&self) -> bool {
        self.capacity <= 0.0 || self.range <= 0.0
    }

    /// Leg distance to `order` if it fits both budgets
    fn fits(&self, order: &Order) -> Option<f64> {
        let leg = cost::distance(&self.position, &order.location);
        (order.weight <= self.capacity && leg <= self.range).then_some(leg)
    }

    fn visit(&mut self, order: &Order, leg: f64) -> RouteStop {
        self.capacity -= order.weight;
        self.range -= leg;
        self.position = order.location;
        RouteStop {
            order_id: order.id,
            location: order.location,
            weight: order.weight,
            priority: order.priority,
            distance: leg,
            estimated_time: cost::leg_time(leg),
        }
    }
}

/// Greedy nearest-neighbour plan.
///
/// From the current position, repeatedly move to the closest unvisited order
/// that still fits; stop when nothing fits or a budget is spent. Ties go to
/// the candidate listed first.
#[must_use]
pub fn plan_route(drone: &Drone, candidates: &[Order]) -> Vec<RouteStop> {
    let mut budget = PlanBudget::for_drone(drone);
    let mut unvisited: Vec<&Order> = candidates.iter().collect();
    let mut stops = Vec::new();

    while !unvisited.is_empty() && !budget.exhausted() {
        let mut nearest: Option<(usize, f64)> = None;
        for (idx, order) in unvisited.iter().enumerate() {
            if let Some(leg) = budget.fits(order)
                && nearest.is_none_or(|(_, best)| leg < best)
            {
                nearest = Some((idx, leg));
            }
        }

        let Some((idx, leg)) = nearest else {
            break;
        };
        let order = unvisited.remove(idx);
        stops.push(budget.visit(order, leg));
    }

    tracing::debug!(
        drone_id = %drone.id,
        candidates = candidates.len(),
        stops = stops.len(),
        "planned greedy route"
    );
    stops
}

/// Plan that keeps the caller's order, dropping stops that do not fit
#[must_use]
pub fn plan_in_order(drone: &Drone, candidates: &[Order]) -> Vec<RouteStop> {
    let mut budget = PlanBudget::for_drone(drone);
    let mut stops = Vec::new();

    for order in candidates {
        if budget.exhausted() {
            break;
        }
        match budget.fits(order) {
            Some(leg) => stops.push(budget.visit(order, leg)),
            None => tracing::trace!(order_id = %order.id, "stop skipped, budget exceeded"),
        }
    }
    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drone_domain::{DroneId, NewDrone, NewOrder, OrderId, Priority};

    fn drone(capacity: f64, range: f64) -> Drone {
        Drone::new(DroneId(1), NewDrone::new("Harrier", capacity, range), Utc::now())
    }

    fn order(id: u64, x: i32, y: i32, weight: f64) -> Order {
        Order::new(OrderId(id), NewOrder::new(x, y, weight, Priority::Medium), Utc::now())
    }

    fn ids(stops: &[RouteStop]) -> Vec<u64> {
        stops.iter().map(|s| s.order_id.get()).collect()
    }

    #[test]
    fn test_greedy_visits_nearest_first() {
        let d = drone(20.0, 50.0);
        let candidates = vec![
            order(1, 8, 8, 1.0),
            order(2, 1, 0, 1.0),
            order(3, 2, 0, 1.0),
        ];
        let stops = plan_route(&d, &candidates);
        assert_eq!(ids(&stops), vec![2, 3, 1]);
        assert!((stops[0].distance - 1.0).abs() < 1e-9);
        assert!((stops[1].distance - 1.0).abs() < 1e-9);
        assert!((stops[1].estimated_time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_respects_capacity() {
        let d = drone(5.0, 50.0);
        let candidates = vec![order(1, 1, 0, 3.0), order(2, 2, 0, 3.0), order(3, 3, 0, 2.0)];
        let stops = plan_route(&d, &candidates);
        assert_eq!(ids(&stops), vec![1, 3]);
        let weight: f64 = stops.iter().map(|s| s.weight).sum();
        assert!(weight <= 5.0);
    }

    #[test]
    fn test_greedy_respects_range() {
        let d = drone(50.0, 6.0);
        let candidates = vec![order(1, 3, 0, 1.0), order(2, 3, 4, 1.0), order(3, 0, 10, 1.0)];
        let stops = plan_route(&d, &candidates);
        let total: f64 = stops.iter().map(|s| s.distance).sum();
        assert!(total <= 6.0);
        assert_eq!(ids(&stops), vec![1]);
    }

    #[test]
    fn test_empty_when_nothing_fits() {
        let d = drone(1.0, 50.0);
        assert!(plan_route(&d, &[order(1, 1, 1, 2.0)]).is_empty());
        assert!(plan_route(&d, &[]).is_empty());
    }

    #[test]
    fn test_in_order_keeps_sequence_and_skips() {
        let d = drone(5.0, 50.0);
        let candidates = vec![order(1, 5, 5, 2.0), order(2, 1, 1, 4.0), order(3, 0, 1, 2.0)];
        let stops = plan_in_order(&d, &candidates);
        assert_eq!(ids(&stops), vec![1, 3]);
        assert!((stops[1].distance - 5.0_f64.hypot(4.0)).abs() < 1e-9);
    }
}
