//! # Operational Statistics
//!
//! Read-only aggregates over snapshots of the store.

use serde::Serialize;

use drone_domain::{Delivery, DeliveryStatus, Drone, DroneStatus, Order, OrderStatus, Priority};

use crate::cost::DISPATCH_MIN_BATTERY;

/// Orders at or below this weight are light
pub const LIGHT_WEIGHT_MAX: f64 = 5.0;

/// Orders at or below this weight (and above light) are medium
pub const MEDIUM_WEIGHT_MAX: f64 = 15.0;

/// Battery above this is healthy
pub const HEALTHY_BATTERY_PCT: f64 = 50.0;

/// Pending queue breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub light: usize,
    pub medium_weight: usize,
    pub heavy: usize,
    pub total_weight: f64,
}

/// Fleet status and battery breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetStats {
    pub total: usize,
    pub idle: usize,
    pub flying: usize,
    pub delivering: usize,
    pub charging: usize,
    pub low_battery: usize,
    pub maintenance: usize,
    /// Idle with battery above the dispatch minimum
    pub available: usize,
    pub battery_healthy: usize,
    pub battery_medium: usize,
    pub battery_critical: usize,
    pub average_battery: f64,
    pub total_capacity: f64,
    pub used_capacity: f64,
    pub total_deliveries: u64,
}

/// Delivery outcome breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub total: usize,
    pub pending: usize,
    pub in_transit: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub failed: usize,
    /// Mean actual minutes over delivered records
    pub average_time: f64,
    pub total_distance: f64,
}

/// Headline counters across every entity kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub orders_total: usize,
    pub orders_pending: usize,
    pub orders_delivered: usize,
    pub drones_total: usize,
    pub drones_available: usize,
    pub deliveries_total: usize,
    pub routes_total: usize,
}

#[must_use]
pub fn queue_stats(queue: &[Order]) -> QueueStats {
    let mut stats = QueueStats::default();
    for order in queue.iter().filter(|o| o.status == OrderStatus::Pending) {
        stats.total += 1;
        match order.priority {
            Priority::High => stats.high += 1,
            Priority::Medium => stats.medium += 1,
            Priority::Low => stats.low += 1,
        }
        if order.weight <= LIGHT_WEIGHT_MAX {
            stats.light += 1;
        } else if order.weight <= MEDIUM_WEIGHT_MAX {
            stats.medium_weight += 1;
        } else {
            stats.heavy += 1;
        }
        stats.total_weight += order.weight;
    }
    stats
}

/// Idle and charged above the dispatch minimum
#[must_use]
pub fn is_available(drone: &Drone) -> bool {
    drone.status == DroneStatus::Idle && drone.battery > DISPATCH_MIN_BATTERY
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fleet_stats(drones: &[Drone]) -> FleetStats {
    let mut stats = FleetStats {
        total: drones.len(),
        ..FleetStats::default()
    };
    let mut battery_sum = 0.0;

    for drone in drones {
        match drone.status {
            DroneStatus::Idle => stats.idle += 1,
            DroneStatus::Flying => stats.flying += 1,
            DroneStatus::Delivering => stats.delivering += 1,
            DroneStatus::Charging => stats.charging += 1,
            DroneStatus::LowBattery => stats.low_battery += 1,
            DroneStatus::Maintenance => stats.maintenance += 1,
        }
        if is_available(drone) {
            stats.available += 1;
        }
        if drone.battery > HEALTHY_BATTERY_PCT {
            stats.battery_healthy += 1;
        } else if drone.battery > DISPATCH_MIN_BATTERY {
            stats.battery_medium += 1;
        } else {
            stats.battery_critical += 1;
        }
        battery_sum += drone.battery;
        stats.total_capacity += drone.capacity;
        stats.used_capacity += drone.current_load;
        stats.total_deliveries += u64::from(drone.total_deliveries);
    }

    if !drones.is_empty() {
        stats.average_battery = battery_sum / drones.len() as f64;
    }
    stats
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn delivery_stats(deliveries: &[Delivery]) -> DeliveryStats {
    let mut stats = DeliveryStats {
        total: deliveries.len(),
        ..DeliveryStats::default()
    };
    let mut time_sum = 0.0;

    for delivery in deliveries {
        match delivery.status {
            DeliveryStatus::Pending => stats.pending += 1,
            DeliveryStatus::InTransit => stats.in_transit += 1,
            DeliveryStatus::Delivered => {
                stats.delivered += 1;
                time_sum += delivery.actual_time.unwrap_or(0.0);
            }
            DeliveryStatus::Cancelled => stats.cancelled += 1,
            DeliveryStatus::Failed => stats.failed += 1,
        }
        stats.total_distance += delivery.distance;
    }

    if stats.delivered > 0 {
        stats.average_time = time_sum / stats.delivered as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drone_domain::{DeliveryId, DroneId, NewDrone, NewOrder, OrderId};

    #[test]
    fn test_queue_stats_bands() {
        let now = Utc::now();
        let orders = vec![
            Order::new(OrderId(1), NewOrder::new(1, 1, 5.0, Priority::High), now),
            Order::new(OrderId(2), NewOrder::new(1, 1, 5.5, Priority::Low), now),
            Order::new(OrderId(3), NewOrder::new(1, 1, 15.0, Priority::Low), now),
            Order::new(OrderId(4), NewOrder::new(1, 1, 30.0, Priority::Medium), now),
        ];
        let stats = queue_stats(&orders);
        assert_eq!(stats.total, 4);
        assert_eq!((stats.high, stats.medium, stats.low), (1, 1, 2));
        assert_eq!((stats.light, stats.medium_weight, stats.heavy), (1, 2, 1));
        assert!((stats.total_weight - 55.5).abs() < 1e-9);
    }

    #[test]
    fn test_fleet_stats_availability_and_battery() {
        let now = Utc::now();
        let mut drones: Vec<Drone> = (1..=4)
            .map(|i| Drone::new(DroneId(i), NewDrone::new(format!("Unit {i}"), 10.0, 20.0), now))
            .collect();
        drones[1].battery = 20.0;
        drones[2].battery = 35.0;
        drones[3].status = DroneStatus::Flying;
        drones[3].current_load = 4.0;

        let stats = fleet_stats(&drones);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.idle, 3);
        assert_eq!(stats.available, 2);
        assert_eq!(
            (stats.battery_healthy, stats.battery_medium, stats.battery_critical),
            (2, 1, 1)
        );
        assert_eq!(stats.total_capacity, 40.0);
        assert_eq!(stats.used_capacity, 4.0);
    }

    #[test]
    fn test_delivery_average_over_delivered_only() {
        let now = Utc::now();
        let make = |id: u64, status, actual: Option<f64>| Delivery {
            id: DeliveryId(id),
            order_id: OrderId(id),
            drone_id: DroneId(1),
            status,
            distance: 2.0,
            estimated_time: 4.0,
            start_time: None,
            delivered_at: None,
            actual_time: actual,
            created_at: now,
            updated_at: now,
        };
        let deliveries = vec![
            make(1, DeliveryStatus::Delivered, Some(4.0)),
            make(2, DeliveryStatus::Delivered, Some(8.0)),
            make(3, DeliveryStatus::Pending, None),
        ];
        let stats = delivery_stats(&deliveries);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.pending, 1);
        assert!((stats.average_time - 6.0).abs() < 1e-9);
        assert!((stats.total_distance - 6.0).abs() < 1e-9);

        assert_eq!(delivery_stats(&[]).average_time, 0.0);
    }
}
