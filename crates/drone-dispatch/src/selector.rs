//! # Drone Selection
//!
//! Chooses one drone for one order from a candidate set. Selection is a pure
//! function of the drones and the order; tie-breaking keeps the first
//! candidate in iteration order, so callers passing drones in id order get
//! deterministic results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use drone_domain::{Drone, DroneStatus, Order};

use crate::cost::{self, DISPATCH_MIN_BATTERY};

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// Why a drone cannot take an order
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Ineligible {
    #[error("drone is {0}, not idle")]
    NotIdle(&'static str),

    #[error("battery {battery:.1}% is not above {min}%")]
    LowBattery { battery: f64, min: f64 },

    #[error("load {load:.1} + weight {weight:.1} exceeds capacity {capacity:.1}")]
    OverCapacity { load: f64, weight: f64, capacity: f64 },

    #[error("distance {distance:.2} exceeds remaining range {range:.2}")]
    OutOfRange { distance: f64, range: f64 },
}

/// Check every hard constraint for putting `order` on `drone`.
///
/// # Errors
///
/// Returns the first constraint the drone violates.
pub fn check_eligibility(drone: &Drone, order: &Order) -> Result<(), Ineligible> {
    if drone.status != DroneStatus::Idle {
        return Err(Ineligible::NotIdle(drone.status.as_str()));
    }
    if drone.battery <= DISPATCH_MIN_BATTERY {
        return Err(Ineligible::LowBattery {
            battery: drone.battery,
            min: DISPATCH_MIN_BATTERY,
        });
    }
    if drone.current_load + order.weight > drone.capacity {
        return Err(Ineligible::OverCapacity {
            load: drone.current_load,
            weight: order.weight,
            capacity: drone.capacity,
        });
    }
    let distance = cost::distance(&drone.position, &order.location);
    if distance > drone.current_range {
        return Err(Ineligible::OutOfRange {
            distance,
            range: drone.current_range,
        });
    }
    Ok(())
}

#[must_use]
pub fn is_eligible(drone: &Drone, order: &Order) -> bool {
    check_eligibility(drone, order).is_ok()
}

// =============================================================================
// POLICY
// =============================================================================

/// Ranking used to pick among eligible drones. Lower score wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Shortest estimated flight time to the order
    #[default]
    MinDeliveryTime,
    /// Weighted mix of capacity use, range use and priority
    EfficiencyScore,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinDeliveryTime => "min_delivery_time",
            Self::EfficiencyScore => "efficiency_score",
        }
    }

    /// Score of `drone` for `order` under this policy
    #[must_use]
    pub fn score(&self, drone: &Drone, order: &Order) -> f64 {
        match self {
            Self::MinDeliveryTime => cost::flight_time(drone, &order.location),
            Self::EfficiencyScore => efficiency_score(drone, order),
        }
    }

    /// Pick the best eligible drone, or `None` when none qualifies
    pub fn select<'a, I>(&self, order: &Order, drones: I) -> Option<&'a Drone>
    where
        I: IntoIterator<Item = &'a Drone>,
    {
        let mut best: Option<(&'a Drone, f64)> = None;
        for drone in drones {
            if !is_eligible(drone, order) {
                continue;
            }
            let score = self.score(drone, order);
            // strict comparison keeps the earliest drone on ties
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((drone, score));
            }
        }
        best.map(|(drone, _)| drone)
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min_delivery_time" | "min-delivery-time" | "time" => Ok(Self::MinDeliveryTime),
            "efficiency_score" | "efficiency-score" | "efficiency" => Ok(Self::EfficiencyScore),
            other => Err(format!("unknown selection policy: {other}")),
        }
    }
}

/// `0.4 * weight/capacity + 0.3 * distance/range + 0.3 * (4 - priority)`
fn efficiency_score(drone: &Drone, order: &Order) -> f64 {
    let weight_ratio = if drone.capacity > 0.0 {
        order.weight / drone.capacity
    } else {
        0.0
    };
    let distance = cost::distance(&drone.position, &order.location);
    let range_ratio = if drone.range > 0.0 {
        distance / drone.range
    } else {
        0.0
    };
    let priority_weight = f64::from(4 - order.priority.value());

    0.4f64.mul_add(weight_ratio, 0.3f64.mul_add(range_ratio, 0.3 * priority_weight))
}

/// Select with the default minimum-delivery-time policy
pub fn select_drone<'a, I>(order: &Order, drones: I) -> Option<&'a Drone>
where
    I: IntoIterator<Item = &'a Drone>,
{
    SelectionPolicy::default().select(order, drones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drone_domain::{DroneId, NewDrone, NewOrder, OrderId, Position, Priority};

    fn drone(id: u64, capacity: f64, range: f64, at: Position) -> Drone {
        let spec = NewDrone::new(format!("D-{id}"), capacity, range);
        let mut d = Drone::new(DroneId(id), spec, Utc::now());
        d.position = at;
        d
    }

    fn order(x: i32, y: i32, weight: f64) -> Order {
        Order::new(OrderId(100), NewOrder::new(x, y, weight, Priority::Medium), Utc::now())
    }

    #[test]
    fn test_selects_nearest_drone() {
        let drones = vec![
            drone(1, 10.0, 50.0, Position::new(0, 0)),
            drone(2, 10.0, 50.0, Position::new(5, 5)),
        ];
        let picked = select_drone(&order(6, 6, 1.0), &drones).unwrap();
        assert_eq!(picked.id, DroneId(2));
    }

    #[test]
    fn test_tie_keeps_first_drone() {
        let drones = vec![
            drone(1, 10.0, 50.0, Position::new(0, 0)),
            drone(2, 10.0, 50.0, Position::new(0, 0)),
        ];
        let picked = select_drone(&order(3, 3, 1.0), &drones).unwrap();
        assert_eq!(picked.id, DroneId(1));
    }

    #[test]
    fn test_low_battery_slowdown_changes_ranking() {
        let mut near = drone(1, 10.0, 50.0, Position::new(2, 0));
        near.battery = 40.0;
        let far = drone(2, 10.0, 50.0, Position::new(0, 0));
        // near: 2 * 2 * 1.5 = 6.0 min, far: 4 * 2 = 8.0 min
        let o = order(4, 0, 1.0);
        assert_eq!(select_drone(&o, [&near, &far]).unwrap().id, DroneId(1));

        near.position = Position::new(1, 0);
        near.battery = 50.0;
        let o = order(5, 0, 1.0);
        // near: 4 * 2 * 1.5 = 12.0, far: 5 * 2 = 10.0
        assert_eq!(select_drone(&o, [&near, &far]).unwrap().id, DroneId(2));
    }

    #[test]
    fn test_hard_constraints() {
        let mut d = drone(1, 10.0, 5.0, Position::new(0, 0));
        assert!(matches!(
            check_eligibility(&d, &order(1, 1, 11.0)),
            Err(Ineligible::OverCapacity { .. })
        ));
        assert!(matches!(
            check_eligibility(&d, &order(6, 6, 1.0)),
            Err(Ineligible::OutOfRange { .. })
        ));

        d.battery = 20.0;
        assert!(matches!(
            check_eligibility(&d, &order(1, 1, 1.0)),
            Err(Ineligible::LowBattery { .. })
        ));

        d.battery = 90.0;
        d.status = DroneStatus::Maintenance;
        assert_eq!(
            check_eligibility(&d, &order(1, 1, 1.0)),
            Err(Ineligible::NotIdle("maintenance"))
        );
    }

    #[test]
    fn test_no_eligible_drone() {
        let drones = vec![drone(1, 2.0, 50.0, Position::new(0, 0))];
        assert!(select_drone(&order(1, 1, 5.0), &drones).is_none());
        assert!(select_drone(&order(1, 1, 5.0), &[]).is_none());
    }

    #[test]
    fn test_efficiency_score_prefers_roomier_drone() {
        let small = drone(1, 10.0, 50.0, Position::new(0, 0));
        let large = drone(2, 100.0, 50.0, Position::new(0, 0));
        let o = order(2, 2, 8.0);
        let picked = SelectionPolicy::EfficiencyScore.select(&o, [&small, &large]).unwrap();
        assert_eq!(picked.id, DroneId(2));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("efficiency".parse::<SelectionPolicy>().unwrap(), SelectionPolicy::EfficiencyScore);
        assert_eq!(
            "MIN_DELIVERY_TIME".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::MinDeliveryTime
        );
        assert!("fastest".parse::<SelectionPolicy>().is_err());
    }
}
