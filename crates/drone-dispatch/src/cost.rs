//! Geometry and cost model.
//!
//! Pure functions of their inputs: flight time and battery drain estimates
//! used for ranking drones, sizing deliveries and updating drone state.

use drone_domain::{Drone, Position};

/// Flight minutes per unit of grid distance
pub const MINUTES_PER_UNIT: f64 = 2.0;

/// Flight-time multiplier applied at or below [`SLOWDOWN_BATTERY_PCT`]
pub const LOW_BATTERY_SLOWDOWN: f64 = 1.5;

/// Battery level at or below which drones fly slower
pub const SLOWDOWN_BATTERY_PCT: f64 = 50.0;

/// Extra drain at full load, as a fraction of the base rate
pub const MAX_LOAD_PENALTY: f64 = 0.3;

/// Minimum battery for automatic selection (strictly above)
pub const DISPATCH_MIN_BATTERY: f64 = 20.0;

/// A drone at or below this level is flagged `low_battery`
pub const LOW_BATTERY_PCT: f64 = 20.0;

/// A drone at or below this level is forced to `charging`
pub const CRITICAL_BATTERY_PCT: f64 = 5.0;

/// Euclidean distance between two grid points
#[must_use]
pub fn distance(from: &Position, to: &Position) -> f64 {
    from.distance_to(to)
}

/// Flight minutes for a leg of the given length, ignoring battery state
#[must_use]
pub fn leg_time(distance: f64) -> f64 {
    distance * MINUTES_PER_UNIT
}

/// Estimated minutes for `drone` to reach `target` from where it is now.
///
/// Drones at or below half charge fly 1.5x slower.
#[must_use]
pub fn flight_time(drone: &Drone, target: &Position) -> f64 {
    let factor = if drone.battery <= SLOWDOWN_BATTERY_PCT {
        LOW_BATTERY_SLOWDOWN
    } else {
        1.0
    };
    leg_time(distance(&drone.position, target)) * factor
}

/// Battery percent consumed flying `distance_travelled` at the drone's current load.
///
/// Consumption grows linearly with load, up to 30% extra at full capacity.
#[must_use]
pub fn battery_consumption(drone: &Drone, distance_travelled: f64) -> f64 {
    let load_penalty = 1.0 + drone.load_factor() * MAX_LOAD_PENALTY;
    distance_travelled * drone.battery_consumption_rate * load_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drone_domain::{DroneId, NewDrone};

    fn drone() -> Drone {
        Drone::new(DroneId(1), NewDrone::new("Kestrel", 10.0, 20.0), Utc::now())
    }

    #[test]
    fn test_flight_time_full_battery() {
        let d = drone();
        let t = flight_time(&d, &Position::new(3, 4));
        assert!((t - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_flight_time_slowdown_at_half_charge() {
        let mut d = drone();
        d.battery = 50.0;
        let t = flight_time(&d, &Position::new(3, 4));
        assert!((t - 15.0).abs() < 1e-9);

        d.battery = 50.1;
        assert!((flight_time(&d, &Position::new(3, 4)) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_battery_consumption_scales_with_load() {
        let mut d = drone();
        d.battery_consumption_rate = 1.0;
        assert!((battery_consumption(&d, 10.0) - 10.0).abs() < 1e-9);

        d.current_load = 5.0;
        assert!((battery_consumption(&d, 10.0) - 11.5).abs() < 1e-9);

        d.current_load = 10.0;
        assert!((battery_consumption(&d, 10.0) - 13.0).abs() < 1e-9);
    }
}
