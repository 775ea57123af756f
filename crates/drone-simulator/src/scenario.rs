//! Random fleet and order generation on the delivery grid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};

use drone_domain::{GRID_MAX, MAX_ORDER_WEIGHT, NewDrone, NewOrder, Position, Priority};

/// Drone models with (capacity, range) envelopes.
const MODELS: [(&str, f64, f64); 3] = [
    ("Courier S", 8.0, 25.0),
    ("Courier M", 15.0, 35.0),
    ("Hauler XL", 30.0, 45.0),
];

/// Callsign stems for generated drones.
const CALLSIGNS: [&str; 8] = [
    "Kestrel", "Swift", "Heron", "Osprey", "Merlin", "Wren", "Finch", "Harrier",
];

/// Relative weight of high / medium / low priority orders.
const PRIORITY_MIX: [u32; 3] = [2, 5, 3];

/// Seeded generator for reproducible scenarios.
pub struct ScenarioGenerator {
    rng: StdRng,
    weight: Normal<f64>,
}

impl ScenarioGenerator {
    /// Mean payload weight of generated orders.
    pub const MEAN_WEIGHT: f64 = 6.0;

    /// Create a generator; `None` seeds from OS entropy.
    pub fn new(seed: Option<u64>) -> Result<Self, NormalError> {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            rng,
            weight: Normal::new(Self::MEAN_WEIGHT, 4.0)?,
        })
    }

    /// Random grid point.
    pub fn position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0..=GRID_MAX),
            self.rng.gen_range(0..=GRID_MAX),
        )
    }

    /// Random order; weights follow a clamped normal distribution.
    pub fn order(&mut self) -> NewOrder {
        let location = self.position();
        let weight = self.weight.sample(&mut self.rng).clamp(0.5, MAX_ORDER_WEIGHT);
        let weight = (weight * 10.0).round() / 10.0;

        let mut order = NewOrder::new(location.x, location.y, weight, self.priority());
        order.description = Some(format!("Parcel to {location}"));
        order
    }

    fn priority(&mut self) -> Priority {
        let total: u32 = PRIORITY_MIX.iter().sum();
        let mut roll = self.rng.gen_range(0..total);
        for (priority, share) in Priority::ALL.into_iter().zip(PRIORITY_MIX) {
            if roll < share {
                return priority;
            }
            roll -= share;
        }
        Priority::Low
    }

    /// Drone `index` of the fleet, with a model picked at random.
    pub fn drone(&mut self, index: usize) -> NewDrone {
        let (model, capacity, range) = MODELS[self.rng.gen_range(0..MODELS.len())];
        let stem = CALLSIGNS[index % CALLSIGNS.len()];

        let mut drone = NewDrone::new(format!("{stem}-{:02}", index + 1), capacity, range);
        drone.model = Some(model.to_string());
        drone.battery_consumption_rate = self.rng.gen_range(0.3..0.8);
        drone
    }

    /// Bernoulli trial with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}
