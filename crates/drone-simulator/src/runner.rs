//! Tick-driven fleet simulation over the dispatch engine.
//!
//! Each tick closes the deliveries launched on the previous tick, spawns new
//! orders, drains the queue, launches fresh deliveries and services drones
//! that need a charge.

use serde::Serialize;
use tracing::{debug, info, warn};

use drone_dispatch::{DispatchError, DispatchService, Overview, Result};
use drone_domain::{DeliveryFilter, DeliveryStatus, DroneFilter, DroneStatus, Position};

use crate::scenario::ScenarioGenerator;

/// Battery level below which an unassigned drone heads back to charge.
pub const RECHARGE_BELOW_PCT: f64 = 35.0;

/// Remaining range below which a drone cannot reach a neighbouring grid point.
pub const RECHARGE_BELOW_RANGE: f64 = 1.0;

/// Knobs for one simulation run
#[derive(Debug, Clone, Copy)]
pub struct SimulationSettings {
    pub orders_per_tick: usize,
    /// Probability that an in-transit delivery fails
    pub failure_rate: f64,
    /// Run fleet route planning every N ticks (0 disables)
    pub plan_every: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            orders_per_tick: 3,
            failure_rate: 0.05,
            plan_every: 10,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub tick: u32,
    pub orders_created: usize,
    pub dispatched: usize,
    pub unplaced: usize,
    pub launched: usize,
    pub delivered: usize,
    pub failed: usize,
    pub recharged: usize,
    pub routes_planned: usize,
}

/// Drives a [`DispatchService`] with generated traffic.
pub struct FleetSimulator {
    service: DispatchService,
    generator: ScenarioGenerator,
    settings: SimulationSettings,
    tick: u32,
}

impl FleetSimulator {
    pub const fn new(
        service: DispatchService,
        generator: ScenarioGenerator,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            service,
            generator,
            settings,
            tick: 0,
        }
    }

    pub const fn service(&self) -> &DispatchService {
        &self.service
    }

    /// Register `count` generated drones at the depot.
    pub async fn seed_fleet(&mut self, count: usize) -> Result<()> {
        for index in 0..count {
            let drone = self.service.register_drone(self.generator.drone(index)).await?;
            info!(
                drone_id = %drone.id,
                name = %drone.name,
                capacity = drone.capacity,
                range = drone.range,
                "drone registered"
            );
        }
        Ok(())
    }

    /// Run one tick.
    pub async fn step(&mut self) -> Result<TickSummary> {
        self.tick += 1;
        let mut summary = TickSummary {
            tick: self.tick,
            ..TickSummary::default()
        };

        self.close_deliveries(&mut summary).await?;

        for _ in 0..self.settings.orders_per_tick {
            self.service.create_order(self.generator.order()).await?;
            summary.orders_created += 1;
        }

        if self.settings.plan_every > 0 && self.tick % self.settings.plan_every == 0 {
            let plan = self.service.optimize_fleet().await?;
            summary.routes_planned = plan.routes.len();
            debug!(
                routes = plan.routes.len(),
                total_distance = plan.total_distance,
                "advisory fleet plan"
            );
        }

        let report = self.service.dispatch_all().await?;
        summary.dispatched = report.processed.len();
        summary.unplaced = report.failed.len();

        self.launch_deliveries(&mut summary).await?;
        self.service_batteries(&mut summary).await?;

        Ok(summary)
    }

    /// Complete or fail every delivery currently in transit.
    async fn close_deliveries(&mut self, summary: &mut TickSummary) -> Result<()> {
        let in_transit = self
            .service
            .list_deliveries(DeliveryFilter {
                status: Some(DeliveryStatus::InTransit),
                drone_id: None,
            })
            .await;

        for delivery in in_transit {
            if self.generator.chance(self.settings.failure_rate) {
                let outcome = self.service.fail_delivery(delivery.id).await?;
                warn!(order_id = %outcome.order.id, drone = %outcome.drone.name, "delivery failed");
                summary.failed += 1;
            } else {
                self.service.complete_delivery(delivery.id).await?;
                summary.delivered += 1;
            }
        }
        Ok(())
    }

    /// Start each freshly dispatched delivery and fly the drone to the drop-off.
    async fn launch_deliveries(&self, summary: &mut TickSummary) -> Result<()> {
        let pending = self
            .service
            .list_deliveries(DeliveryFilter {
                status: Some(DeliveryStatus::Pending),
                drone_id: None,
            })
            .await;

        for delivery in pending {
            let outcome = self.service.start_delivery(delivery.id).await?;
            self.service
                .move_drone(outcome.drone.id, outcome.order.location)
                .await?;
            summary.launched += 1;
        }
        Ok(())
    }

    /// Return unassigned drones with a weak battery or spent range to the
    /// depot and charge them.
    async fn service_batteries(&self, summary: &mut TickSummary) -> Result<()> {
        for drone in self.service.list_drones(DroneFilter::default()).await {
            let depleted =
                drone.battery < RECHARGE_BELOW_PCT || drone.current_range < RECHARGE_BELOW_RANGE;
            let needs_charge = matches!(
                drone.status,
                DroneStatus::LowBattery | DroneStatus::Charging
            ) || (drone.status == DroneStatus::Idle && depleted);
            if !needs_charge || !drone.assigned_orders.is_empty() {
                continue;
            }

            if drone.position != Position::DEPOT {
                self.service.move_drone(drone.id, Position::DEPOT).await?;
            }
            match self.service.charge_drone(drone.id).await {
                Ok(charged) => {
                    debug!(drone = %charged.name, "recharged at depot");
                    summary.recharged += 1;
                }
                Err(err @ DispatchError::InvalidState(_)) => {
                    debug!(drone = %drone.name, reason = %err, "charge deferred");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Headline counters for the run so far.
    pub async fn overview(&self) -> Overview {
        self.service.overview().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drone_dispatch::DispatchConfig;
    use drone_domain::{NewDrone, OrderFilter};
    use tokio_test::assert_ok;

    fn simulator(settings: SimulationSettings) -> FleetSimulator {
        FleetSimulator::new(
            DispatchService::in_memory(DispatchConfig::default()),
            ScenarioGenerator::new(Some(11)).unwrap(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_ticks_move_orders_through_lifecycle() {
        let mut sim = simulator(SimulationSettings {
            failure_rate: 0.0,
            ..SimulationSettings::default()
        });
        assert_ok!(sim.seed_fleet(4).await);

        let mut delivered = 0;
        let mut launched = 0;
        for _ in 0..12 {
            let summary = assert_ok!(sim.step().await);
            assert_eq!(summary.orders_created, 3);
            assert_eq!(summary.failed, 0);
            delivered += summary.delivered;
            launched += summary.launched;
        }

        assert!(launched > 0);
        assert!(delivered > 0);
        assert!(delivered <= launched);

        let overview = sim.overview().await;
        assert_eq!(overview.orders_total, 36);
        assert_eq!(overview.drones_total, 4);
        assert_eq!(overview.orders_delivered, delivered);
    }

    #[tokio::test]
    async fn test_carried_orders_match_load() {
        let mut sim = simulator(SimulationSettings::default());
        assert_ok!(sim.seed_fleet(3).await);
        for _ in 0..8 {
            assert_ok!(sim.step().await);
        }

        let svc = sim.service();
        let orders = svc.list_orders(OrderFilter::default()).await;
        for drone in svc.list_drones(DroneFilter::default()).await {
            let carried: f64 = orders
                .iter()
                .filter(|o| o.assigned_drone == Some(drone.id))
                .map(|o| o.weight)
                .sum();
            assert!((drone.current_load - carried).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_spent_range_triggers_recharge() {
        let sim = simulator(SimulationSettings::default());
        let svc = sim.service();
        let mut spec = NewDrone::new("Wren-01", 10.0, 10.0);
        spec.battery_consumption_rate = 0.1;
        let drone = assert_ok!(svc.register_drone(spec).await);

        assert_ok!(svc.move_drone(drone.id, Position::new(0, 10)).await);
        let back = assert_ok!(svc.move_drone(drone.id, Position::DEPOT).await);
        assert_eq!(back.status, DroneStatus::Idle);
        assert!(back.battery > RECHARGE_BELOW_PCT);
        assert!(back.current_range < RECHARGE_BELOW_RANGE);

        let mut summary = TickSummary::default();
        assert_ok!(sim.service_batteries(&mut summary).await);
        assert_eq!(summary.recharged, 1);

        let charged = assert_ok!(svc.get_drone(drone.id).await);
        assert_eq!(charged.current_range, charged.range);
        assert_eq!(charged.battery, 100.0);
    }

    #[tokio::test]
    async fn test_planning_can_be_disabled() {
        let mut sim = simulator(SimulationSettings {
            plan_every: 0,
            ..SimulationSettings::default()
        });
        assert_ok!(sim.seed_fleet(2).await);
        for _ in 0..5 {
            let summary = assert_ok!(sim.step().await);
            assert_eq!(summary.routes_planned, 0);
        }
    }
}
