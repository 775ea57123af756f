//! End-to-end dispatch scenarios and invariants over the async service.

use fake::Fake;
use fake::faker::name::en::FirstName;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_test::assert_ok;

use drone_dispatch::{
    DispatchConfig, DispatchError, DispatchService, DroneCommand, NO_ELIGIBLE_DRONE, select_drone,
};
use drone_domain::{
    DeliveryFilter, DeliveryStatus, Drone, DroneFilter, DroneId, DroneStatus, NewDrone, NewOrder,
    Order, OrderFilter, OrderId, OrderStatus, Position, Priority,
};

fn service() -> DispatchService {
    DispatchService::in_memory(DispatchConfig::default())
}

fn drone_named(capacity: f64, range: f64) -> NewDrone {
    let name: String = FirstName().fake();
    NewDrone::new(format!("{name} One"), capacity, range)
}

async fn assert_load_invariant(svc: &DispatchService) {
    for drone in svc.list_drones(DroneFilter::default()).await {
        let mut carried = 0.0;
        for order_id in &drone.assigned_orders {
            carried += assert_ok!(svc.get_order(*order_id).await).weight;
        }
        assert!(
            (drone.current_load - carried).abs() < 1e-9,
            "drone {} load {} != carried {}",
            drone.id,
            drone.current_load,
            carried
        );
    }
}

#[tokio::test]
async fn test_single_dispatch_from_depot() {
    let svc = service();
    assert_ok!(svc.register_drone(NewDrone::new("Alpha", 10.0, 20.0)).await);
    let order = assert_ok!(svc.create_order(NewOrder::new(3, 3, 5.0, Priority::High)).await);

    let outcome = assert_ok!(svc.dispatch(order.id, None).await);
    assert_eq!(outcome.drone.status, DroneStatus::Flying);
    assert_eq!(outcome.drone.current_load, 5.0);
    assert_eq!(outcome.order.status, OrderStatus::Assigned);
    assert!((outcome.delivery.distance - 4.243).abs() < 1e-3);

    let stored = assert_ok!(svc.get_delivery(outcome.delivery.id).await);
    assert_eq!(stored, outcome.delivery);
}

#[tokio::test]
async fn test_dispatch_all_collects_failures() {
    let svc = service();
    assert_ok!(svc.register_drone(NewDrone::new("Bravo", 5.0, 20.0)).await);
    let heavy = assert_ok!(svc.create_order(NewOrder::new(2, 2, 8.0, Priority::High)).await);
    let light = assert_ok!(svc.create_order(NewOrder::new(1, 2, 3.0, Priority::Medium)).await);

    let report = assert_ok!(svc.dispatch_all().await);
    assert_eq!(report.total(), 2);
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.processed[0].order.id, light.id);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].order.id, heavy.id);
    assert_eq!(report.failed[0].reason, NO_ELIGIBLE_DRONE);

    let queue = svc.queue().await;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, heavy.id);
}

#[tokio::test]
async fn test_low_battery_drone_is_never_selected() {
    let svc = service();
    let mut spec = NewDrone::new("Charlie", 50.0, 50.0);
    spec.battery_consumption_rate = 5.0;
    let drone = assert_ok!(svc.register_drone(spec).await);

    // 10 + 7 units at 5%/unit leaves 15%
    assert_ok!(svc.move_drone(drone.id, Position::new(0, 10)).await);
    let flown = assert_ok!(svc.move_drone(drone.id, Position::new(7, 10)).await);
    assert!((flown.battery - 15.0).abs() < 1e-9);
    assert_eq!(flown.status, DroneStatus::LowBattery);

    let idle = assert_ok!(
        svc.update_drone(drone.id, DroneCommand::SetStatus(DroneStatus::Idle))
            .await
    );
    for (x, y) in [(7, 9), (5, 5), (10, 10)] {
        let order = assert_ok!(svc.create_order(NewOrder::new(x, y, 1.0, Priority::High)).await);
        assert!(select_drone(&order, [&idle]).is_none());
    }

    let report = assert_ok!(svc.dispatch_all().await);
    assert!(report.processed.is_empty());
    assert_eq!(report.failed.len(), 3);
    assert!(report.failed.iter().all(|f| f.reason == NO_ELIGIBLE_DRONE));
}

#[tokio::test]
async fn test_route_visits_nearest_first_within_range() {
    let svc = service();
    let drone = assert_ok!(svc.register_drone(NewDrone::new("Delta", 20.0, 10.0)).await);
    let o3 = assert_ok!(svc.create_order(NewOrder::new(3, 0, 1.0, Priority::Medium)).await);
    let o4 = assert_ok!(svc.create_order(NewOrder::new(0, 4, 1.0, Priority::Medium)).await);
    let o8 = assert_ok!(svc.create_order(NewOrder::new(0, 8, 1.0, Priority::Medium)).await);

    let route = assert_ok!(svc.plan_route(drone.id, Some(vec![o8.id, o4.id, o3.id]), true).await);
    let visited: Vec<OrderId> = route.order_ids().collect();
    assert_eq!(visited, vec![o3.id, o4.id]);
    assert!(route.total_distance <= 10.0);
    assert!((route.total_distance - 8.0).abs() < 1e-9);
    assert!(route.total_weight <= drone.capacity);
    assert!(!visited.contains(&o8.id));
}

#[tokio::test]
async fn test_queue_is_stable_and_fifo_within_priority() {
    let svc = service();
    let mut expected_high = Vec::new();
    for i in 0..4 {
        let priority = if i % 2 == 0 { Priority::High } else { Priority::Low };
        let order = assert_ok!(svc.create_order(NewOrder::new(i, i, 1.0, priority)).await);
        if priority == Priority::High {
            expected_high.push(order.id);
        }
    }

    let first = svc.queue().await;
    let second = svc.queue().await;
    assert_eq!(first, second);

    let highs: Vec<OrderId> = first
        .iter()
        .filter(|o| o.priority == Priority::High)
        .map(|o| o.id)
        .collect();
    assert_eq!(highs, expected_high);
    assert_eq!(first[0].priority, Priority::High);
    assert_eq!(first[3].priority, Priority::Low);
}

#[tokio::test]
async fn test_complete_delivery_is_not_double_counted() {
    let svc = service();
    let drone = assert_ok!(svc.register_drone(drone_named(10.0, 20.0)).await);
    let order = assert_ok!(svc.create_order(NewOrder::new(4, 1, 2.0, Priority::Low)).await);
    let outcome = assert_ok!(svc.dispatch(order.id, None).await);

    let done = assert_ok!(svc.complete_delivery(outcome.delivery.id).await);
    assert_eq!(done.drone.total_deliveries, 1);
    assert_eq!(done.drone.status, DroneStatus::Idle);
    assert_eq!(done.delivery.actual_time, Some(0.0));

    let again = svc.complete_delivery(outcome.delivery.id).await;
    assert!(matches!(again, Err(DispatchError::InvalidState(_))));
    assert_eq!(assert_ok!(svc.get_drone(drone.id).await).total_deliveries, 1);
}

#[tokio::test]
async fn test_closed_delivery_stays_closed_after_cleanup() {
    let svc = service();
    let drone = assert_ok!(svc.register_drone(drone_named(10.0, 20.0)).await);
    let order = assert_ok!(svc.create_order(NewOrder::new(2, 2, 3.0, Priority::High)).await);
    let outcome = assert_ok!(svc.dispatch(order.id, None).await);
    assert_ok!(svc.complete_delivery(outcome.delivery.id).await);

    assert_ok!(svc.delete_drone(drone.id).await);
    assert_ok!(svc.delete_order(order.id).await);

    let delivery_id = outcome.delivery.id;
    assert!(matches!(
        svc.complete_delivery(delivery_id).await,
        Err(DispatchError::InvalidState(_))
    ));
    assert!(matches!(
        svc.fail_delivery(delivery_id).await,
        Err(DispatchError::InvalidState(_))
    ));
    assert!(matches!(
        svc.cancel_delivery(delivery_id).await,
        Err(DispatchError::InvalidState(_))
    ));
    let record = assert_ok!(svc.get_delivery(delivery_id).await);
    assert_eq!(record.status, DeliveryStatus::Delivered);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_claim_a_drone_once() {
    let svc = service();
    let drone = assert_ok!(svc.register_drone(drone_named(10.0, 30.0)).await);
    let mut order_ids = Vec::new();
    for x in 1..=8 {
        let order = assert_ok!(svc.create_order(NewOrder::new(x, 1, 2.0, Priority::Medium)).await);
        order_ids.push(order.id);
    }

    let drone_id = drone.id;
    let handles: Vec<_> = order_ids
        .into_iter()
        .map(|order_id| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.dispatch(order_id, Some(drone_id)).await })
        })
        .collect();

    let mut claimed = 0;
    for handle in handles {
        match assert_ok!(handle.await) {
            Ok(_) => claimed += 1,
            Err(err) => assert!(matches!(err, DispatchError::InvalidState(_)), "{err}"),
        }
    }
    assert_eq!(claimed, 1);

    let flying = assert_ok!(svc.get_drone(drone.id).await);
    assert_eq!(flying.assigned_orders.len(), 1);
    assert!((flying.current_load - 2.0).abs() < 1e-9);
    assert_eq!(svc.queue().await.len(), 7);
    assert_load_invariant(&svc).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_count_once() {
    let svc = service();
    let drone = assert_ok!(svc.register_drone(drone_named(10.0, 30.0)).await);
    let order = assert_ok!(svc.create_order(NewOrder::new(5, 5, 4.0, Priority::High)).await);
    let delivery_id = assert_ok!(svc.dispatch(order.id, None).await).delivery.id;
    assert_ok!(svc.start_delivery(delivery_id).await);

    let (first, second) = tokio::join!(
        tokio::spawn({
            let svc = svc.clone();
            async move { svc.complete_delivery(delivery_id).await }
        }),
        tokio::spawn({
            let svc = svc.clone();
            async move { svc.complete_delivery(delivery_id).await }
        }),
    );
    let results = [assert_ok!(first), assert_ok!(second)];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(DispatchError::InvalidState(_))))
    );

    let done = assert_ok!(svc.get_drone(drone.id).await);
    assert_eq!(done.total_deliveries, 1);
    assert_eq!(done.status, DroneStatus::Idle);
    assert_eq!(svc.delivery_stats().await.delivered, 1);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let svc = service();
    assert!(matches!(
        svc.dispatch(OrderId(77), None).await,
        Err(DispatchError::NotFound { .. })
    ));
    assert!(matches!(
        svc.get_drone(DroneId(3)).await,
        Err(DispatchError::NotFound { .. })
    ));
    assert!(svc.optimize_fleet().await.is_ok_and(|plan| plan.routes.is_empty()));
}

#[tokio::test]
async fn test_optimize_fleet_plans_each_idle_drone() {
    let svc = service();
    let a = assert_ok!(svc.register_drone(NewDrone::new("Echo", 10.0, 30.0)).await);
    let b = assert_ok!(svc.register_drone(NewDrone::new("Foxtrot", 10.0, 30.0)).await);
    let busy = assert_ok!(svc.register_drone(NewDrone::new("Golf", 10.0, 30.0)).await);

    let held = assert_ok!(svc.create_order(NewOrder::new(9, 9, 1.0, Priority::High)).await);
    assert_ok!(svc.dispatch(held.id, Some(busy.id)).await);
    for (x, y) in [(1, 1), (2, 2), (5, 1)] {
        assert_ok!(svc.create_order(NewOrder::new(x, y, 4.0, Priority::Medium)).await);
    }

    let plan = assert_ok!(svc.optimize_fleet().await);
    assert_eq!(plan.drones_considered, 2);
    assert_eq!(plan.pending_orders, 3);
    assert_eq!(plan.routes.len(), 2);
    assert_eq!(plan.routes[0].drone_id, a.id);
    assert_eq!(plan.routes[1].drone_id, b.id);

    // both drones sit at the depot and see the same pool: identical plans
    let first: Vec<OrderId> = plan.routes[0].order_ids().collect();
    let second: Vec<OrderId> = plan.routes[1].order_ids().collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!((plan.total_weight - 16.0).abs() < 1e-9);
    assert!(plan.routes.iter().all(|r| r.total_weight <= 10.0 && r.efficiency() > 0.0));

    // planning is advisory: nothing was dispatched
    assert_eq!(svc.queue().await.len(), 3);
}

/// Random fleets and orders: selection constraints and load bookkeeping hold
/// after every dispatch, completion and cancellation.
#[tokio::test]
async fn test_randomized_operations_preserve_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let svc = service();

    for i in 0..5 {
        let capacity = rng.gen_range(5.0..30.0);
        let range = rng.gen_range(8.0..40.0);
        assert_ok!(svc.register_drone(NewDrone::new(format!("Unit {i}"), capacity, range)).await);
    }

    for round in 0..20 {
        for _ in 0..3 {
            let spec = NewOrder::new(
                rng.gen_range(0..=10),
                rng.gen_range(0..=10),
                rng.gen_range(0.5..12.0),
                Priority::ALL[rng.gen_range(0..3)],
            );
            assert_ok!(svc.create_order(spec).await);
        }

        let drones = svc.list_drones(DroneFilter::default()).await;
        for order in svc.queue().await {
            if let Some(picked) = select_drone(&order, &drones) {
                assert_selectable(picked, &order);
            }
        }

        let report = assert_ok!(svc.dispatch_all().await);
        for outcome in &report.processed {
            assert!(outcome.order.is_consistent());
            assert!(outcome.drone.current_load <= outcome.drone.capacity + 1e-9);
        }
        assert_load_invariant(&svc).await;

        let open = svc
            .list_deliveries(DeliveryFilter {
                status: Some(DeliveryStatus::Pending),
                drone_id: None,
            })
            .await;
        for (idx, delivery) in open.iter().enumerate() {
            if (idx + round) % 4 == 0 {
                assert_ok!(svc.cancel_order(delivery.order_id).await);
            } else {
                assert_ok!(svc.start_delivery(delivery.id).await);
                assert_ok!(svc.complete_delivery(delivery.id).await);
            }
        }
        assert_load_invariant(&svc).await;

        for drone in svc.list_drones(DroneFilter::default()).await {
            if drone.status == DroneStatus::Idle && drone.battery < 60.0 {
                assert_ok!(svc.charge_drone(drone.id).await);
            }
        }
    }

    let orders = svc.list_orders(OrderFilter::default()).await;
    assert!(orders.iter().all(Order::is_consistent));
}

fn assert_selectable(drone: &Drone, order: &Order) {
    assert_eq!(drone.status, DroneStatus::Idle);
    assert!(drone.battery > 20.0);
    assert!(drone.current_load + order.weight <= drone.capacity);
    assert!(drone.position.distance_to(&order.location) <= drone.range);
}
