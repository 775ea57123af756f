//! # GraphQL Mutation Resolver
//!
//! Write operations for the dispatch API. Every mutation commits atomically;
//! a failed mutation leaves no partial state behind.

use async_graphql::{Context, ID, Object, Result};

use crate::context::{ApiContext, parse_id};
use crate::error::graphql_error;
use crate::schema::*;
use drone_dispatch::DroneCommand;

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    // =========================================================================
    // ORDER MUTATIONS
    // =========================================================================

    /// Create an order; it joins the pending queue
    #[graphql(name = "createOrder")]
    async fn create_order(&self, ctx: &Context<'_>, input: CreateOrderInput) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .create_order(input.into())
            .await
            .map_err(graphql_error)?;

        tracing::info!(order_id = %order.id, priority = order.priority.as_str(), "Order created");
        Ok(order.into())
    }

    /// Change priority or description of a pending order
    #[graphql(name = "updateOrder")]
    async fn update_order(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: UpdateOrderInput,
    ) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .update_order(parse_id("order", &id)?, input.into())
            .await
            .map_err(graphql_error)?;
        Ok(order.into())
    }

    /// Remove an order that is not on a drone
    #[graphql(name = "deleteOrder")]
    async fn delete_order(&self, ctx: &Context<'_>, id: ID) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .delete_order(parse_id("order", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(order.into())
    }

    /// Cancel a pending or assigned order, releasing its drone
    #[graphql(name = "cancelOrder")]
    async fn cancel_order(&self, ctx: &Context<'_>, id: ID) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .cancel_order(parse_id("order", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(order.into())
    }

    // =========================================================================
    // DRONE MUTATIONS
    // =========================================================================

    /// Register a drone at the depot with a full battery
    #[graphql(name = "registerDrone")]
    async fn register_drone(&self, ctx: &Context<'_>, input: CreateDroneInput) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone = api_ctx
            .dispatch
            .register_drone(input.into())
            .await
            .map_err(graphql_error)?;

        tracing::info!(drone_id = %drone.id, name = %drone.name, "Drone registered");
        Ok(drone.into())
    }

    /// Remove a drone that carries nothing
    #[graphql(name = "deleteDrone")]
    async fn delete_drone(&self, ctx: &Context<'_>, id: ID) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone = api_ctx
            .dispatch
            .delete_drone(parse_id("drone", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(drone.into())
    }

    /// Move, charge, dock or override the status of a drone
    #[graphql(name = "updateDroneState")]
    async fn update_drone_state(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: DroneStateInput,
    ) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let command = DroneCommand::try_from(input).map_err(graphql_error)?;
        let drone = api_ctx
            .dispatch
            .update_drone(parse_id("drone", &id)?, command)
            .await
            .map_err(graphql_error)?;
        Ok(drone.into())
    }

    // =========================================================================
    // DISPATCH MUTATIONS
    // =========================================================================

    /// Dispatch one pending order
    ///
    /// Without `droneId` the active selection policy picks the drone.
    #[graphql(name = "dispatchOrder")]
    async fn dispatch_order(
        &self,
        ctx: &Context<'_>,
        order_id: ID,
        drone_id: Option<ID>,
    ) -> Result<DispatchResult> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order_id = parse_id("order", &order_id)?;
        let drone_id = drone_id.map(|id| parse_id("drone", &id)).transpose()?;
        let outcome = api_ctx
            .dispatch
            .dispatch(order_id, drone_id)
            .await
            .map_err(graphql_error)?;
        Ok(outcome.into())
    }

    /// Dispatch the head of the queue
    #[graphql(name = "processNext")]
    async fn process_next(&self, ctx: &Context<'_>) -> Result<DispatchResult> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let outcome = api_ctx
            .dispatch
            .process_next()
            .await
            .map_err(graphql_error)?;
        Ok(outcome.into())
    }

    /// Try every pending order once, in queue order
    #[graphql(name = "processQueue")]
    async fn process_queue(&self, ctx: &Context<'_>) -> Result<BatchResult> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let report = api_ctx
            .dispatch
            .dispatch_all()
            .await
            .map_err(graphql_error)?;
        Ok(report.into())
    }

    // =========================================================================
    // DELIVERY MUTATIONS
    // =========================================================================

    /// Move a delivery to IN_TRANSIT, DELIVERED, FAILED or CANCELLED
    #[graphql(name = "updateDeliveryStatus")]
    async fn update_delivery_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: DeliveryStatus,
    ) -> Result<DispatchResult> {
        advance_delivery(ctx, &id, status).await
    }

    #[graphql(name = "startDelivery")]
    async fn start_delivery(&self, ctx: &Context<'_>, id: ID) -> Result<DispatchResult> {
        advance_delivery(ctx, &id, DeliveryStatus::InTransit).await
    }

    #[graphql(name = "completeDelivery")]
    async fn complete_delivery(&self, ctx: &Context<'_>, id: ID) -> Result<DispatchResult> {
        advance_delivery(ctx, &id, DeliveryStatus::Delivered).await
    }

    /// Mark a delivery failed; the order returns to the queue
    #[graphql(name = "failDelivery")]
    async fn fail_delivery(&self, ctx: &Context<'_>, id: ID) -> Result<DispatchResult> {
        advance_delivery(ctx, &id, DeliveryStatus::Failed).await
    }

    #[graphql(name = "cancelDelivery")]
    async fn cancel_delivery(&self, ctx: &Context<'_>, id: ID) -> Result<DispatchResult> {
        advance_delivery(ctx, &id, DeliveryStatus::Cancelled).await
    }

    // =========================================================================
    // ROUTE MUTATIONS
    // =========================================================================

    /// Plan a multi-stop route for one drone within its capacity and range
    #[graphql(name = "planRoute")]
    async fn plan_route(&self, ctx: &Context<'_>, input: PlanRouteInput) -> Result<Route> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone_id = parse_id("drone", &input.drone_id)?;
        let order_ids = input.order_ids()?;
        let route = api_ctx
            .dispatch
            .plan_route(drone_id, order_ids, input.optimize)
            .await
            .map_err(graphql_error)?;
        Ok(route.into())
    }

    /// Plan routes for every idle drone over the pending queue
    #[graphql(name = "optimizeRoutes")]
    async fn optimize_routes(&self, ctx: &Context<'_>) -> Result<FleetPlan> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let plan = api_ctx
            .dispatch
            .optimize_fleet()
            .await
            .map_err(graphql_error)?;
        Ok(plan.into())
    }

    #[graphql(name = "updateRouteStatus")]
    async fn update_route_status(
        &self,
        ctx: &Context<'_>,
        id: ID,
        status: RouteStatus,
    ) -> Result<Route> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let route = api_ctx
            .dispatch
            .set_route_status(parse_id("route", &id)?, status.into())
            .await
            .map_err(graphql_error)?;
        Ok(route.into())
    }
}

async fn advance_delivery(
    ctx: &Context<'_>,
    id: &ID,
    status: DeliveryStatus,
) -> Result<DispatchResult> {
    let api_ctx = ctx.data::<ApiContext>()?;
    let outcome = api_ctx
        .dispatch
        .advance_delivery(parse_id("delivery", id)?, status.into())
        .await
        .map_err(graphql_error)?;

    tracing::info!(
        delivery_id = %outcome.delivery.id,
        status = outcome.delivery.status.as_str(),
        "Delivery advanced"
    );
    Ok(outcome.into())
}
