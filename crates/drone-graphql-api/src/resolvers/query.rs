//! # GraphQL Query Resolver
//!
//! Read operations for the dispatch API.

use async_graphql::{Context, ID, Object, Result};

use crate::context::{ApiContext, parse_id};
use crate::error::graphql_error;
use crate::schema::*;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    // =========================================================================
    // ORDER QUERIES
    // =========================================================================

    /// Get an order by ID
    #[graphql(name = "order")]
    async fn get_order(&self, ctx: &Context<'_>, id: ID) -> Result<Order> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let order = api_ctx
            .dispatch
            .get_order(parse_id("order", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(order.into())
    }

    /// List orders, oldest first
    #[graphql(name = "orders")]
    async fn get_orders(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filter: OrderFilterInput,
        #[graphql(default)] pagination: PaginationInput,
    ) -> Result<Connection<Order>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let orders = api_ctx.dispatch.list_orders(filter.into_filter()?).await;
        Ok(Connection::paginate(orders, &pagination))
    }

    // =========================================================================
    // DRONE QUERIES
    // =========================================================================

    /// Get a drone by ID
    #[graphql(name = "drone")]
    async fn get_drone(&self, ctx: &Context<'_>, id: ID) -> Result<Drone> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone = api_ctx
            .dispatch
            .get_drone(parse_id("drone", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(drone.into())
    }

    /// List drones in registration order
    #[graphql(name = "drones")]
    async fn get_drones(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filter: DroneFilterInput,
        #[graphql(default)] pagination: PaginationInput,
    ) -> Result<Connection<Drone>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drones = api_ctx.dispatch.list_drones(filter.into()).await;
        Ok(Connection::paginate(drones, &pagination))
    }

    /// Orders currently carried by a drone
    #[graphql(name = "droneOrders")]
    async fn get_drone_orders(&self, ctx: &Context<'_>, drone_id: ID) -> Result<Vec<Order>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let orders = api_ctx
            .dispatch
            .drone_orders(parse_id("drone", &drone_id)?)
            .await
            .map_err(graphql_error)?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    // =========================================================================
    // DELIVERY & ROUTE QUERIES
    // =========================================================================

    /// Get a delivery record by ID
    #[graphql(name = "delivery")]
    async fn get_delivery(&self, ctx: &Context<'_>, id: ID) -> Result<Delivery> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let delivery = api_ctx
            .dispatch
            .get_delivery(parse_id("delivery", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(delivery.into())
    }

    #[graphql(name = "deliveries")]
    async fn get_deliveries(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filter: DeliveryFilterInput,
        #[graphql(default)] pagination: PaginationInput,
    ) -> Result<Connection<Delivery>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let deliveries = api_ctx.dispatch.list_deliveries(filter.into_filter()?).await;
        Ok(Connection::paginate(deliveries, &pagination))
    }

    #[graphql(name = "route")]
    async fn get_route(&self, ctx: &Context<'_>, id: ID) -> Result<Route> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let route = api_ctx
            .dispatch
            .get_route(parse_id("route", &id)?)
            .await
            .map_err(graphql_error)?;
        Ok(route.into())
    }

    #[graphql(name = "routes")]
    async fn get_routes(
        &self,
        ctx: &Context<'_>,
        #[graphql(default)] filter: RouteFilterInput,
        #[graphql(default)] pagination: PaginationInput,
    ) -> Result<Connection<Route>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let routes = api_ctx.dispatch.list_routes(filter.into_filter()?).await;
        Ok(Connection::paginate(routes, &pagination))
    }

    // =========================================================================
    // QUEUE & STATISTICS
    // =========================================================================

    /// Pending queue with the drone each order would get right now
    ///
    /// Sorted by priority, then creation time.
    #[graphql(name = "queue")]
    async fn get_queue(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Only show this priority tier")]
        priority: Option<Priority>,
    ) -> Result<Vec<QueueEntry>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let entries = api_ctx
            .dispatch
            .queue_view(priority.map(Into::into))
            .await;
        Ok(entries.into_iter().map(QueueEntry::from).collect())
    }

    #[graphql(name = "queueStats")]
    async fn get_queue_stats(&self, ctx: &Context<'_>) -> Result<QueueStats> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(api_ctx.dispatch.queue_stats().await.into())
    }

    #[graphql(name = "fleetStats")]
    async fn get_fleet_stats(&self, ctx: &Context<'_>) -> Result<FleetStats> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(api_ctx.dispatch.fleet_stats().await.into())
    }

    #[graphql(name = "deliveryStats")]
    async fn get_delivery_stats(&self, ctx: &Context<'_>) -> Result<DeliveryStats> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(api_ctx.dispatch.delivery_stats().await.into())
    }

    /// Headline counters for dashboards
    #[graphql(name = "overview")]
    async fn get_overview(&self, ctx: &Context<'_>) -> Result<Overview> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let overview = api_ctx.dispatch.overview().await;
        Ok(Overview::new(overview, api_ctx.dispatch.policy()))
    }

    /// Active drone ranking policy
    #[graphql(name = "selectionPolicy")]
    async fn get_selection_policy(&self, ctx: &Context<'_>) -> Result<SelectionPolicy> {
        let api_ctx = ctx.data::<ApiContext>()?;
        Ok(api_ctx.dispatch.policy().into())
    }

    // =========================================================================
    // HEALTH CHECK
    // =========================================================================

    /// API health check
    #[graphql(name = "health")]
    async fn health(&self) -> Result<String> {
        Ok("OK".to_string())
    }

    /// API version
    #[graphql(name = "version")]
    async fn version(&self) -> Result<String> {
        Ok(crate::VERSION.to_string())
    }
}
