//! # GraphQL Subscription Resolver
//!
//! Real-time fleet event subscriptions. Each subscriber sees events
//! published after it connects; a subscriber that falls behind skips the
//! events it missed and keeps streaming.

use async_graphql::{Context, ID, Result, Subscription};
use futures_util::Stream;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::context::{ApiContext, parse_id};
use crate::schema::*;
use drone_dispatch as dispatch;
use drone_domain::DroneId;

/// GraphQL Subscription root
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Subscribe to every fleet event, optionally of one type
    #[graphql(name = "fleetEvents")]
    async fn fleet_events(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Only emit events of this type")] event_type: Option<FleetEventType>,
    ) -> Result<impl Stream<Item = FleetEvent>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let rx = api_ctx.events();
        Ok(filtered(rx, move |kind| {
            event_type.is_none_or(|t| FleetEventType::from(kind) == t)
        }))
    }

    /// Subscribe to events concerning one drone
    ///
    /// Covers dispatches, delivery transitions, state changes and routes.
    #[graphql(name = "droneEvents")]
    async fn drone_events(
        &self,
        ctx: &Context<'_>,
        #[graphql(desc = "Drone ID to filter events for")] drone_id: ID,
    ) -> Result<impl Stream<Item = FleetEvent>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let drone_id: DroneId = parse_id("drone", &drone_id)?;
        let rx = api_ctx.events();
        Ok(filtered(rx, move |kind| kind.drone_id() == Some(drone_id)))
    }

    /// Subscribe to delivery status transitions
    #[graphql(name = "deliveryUpdates")]
    async fn delivery_updates(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = FleetEvent>> {
        let api_ctx = ctx.data::<ApiContext>()?;
        let rx = api_ctx.events();
        Ok(filtered(rx, |kind| {
            matches!(
                kind,
                dispatch::FleetEventKind::OrderDispatched { .. }
                    | dispatch::FleetEventKind::DeliveryStatusChanged { .. }
            )
        }))
    }
}

fn filtered<F>(mut rx: Receiver<dispatch::FleetEvent>, keep: F) -> impl Stream<Item = FleetEvent>
where
    F: Fn(&dispatch::FleetEventKind) -> bool + Send + 'static,
{
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if keep(&event.kind) {
                        yield FleetEvent::from(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
