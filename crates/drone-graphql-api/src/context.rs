//! # API Context
//!
//! Application state and dependency injection for GraphQL resolvers.

use std::str::FromStr;

use async_graphql::{ID, Result};
use tokio::sync::broadcast;

use drone_dispatch::{DispatchConfig, DispatchService, FleetEvent};

use crate::error::{ApiError, graphql_error};

/// Application context shared across all GraphQL resolvers
#[derive(Clone)]
pub struct ApiContext {
    /// Dispatch engine over the shared entity store
    pub dispatch: DispatchService,
}

impl ApiContext {
    /// Wrap an existing dispatch service
    pub const fn new(dispatch: DispatchService) -> Self {
        Self { dispatch }
    }

    /// Context over a fresh in-memory store
    pub fn in_memory(config: DispatchConfig) -> Self {
        Self::new(DispatchService::in_memory(config))
    }

    /// Fleet event stream starting now
    pub fn events(&self) -> broadcast::Receiver<FleetEvent> {
        self.dispatch.subscribe()
    }
}

/// Parse a GraphQL `ID` argument into a typed identifier
pub fn parse_id<T: FromStr>(entity_type: &str, id: &ID) -> Result<T> {
    id.as_str()
        .parse()
        .map_err(|_| graphql_error(ApiError::invalid_id(entity_type, id.as_str())))
}
