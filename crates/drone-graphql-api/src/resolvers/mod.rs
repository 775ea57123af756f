//! # GraphQL Resolvers Module
//!
//! Query, Mutation, and Subscription resolvers.

pub mod query;
pub mod mutation;
pub mod subscription;

pub use query::QueryRoot;
pub use mutation::MutationRoot;
pub use subscription::SubscriptionRoot;
