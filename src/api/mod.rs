//! REST API client and resources

pub mod client;
mod donations;
mod funding;
pub mod models;
pub mod pipeline;
mod users;
pub mod validation;

pub use client::ApiClient;
pub use pipeline::{Interceptor, Pipeline, StageGuard};
