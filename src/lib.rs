//! Donorlink - session and authorization layer of a blood donation platform
//!
//! This is the library interface for Donorlink: session tracking, the
//! authenticated API client, cached role resolution and route guards.

pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod storage;

pub use app::AppContext;
pub use config::Config;
pub use error::Error;
