//! HTTP service for registering sykmelding status changes.
//!
//! Wires the pure status core to its adapters: the `PostgreSQL` event log,
//! the Kafka status stream, and the Redis latest-status cache. The HTTP
//! surface accepts status changes on behalf of the authenticated subject and
//! serves the current status cache-aside.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod read_model;
pub mod service;

pub use api::{AppState, router};
pub use config::Config;
pub use error::ApiError;
pub use service::{ServiceError, SykmeldingStatusService};
