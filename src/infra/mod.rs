//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod notify;
pub mod render_client;
pub mod telemetry;
pub mod viewer;
pub mod workspace;
