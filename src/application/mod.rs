//! Preview session services: option state, debouncing, rendering, surfaces
//! and the coordinator tying them to a host.

pub mod commands;
pub mod debounce;
pub mod error;
pub mod host;
pub mod options;
pub mod panel;
pub mod render;
pub mod session;
pub mod surface;
