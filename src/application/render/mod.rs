//! Render pipeline interface.
//!
//! The client boundary never fails: every attempt resolves to a
//! [`RenderResult`]. Internal error detail stays in the logs; callers only ever
//! see the fixed user-facing message.

mod types;

pub use types::{Artifact, RenderClient, RenderRequest, RenderResult};
