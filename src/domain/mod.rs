//! Domain layer types and invariants.

pub mod document;
pub mod error;
pub mod options;

pub use document::DocumentPayload;
pub use options::{OptionChange, RenderConfig};

pub use livepdf_protocol::{Engine, Orientation, PageSize};
