use async_trait::async_trait;
use bytes::Bytes;
use livepdf_protocol::{RENDER_FAILED_MESSAGE, RenderPayload};
use url::Url;

use crate::application::options::OptionSnapshot;
use crate::domain::{DocumentPayload, RenderConfig};

/// One render attempt. Built fresh from an option snapshot and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Monotonic per-surface counter; only the newest generation may be mounted.
    pub generation: u64,
    pub config: RenderConfig,
    pub payload: DocumentPayload,
}

impl RenderRequest {
    pub fn new(generation: u64, snapshot: OptionSnapshot) -> Self {
        Self {
            generation,
            config: snapshot.config,
            payload: snapshot.payload,
        }
    }

    /// Wire body for the render endpoint.
    pub fn to_payload(&self) -> RenderPayload<'_> {
        RenderPayload {
            orientation: self.config.orientation,
            size: self.config.page_size,
            size_custom: self.config.effective_custom_size(),
            engine: self.config.engine,
            body: self.payload.as_str(),
        }
    }
}

/// Rendered PDF, in whichever shape the backend answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// PDF bytes returned directly in the response body.
    Blob { bytes: Bytes, content_type: String },
    /// Location the surface loads the PDF from itself.
    Remote { url: Url },
}

impl Artifact {
    pub fn pdf(bytes: impl Into<Bytes>) -> Self {
        Artifact::Blob {
            bytes: bytes.into(),
            content_type: "application/pdf".to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Blob { .. } => "blob",
            Artifact::Remote { .. } => "remote",
        }
    }
}

/// Outcome of a render attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    Rendered(Artifact),
    /// User-facing failure text.
    Failed(String),
}

impl RenderResult {
    pub fn failed() -> Self {
        RenderResult::Failed(RENDER_FAILED_MESSAGE.to_string())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RenderResult::Failed(_))
    }
}

/// Issues render requests to a backend. Implementations make exactly one
/// attempt per call and never retry.
#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> RenderResult;
}
