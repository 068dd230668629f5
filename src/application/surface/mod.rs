//! Preview surfaces: an isolated task that owns the option controls, the render
//! pipeline and one mount point, reachable from the host only through JSON
//! messages.

mod handle;
mod runtime;
mod viewer;

use livepdf_protocol::{MessageError, SurfaceMessage};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::render::Artifact;

pub use handle::{SurfaceHandle, SurfaceMessages};
pub(crate) use runtime::{SurfaceParts, spawn_surface};
pub use viewer::{MountError, PreviewElement, SurfaceTemplate, Viewer, ViewerProvider};

const SOURCE: &str = "application::surface";

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface is closed")]
    Closed,
    #[error("failed to encode message: {0}")]
    Message(#[from] MessageError),
    #[error("failed to open viewer: {0}")]
    Viewer(#[from] MountError),
}

/// Mount point and outbound port of one surface.
///
/// At most one element is mounted at a time: `mount` always unmounts first.
pub struct DisplaySurface {
    template: SurfaceTemplate,
    viewer: Box<dyn Viewer>,
    mounted: Option<PreviewElement>,
    outbound: mpsc::UnboundedSender<String>,
}

impl DisplaySurface {
    pub fn new(
        template: SurfaceTemplate,
        viewer: Box<dyn Viewer>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            template,
            viewer,
            mounted: None,
            outbound,
        }
    }

    pub async fn load(&self) -> Result<(), MountError> {
        self.viewer.load(&self.template).await
    }

    /// Replace whatever is mounted with `artifact`.
    pub async fn mount(&mut self, artifact: &Artifact) -> Result<(), MountError> {
        self.unmount().await?;
        let element = self.viewer.attach(&self.template, artifact).await?;
        debug!(
            target = SOURCE,
            op = "mount",
            artifact = artifact.kind(),
            src = %element.src,
            "Preview mounted"
        );
        self.mounted = Some(element);
        Ok(())
    }

    /// Remove the mounted element, if any. Calling it twice is harmless.
    pub async fn unmount(&mut self) -> Result<(), MountError> {
        if let Some(element) = self.mounted.take() {
            self.viewer.detach(&self.template, &element).await?;
        }
        Ok(())
    }

    /// Fire-and-forget post to the host. Messages keep their send order.
    pub fn post_to_host(&self, message: &SurfaceMessage) {
        let encoded = match message.encode() {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(target = SOURCE, op = "post_to_host", error = %err, "Dropping unencodable message");
                return;
            }
        };
        if self.outbound.send(encoded).is_err() {
            debug!(target = SOURCE, op = "post_to_host", "Host stopped listening");
        }
    }
}
