use async_trait::async_trait;
use thiserror::Error;

use crate::application::panel::PanelOptions;
use crate::application::render::Artifact;

/// Static content a surface loads when it is created.
///
/// Built from configuration and handed to the panel factory; every surface
/// created by that factory shares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceTemplate {
    /// Document title shown by the surface page.
    pub title: String,
    /// Id of the single element that holds the mounted preview.
    pub mount_id: String,
}

impl SurfaceTemplate {
    pub const DEFAULT_TITLE: &'static str = "Document";
    pub const DEFAULT_MOUNT_ID: &'static str = "pdfPreview";
}

impl Default for SurfaceTemplate {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            mount_id: Self::DEFAULT_MOUNT_ID.to_string(),
        }
    }
}

/// The element currently occupying the surface's mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewElement {
    pub id: String,
    /// Source the element loads: a local path for blobs, the remote URL otherwise.
    pub src: String,
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("mount point `{id}` is missing")]
    MissingMountPoint { id: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("template rendering failed: {0}")]
    Template(String),
}

/// Display backend behind a surface's single mount point.
#[async_trait]
pub trait Viewer: Send + Sync {
    /// Show the static template with an empty mount point.
    async fn load(&self, template: &SurfaceTemplate) -> Result<(), MountError>;

    /// Insert an element displaying `artifact` under `mount_id`.
    async fn attach(
        &self,
        template: &SurfaceTemplate,
        artifact: &Artifact,
    ) -> Result<PreviewElement, MountError>;

    /// Remove a previously attached element.
    async fn detach(
        &self,
        template: &SurfaceTemplate,
        element: &PreviewElement,
    ) -> Result<(), MountError>;
}

/// Creates one viewer per panel.
pub trait ViewerProvider: Send + Sync {
    fn open(&self, options: &PanelOptions) -> Result<Box<dyn Viewer>, MountError>;
}
