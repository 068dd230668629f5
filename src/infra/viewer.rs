//! Viewer that renders the preview surface as an HTML page on disk.
//!
//! Each panel gets its own directory under the output root holding
//! `index.html` and, for blob artifacts, `preview.pdf`. Files are replaced
//! atomically so a browser reloading the page never sees a half-written PDF.

use std::{
    io::{self, ErrorKind, Write},
    path::PathBuf,
};

use askama::Template;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::application::{
    panel::PanelOptions,
    render::Artifact,
    surface::{MountError, PreviewElement, SurfaceTemplate, Viewer, ViewerProvider},
};

const SOURCE: &str = "infra::viewer";
const PAGE_FILE: &str = "index.html";
const PDF_FILE: &str = "preview.pdf";
const REFRESH_SECS: u64 = 2;

#[derive(Template)]
#[template(path = "preview.html")]
struct PreviewPage<'a> {
    title: &'a str,
    mount_id: &'a str,
    src: Option<&'a str>,
    refresh_secs: u64,
}

/// Opens a [`FileViewer`] per panel under `root`.
#[derive(Debug, Clone)]
pub struct FileViewerProvider {
    root: PathBuf,
}

impl FileViewerProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ViewerProvider for FileViewerProvider {
    fn open(&self, options: &PanelOptions) -> Result<Box<dyn Viewer>, MountError> {
        Ok(Box::new(FileViewer::new(self.root.join(options.view_type()))))
    }
}

#[derive(Debug, Clone)]
pub struct FileViewer {
    dir: PathBuf,
}

impl FileViewer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the page a browser should open.
    pub fn page_path(&self) -> PathBuf {
        self.dir.join(PAGE_FILE)
    }

    async fn write_page(
        &self,
        template: &SurfaceTemplate,
        src: Option<&str>,
    ) -> Result<(), MountError> {
        let page = PreviewPage {
            title: &template.title,
            mount_id: &template.mount_id,
            src,
            refresh_secs: REFRESH_SECS,
        }
        .render()
        .map_err(|err| MountError::Template(err.to_string()))?;

        write_atomic(self.dir.clone(), self.page_path(), Bytes::from(page)).await
    }
}

#[async_trait]
impl Viewer for FileViewer {
    async fn load(&self, template: &SurfaceTemplate) -> Result<(), MountError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        self.write_page(template, None).await?;
        debug!(target = SOURCE, op = "load", page = %self.page_path().display(), "Preview page written");
        Ok(())
    }

    async fn attach(
        &self,
        template: &SurfaceTemplate,
        artifact: &Artifact,
    ) -> Result<PreviewElement, MountError> {
        let src = match artifact {
            Artifact::Blob { bytes, .. } => {
                write_atomic(self.dir.clone(), self.dir.join(PDF_FILE), bytes.clone()).await?;
                PDF_FILE.to_string()
            }
            Artifact::Remote { url } => url.to_string(),
        };

        self.write_page(template, Some(&src)).await?;
        Ok(PreviewElement {
            id: template.mount_id.clone(),
            src,
        })
    }

    async fn detach(
        &self,
        template: &SurfaceTemplate,
        element: &PreviewElement,
    ) -> Result<(), MountError> {
        let page = match tokio::fs::read_to_string(self.page_path()).await {
            Ok(page) => page,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        if !page.contains(&format!("id=\"{}\"", element.id)) {
            return Err(MountError::MissingMountPoint {
                id: element.id.clone(),
            });
        }

        self.write_page(template, None).await?;
        if element.src == PDF_FILE {
            match tokio::fs::remove_file(self.dir.join(PDF_FILE)).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

async fn write_atomic(dir: PathBuf, target: PathBuf, contents: Bytes) -> Result<(), MountError> {
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix(".livepdf-")
            .tempfile_in(&dir)?;
        file.write_all(&contents)?;
        file.flush()?;
        file.persist(&target).map_err(|err| err.error)?;
        Ok(())
    })
    .await
    .map_err(io::Error::other)??;
    Ok(())
}
