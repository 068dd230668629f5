//! Panel factory: turns a titled panel request into a running preview surface.

use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::application::{
    debounce::DEFAULT_DEBOUNCE,
    render::RenderClient,
    surface::{SurfaceError, SurfaceHandle, SurfaceParts, SurfaceTemplate, ViewerProvider, spawn_surface},
};
use crate::domain::RenderConfig;

/// Editor column a panel opens in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewColumn {
    Active,
    One,
    #[default]
    Two,
    Three,
}

/// Placement and capabilities requested for a new panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    pub title: String,
    pub column: ViewColumn,
    pub preserve_focus: bool,
    pub enable_scripts: bool,
}

impl PanelOptions {
    /// Options for a live preview: beside the editor, without stealing focus,
    /// scripts enabled.
    pub fn preview(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            column: ViewColumn::Two,
            preserve_focus: true,
            enable_scripts: true,
        }
    }

    /// Panel type identifier: the title with spaces replaced by dashes.
    pub fn view_type(&self) -> String {
        self.title.split(' ').collect::<Vec<_>>().join("-")
    }
}

/// Host facility that creates display surfaces.
pub trait PanelFactory: Send + Sync {
    fn create_panel(&self, options: PanelOptions) -> Result<SurfaceHandle, SurfaceError>;
}

/// Factory for surfaces that render through a [`RenderClient`] and display
/// through viewers from a [`ViewerProvider`].
pub struct PreviewPanelFactory {
    template: SurfaceTemplate,
    viewers: Arc<dyn ViewerProvider>,
    client: Arc<dyn RenderClient>,
    defaults: RenderConfig,
    debounce: Duration,
}

impl PreviewPanelFactory {
    pub fn new(
        template: SurfaceTemplate,
        viewers: Arc<dyn ViewerProvider>,
        client: Arc<dyn RenderClient>,
    ) -> Self {
        Self {
            template,
            viewers,
            client,
            defaults: RenderConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Initial option values for every surface this factory creates.
    pub fn with_defaults(mut self, defaults: RenderConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

impl PanelFactory for PreviewPanelFactory {
    fn create_panel(&self, options: PanelOptions) -> Result<SurfaceHandle, SurfaceError> {
        let viewer = self.viewers.open(&options)?;
        let view_type = options.view_type();

        info!(
            target = "application::panel",
            op = "create_panel",
            view_type = %view_type,
            title = %options.title,
            column = ?options.column,
            preserve_focus = options.preserve_focus,
            scripts = options.enable_scripts,
            "Preview panel created"
        );

        Ok(spawn_surface(SurfaceParts {
            view_type,
            template: self.template.clone(),
            viewer,
            client: Arc::clone(&self.client),
            defaults: self.defaults.clone(),
            debounce: self.debounce,
            scripts_enabled: options.enable_scripts,
        }))
    }
}
