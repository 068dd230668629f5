//! Contracts the preview core needs from its host editor.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::panel::PanelFactory;
use crate::domain::DocumentPayload;

/// Supplies the text of the document open in the editor.
pub trait ActiveDocument: Send + Sync {
    fn active_document(&self) -> Option<DocumentPayload>;
}

/// Stream of document contents, one item per save.
///
/// Each call opens an independent subscription; dropping the receiver
/// releases it.
pub trait SaveEvents: Send + Sync {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<DocumentPayload>;
}

/// User-visible error notifications.
pub trait NotificationSink: Send + Sync {
    fn show_error(&self, message: &str);
}

/// The host collaborators a preview session is wired to.
#[derive(Clone)]
pub struct HostContext {
    pub documents: Arc<dyn ActiveDocument>,
    pub saves: Arc<dyn SaveEvents>,
    pub notifications: Arc<dyn NotificationSink>,
    pub panels: Arc<dyn PanelFactory>,
}
