use livepdf_protocol::{HostMessage, SurfaceMessage};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::{SOURCE, SurfaceError};
use crate::domain::OptionChange;

/// Host-side handle to a running surface.
///
/// Mirrors the editor panel API: `post_message`, `on_did_receive_message` and
/// `dispose`. Dropping the handle also closes the surface.
#[derive(Debug)]
pub struct SurfaceHandle {
    view_type: String,
    host_tx: mpsc::UnboundedSender<String>,
    option_tx: mpsc::UnboundedSender<OptionChange>,
    messages: Option<mpsc::UnboundedReceiver<String>>,
    close_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
}

impl SurfaceHandle {
    pub(super) fn new(
        view_type: String,
        host_tx: mpsc::UnboundedSender<String>,
        option_tx: mpsc::UnboundedSender<OptionChange>,
        messages: mpsc::UnboundedReceiver<String>,
        close_tx: watch::Sender<bool>,
        closed_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            view_type,
            host_tx,
            option_tx,
            messages: Some(messages),
            close_tx,
            closed_rx,
        }
    }

    pub fn view_type(&self) -> &str {
        &self.view_type
    }

    pub fn post_message(&self, message: &HostMessage) -> Result<(), SurfaceError> {
        self.post_raw(message.encode()?)
    }

    /// Post an already-encoded message. The surface ignores unknown events.
    pub fn post_raw(&self, raw: impl Into<String>) -> Result<(), SurfaceError> {
        self.host_tx
            .send(raw.into())
            .map_err(|_| SurfaceError::Closed)
    }

    /// Feed an edit from the surface's option controls.
    pub fn set_option(&self, change: OptionChange) -> Result<(), SurfaceError> {
        self.option_tx
            .send(change)
            .map_err(|_| SurfaceError::Closed)
    }

    /// Take the stream of messages posted by the surface. Only the first call
    /// returns `Some`.
    pub fn on_did_receive_message(&mut self) -> Option<SurfaceMessages> {
        self.messages.take().map(|rx| SurfaceMessages { rx })
    }

    /// Close the surface. Pending timers and in-flight renders are dropped.
    pub fn dispose(&self) {
        self.close_tx.send_replace(true);
    }

    /// Resolves once the surface task has shut down.
    pub async fn closed(&self) {
        let mut closed = self.closed_rx.clone();
        let _ = closed.wait_for(|closed| *closed).await;
    }
}

/// Decoded view over the messages a surface posts to its host.
#[derive(Debug)]
pub struct SurfaceMessages {
    rx: mpsc::UnboundedReceiver<String>,
}

impl SurfaceMessages {
    /// Next known message; `None` once the surface is gone.
    pub async fn recv(&mut self) -> Option<SurfaceMessage> {
        while let Some(raw) = self.rx.recv().await {
            match SurfaceMessage::decode(&raw) {
                Ok(Some(message)) => return Some(message),
                Ok(None) => debug!(target = SOURCE, raw = %raw, "Ignoring unknown surface event"),
                Err(err) => warn!(target = SOURCE, error = %err, "Dropping malformed surface message"),
            }
        }
        None
    }
}
