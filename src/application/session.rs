//! Preview session coordinator.
//!
//! A session owns one preview surface for its whole life:
//!
//! ```text
//! Idle --open--> Initializing --load posted, saves subscribed--> Active --close--> Disposed
//! ```
//!
//! While active, saves are forwarded to the surface as `change` events and
//! every `fetch-failed` report from the surface is shown to the user verbatim.

use std::sync::{Arc, Mutex, Weak};

use livepdf_protocol::{HostMessage, SurfaceMessage};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::application::{
    host::{HostContext, NotificationSink},
    panel::PanelOptions,
    surface::{SurfaceError, SurfaceHandle, SurfaceMessages},
};
use crate::domain::{DocumentPayload, OptionChange};
use crate::util::lock::mutex_lock;

const SOURCE: &str = "application::session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Panel not created yet.
    Idle,
    /// Panel created; initial document not yet posted.
    Initializing,
    /// Forwarding document and option changes to the surface.
    Active,
    /// Surface closed; listeners and timers torn down.
    Disposed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

pub struct PreviewSession {
    id: Uuid,
    host: HostContext,
    panel_options: PanelOptions,
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<SessionInner>,
    closed: watch::Sender<bool>,
}

struct SessionInner {
    state: SessionState,
    panel: Option<Arc<SurfaceHandle>>,
    relays: Vec<JoinHandle<()>>,
}

impl PreviewSession {
    pub fn new(host: HostContext, panel_options: PanelOptions) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            host,
            panel_options,
            shared: Arc::new(Shared {
                inner: Mutex::new(SessionInner {
                    state: SessionState::Idle,
                    panel: None,
                    relays: Vec::new(),
                }),
                closed,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        mutex_lock(&self.shared.inner, SOURCE, "state").state
    }

    /// Create the surface, post the active document and start relaying saves
    /// and failure reports.
    pub fn open(&self) -> Result<(), SessionError> {
        let mut inner = mutex_lock(&self.shared.inner, SOURCE, "open");
        if inner.state != SessionState::Idle {
            return Err(SessionError::InvalidState {
                expected: SessionState::Idle,
                actual: inner.state,
            });
        }
        inner.state = SessionState::Initializing;

        let (panel, messages) = match self.start_surface() {
            Ok(started) => started,
            Err(err) => {
                inner.state = SessionState::Disposed;
                drop(inner);
                self.shared.closed.send_replace(true);
                return Err(err);
            }
        };

        let span = info_span!("session", id = %self.id);
        let saves = self.host.saves.subscribe();
        inner.relays.push(tokio::spawn(
            relay_saves(saves, Arc::clone(&panel)).instrument(span.clone()),
        ));
        inner.relays.push(tokio::spawn(
            relay_failures(
                messages,
                Arc::clone(&self.host.notifications),
                Arc::downgrade(&self.shared),
            )
            .instrument(span),
        ));
        inner.panel = Some(panel);
        inner.state = SessionState::Active;

        info!(
            target = SOURCE,
            op = "open",
            session_id = %self.id,
            title = %self.panel_options.title,
            "Preview session active"
        );
        Ok(())
    }

    fn start_surface(&self) -> Result<(Arc<SurfaceHandle>, SurfaceMessages), SessionError> {
        let mut panel = self.host.panels.create_panel(self.panel_options.clone())?;
        let messages = panel
            .on_did_receive_message()
            .ok_or(SessionError::Surface(SurfaceError::Closed))?;

        if let Some(document) = self.host.documents.active_document() {
            panel.post_message(&HostMessage::Load(document.as_str().to_string()))?;
        } else {
            debug!(target = SOURCE, "No active document; waiting for the first save");
        }

        Ok((Arc::new(panel), messages))
    }

    /// Route an edit from the surface's option controls. Debounced by the surface.
    pub fn set_option(&self, change: OptionChange) -> Result<(), SessionError> {
        let inner = mutex_lock(&self.shared.inner, SOURCE, "set_option");
        match (&inner.state, inner.panel.as_ref()) {
            (SessionState::Active, Some(panel)) => Ok(panel.set_option(change)?),
            (state, _) => Err(SessionError::InvalidState {
                expected: SessionState::Active,
                actual: *state,
            }),
        }
    }

    /// Close the surface and release every subscription. Idempotent.
    pub fn dispose(&self) {
        self.shared.teardown("disposed");
    }

    /// Resolves once the session reaches [`SessionState::Disposed`].
    pub async fn closed(&self) {
        let mut closed = self.shared.closed.subscribe();
        let _ = closed.wait_for(|closed| *closed).await;
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.shared.teardown("dropped");
    }
}

impl Shared {
    fn teardown(&self, reason: &'static str) {
        let mut inner = mutex_lock(&self.inner, SOURCE, "teardown");
        if inner.state == SessionState::Disposed {
            return;
        }

        for relay in inner.relays.drain(..) {
            relay.abort();
        }
        if let Some(panel) = inner.panel.take() {
            panel.dispose();
        }
        inner.state = SessionState::Disposed;
        drop(inner);

        self.closed.send_replace(true);
        info!(target = SOURCE, op = "dispose", reason, "Preview session disposed");
    }
}

async fn relay_saves(
    mut saves: mpsc::UnboundedReceiver<DocumentPayload>,
    panel: Arc<SurfaceHandle>,
) {
    while let Some(payload) = saves.recv().await {
        debug!(target = SOURCE, op = "relay_save", bytes = payload.len(), "Document saved");
        if panel
            .post_message(&HostMessage::Change(payload.as_str().to_string()))
            .is_err()
        {
            break;
        }
    }
}

async fn relay_failures(
    mut messages: SurfaceMessages,
    notifications: Arc<dyn NotificationSink>,
    shared: Weak<Shared>,
) {
    while let Some(message) = messages.recv().await {
        match message {
            SurfaceMessage::FetchFailed(text) => notifications.show_error(&text),
        }
    }

    // The surface went away on its own: the user closed it.
    if let Some(shared) = shared.upgrade() {
        shared.teardown("surface_closed");
    }
}
