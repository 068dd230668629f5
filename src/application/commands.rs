//! Command registration for the editor extension.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::application::{
    host::HostContext,
    panel::PanelOptions,
    session::{PreviewSession, SessionError, SessionState},
};
use crate::util::lock::mutex_lock;

/// Identifier of the "open live preview" command.
pub const LIVE_PREVIEW_COMMAND: &str = "livepdf.live-preview";

const SOURCE: &str = "application::commands";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Activated extension: owns the registered command and every session it has
/// opened.
pub struct Extension {
    host: HostContext,
    title: String,
    sessions: Mutex<Vec<Arc<PreviewSession>>>,
}

impl Extension {
    pub fn activate(host: HostContext, title: impl Into<String>) -> Self {
        let title = title.into();
        info!(target = SOURCE, command = LIVE_PREVIEW_COMMAND, title = %title, "Extension activated");
        Self {
            host,
            title,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> &'static [&'static str] {
        &[LIVE_PREVIEW_COMMAND]
    }

    /// Run a registered command. Every invocation of the preview command opens
    /// a new session.
    pub fn execute(&self, command: &str) -> Result<Arc<PreviewSession>, CommandError> {
        if command != LIVE_PREVIEW_COMMAND {
            warn!(target = SOURCE, command, "Unknown command");
            return Err(CommandError::Unknown(command.to_string()));
        }

        let session = Arc::new(PreviewSession::new(
            self.host.clone(),
            PanelOptions::preview(self.title.clone()),
        ));
        session.open()?;

        let mut sessions = mutex_lock(&self.sessions, SOURCE, "execute");
        sessions.retain(|session| session.state() != SessionState::Disposed);
        sessions.push(Arc::clone(&session));
        Ok(session)
    }

    /// Sessions that have not been disposed yet.
    pub fn sessions(&self) -> Vec<Arc<PreviewSession>> {
        mutex_lock(&self.sessions, SOURCE, "sessions")
            .iter()
            .filter(|session| session.state() != SessionState::Disposed)
            .cloned()
            .collect()
    }

    /// Dispose every open session.
    pub fn deactivate(&self) {
        let sessions = std::mem::take(&mut *mutex_lock(&self.sessions, SOURCE, "deactivate"));
        let count = sessions.len();
        for session in sessions {
            session.dispose();
        }
        info!(target = SOURCE, sessions = count, "Extension deactivated");
    }
}

impl Drop for Extension {
    fn drop(&mut self) {
        self.deactivate();
    }
}
