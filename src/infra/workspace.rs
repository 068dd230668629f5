//! File-backed host document: the file on disk is the active document and
//! every completed write to it counts as a save.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::error::InfraError;
use crate::application::host::{ActiveDocument, SaveEvents};
use crate::domain::DocumentPayload;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "infra::workspace";

#[derive(Default)]
struct Shared {
    latest: Mutex<Option<DocumentPayload>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DocumentPayload>>>,
}

impl Shared {
    /// Record one save and hand it to every live subscriber.
    fn publish(&self, payload: DocumentPayload) {
        *mutex_lock(&self.latest, SOURCE, "publish_latest") = Some(payload.clone());

        let mut subscribers = mutex_lock(&self.subscribers, SOURCE, "publish");
        subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
        debug!(
            target = SOURCE,
            bytes = payload.len(),
            subscribers = subscribers.len(),
            "Save detected"
        );
    }
}

/// Watches one file through the platform's change notifications.
///
/// The watcher observes the parent directory so that editors replacing the
/// file by rename are seen as well. Dropping the workspace stops watching.
pub struct FileWorkspace {
    shared: Arc<Shared>,
    _watcher: Mutex<RecommendedWatcher>,
}

impl FileWorkspace {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfraError> {
        let path = path.into();
        let shared = Arc::new(Shared::default());

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => *mutex_lock(&shared.latest, SOURCE, "open") = Some(text.into()),
            Err(err) => warn!(
                target = SOURCE,
                path = %path.display(),
                error = %err,
                "Failed to read document"
            ),
        }

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path.file_name().map(|name| name.to_os_string());

        let mut watcher = notify::recommended_watcher({
            let shared = Arc::clone(&shared);
            let path = path.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_save(&event.kind) && touches(&event, name.as_ref()) => {
                    if let Some(payload) = read_document(&path) {
                        shared.publish(payload);
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(target = SOURCE, error = %err, "File watch error"),
            }
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!(target = SOURCE, path = %path.display(), "Watching document");

        Ok(Self {
            shared,
            _watcher: Mutex::new(watcher),
        })
    }
}

/// Events that mark a finished write. Linux reports the close of a written
/// file; other platforms only report modifications.
#[cfg(target_os = "linux")]
fn is_save(kind: &EventKind) -> bool {
    use notify::event::{AccessKind, AccessMode};

    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

#[cfg(not(target_os = "linux"))]
fn is_save(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

fn touches(event: &Event, name: Option<&OsString>) -> bool {
    event
        .paths
        .iter()
        .any(|path| path.file_name() == name.map(OsString::as_os_str))
}

/// Runs on the watcher's own thread, never on the async runtime.
fn read_document(path: &Path) -> Option<DocumentPayload> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(DocumentPayload::from(text)),
        Err(err) => {
            warn!(
                target = SOURCE,
                path = %path.display(),
                error = %err,
                "Failed to read document"
            );
            None
        }
    }
}

impl ActiveDocument for FileWorkspace {
    fn active_document(&self) -> Option<DocumentPayload> {
        mutex_lock(&self.shared.latest, SOURCE, "active_document").clone()
    }
}

impl SaveEvents for FileWorkspace {
    /// One payload per save; the subscription is released once the receiver
    /// is dropped and the next save finds it closed.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<DocumentPayload> {
        let (tx, rx) = mpsc::unbounded_channel();
        mutex_lock(&self.shared.subscribers, SOURCE, "subscribe").push(tx);
        rx
    }
}
