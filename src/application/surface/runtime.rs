use std::{sync::Arc, time::Duration};

use livepdf_protocol::{HostMessage, SurfaceMessage};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinSet},
};
use tracing::{Instrument, debug, error, info_span, warn};

use super::{DisplaySurface, SOURCE, SurfaceHandle, SurfaceTemplate, Viewer};
use crate::application::{
    debounce::Debouncer,
    options::OptionStore,
    render::{RenderClient, RenderRequest, RenderResult},
};
use crate::domain::{OptionChange, RenderConfig};

/// Everything a panel factory supplies to start a surface.
pub(crate) struct SurfaceParts {
    pub view_type: String,
    pub template: SurfaceTemplate,
    pub viewer: Box<dyn Viewer>,
    pub client: Arc<dyn RenderClient>,
    pub defaults: RenderConfig,
    pub debounce: Duration,
    pub scripts_enabled: bool,
}

struct Inbox {
    host: mpsc::UnboundedReceiver<String>,
    options: mpsc::UnboundedReceiver<OptionChange>,
    settled: mpsc::UnboundedReceiver<u64>,
    close: watch::Receiver<bool>,
}

struct SurfaceRuntime {
    surface: DisplaySurface,
    store: OptionStore,
    debouncer: Debouncer,
    client: Arc<dyn RenderClient>,
    settled_tx: mpsc::UnboundedSender<u64>,
    ticket: u64,
    generation: u64,
    inflight: JoinSet<(u64, RenderResult)>,
    scripts_enabled: bool,
}

/// Start the surface task and return the host's handle to it.
pub(crate) fn spawn_surface(parts: SurfaceParts) -> SurfaceHandle {
    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let (option_tx, option_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (settled_tx, settled_rx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = watch::channel(false);
    let (closed_tx, closed_rx) = watch::channel(false);

    let span = info_span!("surface", view_type = %parts.view_type);
    let runtime = SurfaceRuntime {
        surface: DisplaySurface::new(parts.template, parts.viewer, outbound_tx),
        store: OptionStore::new(parts.defaults),
        debouncer: Debouncer::new(parts.debounce),
        client: parts.client,
        settled_tx,
        ticket: 0,
        generation: 0,
        inflight: JoinSet::new(),
        scripts_enabled: parts.scripts_enabled,
    };
    let inbox = Inbox {
        host: host_rx,
        options: option_rx,
        settled: settled_rx,
        close: close_rx,
    };

    tokio::spawn(
        async move {
            runtime.run(inbox).await;
            closed_tx.send_replace(true);
        }
        .instrument(span),
    );

    SurfaceHandle::new(
        parts.view_type,
        host_tx,
        option_tx,
        outbound_rx,
        close_tx,
        closed_rx,
    )
}

/// Resolves once the close flag is raised; the watch guard is dropped before returning.
async fn closed(close: &mut watch::Receiver<bool>) {
    let _ = close.wait_for(|closed| *closed).await;
}

impl SurfaceRuntime {
    async fn run(mut self, mut inbox: Inbox) {
        if let Err(err) = self.surface.load().await {
            error!(target = SOURCE, op = "load", error = %err, "Failed to load surface template");
            self.surface.post_to_host(&SurfaceMessage::render_failed());
        }

        loop {
            tokio::select! {
                biased;
                _ = closed(&mut inbox.close) => break,
                raw = inbox.host.recv() => match raw {
                    Some(raw) => self.on_host_message(&raw),
                    None => break,
                },
                Some(change) = inbox.options.recv() => self.on_option_change(change),
                Some(ticket) = inbox.settled.recv() => self.on_settled(ticket),
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    self.on_render_finished(joined).await;
                }
            }
        }

        self.teardown();
    }

    fn on_host_message(&mut self, raw: &str) {
        if !self.scripts_enabled {
            debug!(target = SOURCE, "Scripts disabled; ignoring host message");
            return;
        }

        match HostMessage::decode(raw) {
            Ok(Some(message)) => {
                debug!(
                    target = SOURCE,
                    op = "host_message",
                    payload_bytes = message.payload().len(),
                    "Document payload received"
                );
                let (HostMessage::Load(payload) | HostMessage::Change(payload)) = message;
                self.store.set_payload(payload);
                self.render_now();
            }
            Ok(None) => debug!(target = SOURCE, raw = %raw, "Ignoring unknown host event"),
            Err(err) => warn!(target = SOURCE, error = %err, "Dropping malformed host message"),
        }
    }

    fn on_option_change(&mut self, change: OptionChange) {
        if !self.scripts_enabled {
            return;
        }

        debug!(target = SOURCE, op = "option_change", option = change.name(), "Option changed");
        self.store.apply(change);
        self.ticket += 1;
        let ticket = self.ticket;
        let settled = self.settled_tx.clone();
        self.debouncer.schedule(async move {
            let _ = settled.send(ticket);
        });
    }

    fn on_settled(&mut self, ticket: u64) {
        // A timer that fired before a newer change was queued is superseded.
        if ticket != self.ticket {
            debug!(target = SOURCE, ticket, latest = self.ticket, "Discarding superseded timer");
            return;
        }
        self.render_now();
    }

    fn render_now(&mut self) {
        self.generation += 1;
        let request = RenderRequest::new(self.generation, self.store.snapshot());
        let client = Arc::clone(&self.client);
        self.inflight.spawn(async move {
            let result = client.render(&request).await;
            (request.generation, result)
        });
    }

    async fn on_render_finished(&mut self, joined: Result<(u64, RenderResult), JoinError>) {
        let (generation, result) = match joined {
            Ok(finished) => finished,
            Err(err) if err.is_cancelled() => return,
            Err(err) => {
                error!(target = SOURCE, error = %err, "Render task failed");
                self.surface.post_to_host(&SurfaceMessage::render_failed());
                return;
            }
        };

        if generation != self.generation {
            debug!(
                target = SOURCE,
                generation,
                latest = self.generation,
                failed = result.is_failed(),
                "Discarding stale render result"
            );
            return;
        }

        match result {
            RenderResult::Rendered(artifact) => {
                if let Err(err) = self.surface.mount(&artifact).await {
                    warn!(target = SOURCE, op = "mount", error = %err, "Failed to mount preview");
                    self.surface.post_to_host(&SurfaceMessage::render_failed());
                }
            }
            RenderResult::Failed(message) => {
                self.surface
                    .post_to_host(&SurfaceMessage::FetchFailed(message));
            }
        }
    }

    fn teardown(&mut self) {
        let timer_cleared = self.debouncer.cancel();
        let inflight = self.inflight.len();
        self.inflight.abort_all();
        debug!(
            target = SOURCE,
            timer_cleared, inflight, "Surface closed"
        );
    }
}
