use std::{process, sync::Arc, time::Instant};

use livepdf::{
    application::{
        commands::{Extension, LIVE_PREVIEW_COMMAND},
        error::AppError,
        host::HostContext,
        options::OptionStore,
        panel::{PanelOptions, PreviewPanelFactory},
        render::RenderRequest,
        session::PreviewSession,
    },
    config::{self, Command, PreviewArgs, RenderArgs, Settings},
    domain::OptionChange,
    infra::{
        error::InfraError, notify::StderrNotifier, render_client::HttpRenderClient, telemetry,
        viewer::FileViewerProvider, workspace::FileWorkspace,
    },
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error.chain();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Preview(args) => run_preview(settings, args).await,
        Command::Render(args) => run_render(settings, args).await,
    }
}

async fn run_preview(settings: Settings, args: PreviewArgs) -> Result<(), AppError> {
    let preview = settings.preview;
    let client = Arc::new(HttpRenderClient::new(&settings.render)?);
    let viewers = Arc::new(FileViewerProvider::new(&preview.output_dir));
    let panels = PreviewPanelFactory::new(preview.template.clone(), viewers, client)
        .with_defaults(preview.defaults.clone())
        .with_debounce(preview.debounce);
    let workspace = Arc::new(FileWorkspace::open(&args.file).await?);

    let host = HostContext {
        documents: workspace.clone(),
        saves: workspace,
        notifications: Arc::new(StderrNotifier),
        panels: Arc::new(panels),
    };

    let extension = Extension::activate(host, preview.template.title.clone());
    let session = extension.execute(LIVE_PREVIEW_COMMAND)?;

    let page = preview
        .output_dir
        .join(PanelOptions::preview(preview.template.title.as_str()).view_type())
        .join("index.html");
    info!(
        document = %args.file.display(),
        page = %page.display(),
        "Live preview running; open the page in a browser"
    );

    let outcome = drive_session(&session).await;
    extension.deactivate();
    outcome
}

/// Feed option lines from stdin to the session until it closes, the user
/// quits, or the process is interrupted.
async fn drive_session(session: &PreviewSession) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
            _ = session.closed() => return Ok(()),
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.map_err(InfraError::from)? else {
                    stdin_open = false;
                    continue;
                };
                let line = line.trim();
                match line {
                    "" => {}
                    "quit" | "exit" => return Ok(()),
                    _ => match line.parse::<OptionChange>() {
                        Ok(change) => session.set_option(change)?,
                        Err(err) => warn!(input = line, error = %err, "Ignoring option input"),
                    },
                }
            }
        }
    }
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let started_at = Instant::now();
    let client = HttpRenderClient::new(&settings.render)?;
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(InfraError::from)?;

    let mut store = OptionStore::new(settings.preview.defaults);
    store.set_payload(text);
    let request = RenderRequest::new(1, store.snapshot());

    let artifact = client.try_render(&request).await?;
    let bytes = client.fetch(&artifact).await?;
    tokio::fs::write(&args.output, &bytes)
        .await
        .map_err(InfraError::from)?;

    info!(
        output = %args.output.display(),
        artifact = artifact.kind(),
        bytes = bytes.len(),
        elapsed_ms = started_at.elapsed().as_millis() as u64,
        "PDF written"
    );
    Ok(())
}
