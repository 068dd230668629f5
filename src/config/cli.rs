use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the livepdf binary.
#[derive(Debug, Parser)]
#[command(name = "livepdf", version, about = "Live PDF preview for text documents")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "LIVEPDF_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Watch a document and keep its PDF preview up to date.
    Preview(PreviewArgs),
    /// Render a document once and write the PDF to disk.
    Render(RenderArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub overrides: PreviewOverrides,

    /// Document to preview.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Document to render.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Where to write the PDF.
    #[arg(long, short, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the render service URL.
    #[arg(long = "render-endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// Override the URL of the rendered PDF for acknowledging services.
    #[arg(long = "render-artifact-url", value_name = "URL")]
    pub artifact_url: Option<String>,

    /// Initial orientation (portrait|landscape).
    #[arg(long = "orientation", value_name = "ORIENTATION")]
    pub orientation: Option<String>,

    /// Initial page size (A4|A5|F4|Custom).
    #[arg(long = "page-size", value_name = "SIZE")]
    pub page_size: Option<String>,

    /// Custom page size, passed to the service as is.
    #[arg(long = "custom-size", value_name = "SIZE")]
    pub custom_size: Option<String>,

    /// Render engine (chromium|wkhtmltopdf|weasyprint).
    #[arg(long = "engine", value_name = "ENGINE")]
    pub engine: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PreviewOverrides {
    #[command(flatten)]
    pub render: RenderOverrides,

    /// Override the preview panel title.
    #[arg(long = "title", value_name = "TITLE")]
    pub title: Option<String>,

    /// Override the option-change quiet period in milliseconds.
    #[arg(long = "debounce-ms", value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Override the directory the preview page is written to.
    #[arg(long = "output-dir", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,
}
