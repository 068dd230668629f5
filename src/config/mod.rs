//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{num::NonZeroU64, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::surface::SurfaceTemplate;
use crate::domain::{Engine, Orientation, PageSize, RenderConfig};

pub use cli::{CliArgs, Command, PreviewArgs, PreviewOverrides, RenderArgs, RenderOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "livepdf";
const DEFAULT_TITLE: &str = "Preview";
const DEFAULT_DEBOUNCE_MS: u64 = 800;
const DEFAULT_OUTPUT_DIR: &str = "livepdf-preview";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub preview: PreviewSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub endpoint: Url,
    /// Where to fetch the PDF when the service only acknowledges a render.
    pub artifact_url: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct PreviewSettings {
    pub template: SurfaceTemplate,
    pub debounce: Duration,
    pub output_dir: PathBuf,
    pub defaults: RenderConfig,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("LIVEPDF").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Preview(args) => raw.apply_preview_overrides(&args.overrides),
        Command::Render(args) => raw.apply_render_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    preview: RawPreviewSettings,
}

impl RawSettings {
    fn apply_preview_overrides(&mut self, overrides: &PreviewOverrides) {
        self.apply_render_overrides(&overrides.render);

        if let Some(title) = overrides.title.as_ref() {
            self.preview.title = Some(title.clone());
        }
        if let Some(ms) = overrides.debounce_ms {
            self.preview.debounce_ms = Some(ms);
        }
        if let Some(dir) = overrides.output_dir.as_ref() {
            self.preview.output_dir = Some(dir.clone());
        }
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(endpoint) = overrides.endpoint.as_ref() {
            self.render.endpoint = Some(endpoint.clone());
        }
        if let Some(url) = overrides.artifact_url.as_ref() {
            self.render.artifact_url = Some(url.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(orientation) = overrides.orientation.as_ref() {
            self.preview.orientation = Some(orientation.clone());
        }
        if let Some(size) = overrides.page_size.as_ref() {
            self.preview.page_size = Some(size.clone());
        }
        if let Some(custom) = overrides.custom_size.as_ref() {
            self.preview.custom_size = Some(custom.clone());
        }
        if let Some(engine) = overrides.engine.as_ref() {
            self.preview.engine = Some(engine.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            render,
            preview,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            render: build_render_settings(render)?,
            preview: build_preview_settings(preview)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let endpoint = match non_empty(render.endpoint) {
        Some(endpoint) => parse_url(&endpoint, "render.endpoint")?,
        None => {
            return Err(LoadError::invalid(
                "render.endpoint",
                "a render service URL is required",
            ));
        }
    };

    let artifact_url = non_empty(render.artifact_url)
        .map(|value| parse_url(&value, "render.artifact_url"))
        .transpose()?;

    Ok(RenderSettings {
        endpoint,
        artifact_url,
    })
}

fn build_preview_settings(preview: RawPreviewSettings) -> Result<PreviewSettings, LoadError> {
    let title = non_empty(preview.title).unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let mount_id = non_empty(preview.mount_id)
        .unwrap_or_else(|| SurfaceTemplate::DEFAULT_MOUNT_ID.to_string());
    if mount_id.contains(char::is_whitespace) {
        return Err(LoadError::invalid(
            "preview.mount_id",
            "element id must not contain whitespace",
        ));
    }

    let debounce = non_zero_u64(
        preview.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
        "preview.debounce_ms",
    )?;

    let output_dir = preview
        .output_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    if output_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "preview.output_dir",
            "path must not be empty",
        ));
    }

    let defaults = RenderConfig {
        orientation: parse_option::<Orientation>(preview.orientation, "preview.orientation")?
            .unwrap_or_default(),
        page_size: parse_option::<PageSize>(preview.page_size, "preview.page_size")?
            .unwrap_or_default(),
        custom_size: non_empty(preview.custom_size),
        engine: parse_option::<Engine>(preview.engine, "preview.engine")?,
    };

    Ok(PreviewSettings {
        template: SurfaceTemplate { title, mount_id },
        debounce: Duration::from_millis(debounce.get()),
        output_dir,
        defaults,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    endpoint: Option<String>,
    artifact_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPreviewSettings {
    title: Option<String>,
    mount_id: Option<String>,
    debounce_ms: Option<u64>,
    output_dir: Option<PathBuf>,
    orientation: Option<String>,
    page_size: Option<String>,
    custom_size: Option<String>,
    engine: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{scheme}`"),
        )),
    }
}

fn parse_option<T>(value: Option<String>, key: &'static str) -> Result<Option<T>, LoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(value)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| LoadError::invalid(key, err.to_string()))
        })
        .transpose()
}

fn non_zero_u64(value: u64, key: &'static str) -> Result<NonZeroU64, LoadError> {
    NonZeroU64::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[cfg(test)]
mod tests;
