//! HTTP client for the remote render service.

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use livepdf_protocol::RenderAck;
use metrics::{counter, histogram};
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::application::render::{Artifact, RenderClient, RenderRequest, RenderResult};
use crate::config::RenderSettings;

use super::error::InfraError;

pub(crate) const METRIC_RENDER_REQUESTS_TOTAL: &str = "livepdf_render_requests_total";
pub(crate) const METRIC_RENDER_MS: &str = "livepdf_render_ms";

const SOURCE: &str = "infra::render_client";
const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";
const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";
const ERROR_BODY_PREVIEW_BYTES: usize = 512;

/// Why a render attempt failed. Logged only; users see the fixed failure text.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize render payload: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("render request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("render service answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unrecognised render response: {0}")]
    Protocol(String),
}

impl RenderError {
    fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Metric label for the failure class.
    pub fn result_label(&self) -> &'static str {
        match self {
            RenderError::Serialize(_) => "serialize",
            RenderError::Transport(_) => "transport",
            RenderError::Status { .. } => "status",
            RenderError::Protocol(_) => "protocol",
        }
    }
}

/// Posts render requests as JSON and resolves the response into an [`Artifact`].
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: Client,
    endpoint: Url,
    artifact_url: Option<Url>,
}

impl HttpRenderClient {
    pub fn new(settings: &RenderSettings) -> Result<Self, InfraError> {
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            artifact_url: settings.artifact_url.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("livepdf/", env!("CARGO_PKG_VERSION"))
    }

    /// One render attempt with the failure cause intact.
    pub async fn try_render(&self, request: &RenderRequest) -> Result<Artifact, RenderError> {
        let body = serde_json::to_vec(&request.to_payload()).map_err(RenderError::Serialize)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(RenderError::Status {
                status,
                body: body_preview(&bytes),
            });
        }

        self.classify(content_type.as_deref(), bytes)
    }

    fn classify(&self, content_type: Option<&str>, bytes: Bytes) -> Result<Artifact, RenderError> {
        let is_pdf_type = content_type.is_some_and(|value| {
            value
                .split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        });
        if is_pdf_type || bytes.starts_with(PDF_MAGIC) {
            return Ok(Artifact::Blob {
                bytes,
                content_type: PDF_CONTENT_TYPE.to_string(),
            });
        }

        let ack: RenderAck = serde_json::from_slice(&bytes).map_err(|err| {
            RenderError::protocol(format!("expected a PDF or a JSON acknowledgement: {err}"))
        })?;

        match ack.artifact_location() {
            Some(location) => {
                let url = self.endpoint.join(location).map_err(|err| {
                    RenderError::protocol(format!("invalid artifact URL `{location}`: {err}"))
                })?;
                Ok(Artifact::Remote { url })
            }
            None => self
                .artifact_url
                .clone()
                .map(|url| Artifact::Remote { url })
                .ok_or_else(|| RenderError::protocol("acknowledgement carried no artifact URL")),
        }
    }

    /// PDF bytes for an artifact, downloading remote ones.
    pub async fn fetch(&self, artifact: &Artifact) -> Result<Bytes, RenderError> {
        match artifact {
            Artifact::Blob { bytes, .. } => Ok(bytes.clone()),
            Artifact::Remote { url } => {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                let bytes = response.bytes().await?;
                if !status.is_success() {
                    return Err(RenderError::Status {
                        status,
                        body: body_preview(&bytes),
                    });
                }
                Ok(bytes)
            }
        }
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn render(&self, request: &RenderRequest) -> RenderResult {
        let started_at = Instant::now();
        let outcome = self.try_render(request).await;
        let elapsed = started_at.elapsed();
        histogram!(METRIC_RENDER_MS).record(elapsed.as_secs_f64() * 1000.0);

        match outcome {
            Ok(artifact) => {
                counter!(METRIC_RENDER_REQUESTS_TOTAL, "result" => "ok").increment(1);
                info!(
                    target = SOURCE,
                    op = "render",
                    generation = request.generation,
                    artifact = artifact.kind(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "PDF rendered"
                );
                RenderResult::Rendered(artifact)
            }
            Err(err) => {
                counter!(METRIC_RENDER_REQUESTS_TOTAL, "result" => err.result_label()).increment(1);
                warn!(
                    target = SOURCE,
                    op = "render",
                    generation = request.generation,
                    result = err.result_label(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "PDF render failed"
                );
                RenderResult::failed()
            }
        }
    }
}

fn body_preview(bytes: &[u8]) -> String {
    let end = bytes.len().min(ERROR_BODY_PREVIEW_BYTES);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(artifact_url: Option<&str>) -> HttpRenderClient {
        HttpRenderClient::new(&RenderSettings {
            endpoint: Url::parse("https://render.example.test/api/pdf/render").expect("url"),
            artifact_url: artifact_url.map(|url| Url::parse(url).expect("url")),
        })
        .expect("client")
    }

    #[test]
    fn pdf_content_type_is_a_blob() {
        let artifact = client(None)
            .classify(Some("application/pdf; charset=binary"), Bytes::from_static(b"bytes"))
            .expect("blob");
        assert_eq!(artifact.kind(), "blob");
    }

    #[test]
    fn pdf_magic_is_a_blob_whatever_the_header() {
        let artifact = client(None)
            .classify(Some("application/octet-stream"), Bytes::from_static(b"%PDF-1.7\n"))
            .expect("blob");
        assert_eq!(artifact, Artifact::pdf(Bytes::from_static(b"%PDF-1.7\n")));
    }

    #[test]
    fn acknowledgement_url_resolves_against_the_endpoint() {
        let artifact = client(None)
            .classify(
                Some("application/json"),
                Bytes::from_static(br#"{"location":"/storage/public/fly.pdf"}"#),
            )
            .expect("remote");
        assert_eq!(
            artifact,
            Artifact::Remote {
                url: Url::parse("https://render.example.test/storage/public/fly.pdf").expect("url"),
            }
        );
    }

    #[test]
    fn bare_acknowledgement_uses_the_configured_artifact() {
        let artifact = client(Some("https://cdn.example.test/fly.pdf"))
            .classify(Some("application/json"), Bytes::from_static(br#"{"status":"ok"}"#))
            .expect("remote");
        assert_eq!(artifact.kind(), "remote");

        let err = client(None)
            .classify(Some("application/json"), Bytes::from_static(br#"{"status":"ok"}"#))
            .expect_err("no artifact url");
        assert_eq!(err.result_label(), "protocol");
    }

    #[test]
    fn html_body_is_a_protocol_error() {
        let err = client(None)
            .classify(Some("text/html"), Bytes::from_static(b"<html></html>"))
            .expect_err("not a pdf");
        assert!(matches!(err, RenderError::Protocol(_)));
    }

    #[test]
    fn error_bodies_are_truncated() {
        let long = vec![b'x'; ERROR_BODY_PREVIEW_BYTES * 2];
        assert_eq!(body_preview(&long).len(), ERROR_BODY_PREVIEW_BYTES);
    }
}
