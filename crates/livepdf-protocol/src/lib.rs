//! Wire types shared between the livepdf host, its preview surfaces and the
//! remote render endpoint.
//!
//! Two protocols live here:
//!
//! - the render endpoint payload (`POST { orientation, size, sizeCustom?, engine?, body }`)
//!   and the acknowledgement returned by backends that store the PDF elsewhere;
//! - the host ↔ surface message union, exchanged as JSON strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only failure text a user ever sees for a render or mount problem.
pub const RENDER_FAILED_MESSAGE: &str = "Something went wrong when trying to render PDF.";

/// Page orientation requested from the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Paper size requested from the renderer. `Custom` defers to the free-form
/// custom size text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    F4,
    Custom,
}

impl PageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A5 => "A5",
            PageSize::F4 => "F4",
            PageSize::Custom => "Custom",
        }
    }
}

/// Backend selection understood by the multi-engine endpoint variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Chromium,
    Wkhtmltopdf,
    Weasyprint,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Wkhtmltopdf => "wkhtmltopdf",
            Engine::Weasyprint => "weasyprint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseOptionError {
    kind: &'static str,
    value: String,
}

impl ParseOptionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl FromStr for Orientation {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(ParseOptionError::new("orientation", value)),
        }
    }
}

impl FromStr for PageSize {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "a5" => Ok(PageSize::A5),
            "f4" => Ok(PageSize::F4),
            "custom" => Ok(PageSize::Custom),
            _ => Err(ParseOptionError::new("page size", value)),
        }
    }
}

impl FromStr for Engine {
    type Err = ParseOptionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(Engine::Chromium),
            "wkhtmltopdf" => Ok(Engine::Wkhtmltopdf),
            "weasyprint" => Ok(Engine::Weasyprint),
            _ => Err(ParseOptionError::new("engine", value)),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body posted to the render endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPayload<'a> {
    pub orientation: Orientation,
    pub size: PageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_custom: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<Engine>,
    pub body: &'a str,
}

/// Acknowledgement returned by backends that publish the PDF at a separate
/// location instead of streaming it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RenderAck {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    file: Option<String>,
}

impl RenderAck {
    /// Where the PDF was published: `url`, then `location`, then `file`.
    pub fn artifact_location(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.location.as_deref())
            .or(self.file.as_deref())
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
}

fn known_event(raw: &str, events: &[&str]) -> Result<bool, MessageError> {
    let envelope: Envelope = serde_json::from_str(raw)?;
    Ok(events.contains(&envelope.event.as_str()))
}

/// Messages sent from the host to a preview surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum HostMessage {
    /// Initial document text, sent once when the surface opens.
    Load(String),
    /// Document text after a save.
    Change(String),
}

impl HostMessage {
    const EVENTS: &'static [&'static str] = &["load", "change"];

    pub fn payload(&self) -> &str {
        match self {
            HostMessage::Load(payload) | HostMessage::Change(payload) => payload,
        }
    }

    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a raw message. Unknown event kinds yield `Ok(None)`.
    pub fn decode(raw: &str) -> Result<Option<Self>, MessageError> {
        if !known_event(raw, Self::EVENTS)? {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(raw)?))
    }
}

/// Messages posted by a preview surface back to its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum SurfaceMessage {
    /// A render or mount attempt failed; the payload is user-facing text.
    FetchFailed(String),
}

impl SurfaceMessage {
    const EVENTS: &'static [&'static str] = &["fetch-failed"];

    pub fn render_failed() -> Self {
        SurfaceMessage::FetchFailed(RENDER_FAILED_MESSAGE.to_string())
    }

    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a raw message. Unknown event kinds yield `Ok(None)`.
    pub fn decode(raw: &str) -> Result<Option<Self>, MessageError> {
        if !known_event(raw, Self::EVENTS)? {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(raw)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn host_messages_use_event_and_payload_fields() {
        let encoded = HostMessage::Load("Hello".into()).encode().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
        assert_eq!(value, json!({ "event": "load", "payload": "Hello" }));
    }

    #[test]
    fn surface_failure_carries_fixed_message() {
        let encoded = SurfaceMessage::render_failed().encode().expect("encode");
        let value: serde_json::Value = serde_json::from_str(&encoded).expect("json");
        assert_eq!(
            value,
            json!({
                "event": "fetch-failed",
                "payload": "Something went wrong when trying to render PDF.",
            })
        );
    }

    #[test]
    fn unknown_events_are_ignored() {
        let host = HostMessage::decode(r#"{"event":"scroll","payload":12}"#).expect("decode");
        assert!(host.is_none());

        let surface = SurfaceMessage::decode(r#"{"event":"load","payload":"x"}"#).expect("decode");
        assert!(surface.is_none());
    }

    #[test]
    fn change_message_decodes() {
        let message = HostMessage::decode(r#"{"event":"change","payload":"v2"}"#)
            .expect("decode")
            .expect("known event");
        assert_eq!(message, HostMessage::Change("v2".into()));
        assert_eq!(message.payload(), "v2");
    }

    #[test]
    fn malformed_messages_are_errors() {
        assert!(HostMessage::decode("not json").is_err());
        assert!(HostMessage::decode(r#"{"event":"load","payload":3}"#).is_err());
    }

    #[test]
    fn payload_omits_unset_optional_fields() {
        let payload = RenderPayload {
            orientation: Orientation::Portrait,
            size: PageSize::A4,
            size_custom: None,
            engine: None,
            body: "Hello",
        };
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(
            value,
            json!({ "orientation": "portrait", "size": "A4", "body": "Hello" })
        );
    }

    #[test]
    fn payload_includes_custom_size_and_engine() {
        let payload = RenderPayload {
            orientation: Orientation::Landscape,
            size: PageSize::Custom,
            size_custom: Some("210mm 99mm"),
            engine: Some(Engine::Weasyprint),
            body: "",
        };
        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(
            value,
            json!({
                "orientation": "landscape",
                "size": "Custom",
                "sizeCustom": "210mm 99mm",
                "engine": "weasyprint",
                "body": "",
            })
        );
    }

    #[test]
    fn ack_accepts_location_alias() {
        let ack: RenderAck =
            serde_json::from_str(r#"{"status":"ok","location":"/storage/fly.pdf"}"#)
                .expect("ack");
        assert_eq!(ack.artifact_location(), Some("/storage/fly.pdf"));

        let bare: RenderAck = serde_json::from_str(r#"{"status":"ok"}"#).expect("ack");
        assert!(bare.artifact_location().is_none());
    }

    #[test]
    fn ack_prefers_url_when_several_locations_are_present() {
        let ack: RenderAck = serde_json::from_str(
            r#"{"status":"ok","url":"/a.pdf","location":"/b.pdf","file":"/c.pdf"}"#,
        )
        .expect("ack");
        assert_eq!(ack.artifact_location(), Some("/a.pdf"));

        let ack: RenderAck =
            serde_json::from_str(r#"{"location":"/b.pdf","file":"/c.pdf"}"#).expect("ack");
        assert_eq!(ack.artifact_location(), Some("/b.pdf"));
    }

    #[test]
    fn option_values_parse_case_insensitively() {
        assert_eq!("Landscape".parse::<Orientation>(), Ok(Orientation::Landscape));
        assert_eq!("a5".parse::<PageSize>(), Ok(PageSize::A5));
        assert_eq!("CHROMIUM".parse::<Engine>(), Ok(Engine::Chromium));
        assert!("letter".parse::<PageSize>().is_err());
    }
}
