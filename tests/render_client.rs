use httpmock::MockServer;
use livepdf::{
    application::{
        options::OptionStore,
        render::{Artifact, RenderClient, RenderRequest, RenderResult},
    },
    config::RenderSettings,
    domain::{Engine, Orientation, PageSize, RenderConfig},
    infra::render_client::{HttpRenderClient, RenderError},
};
use livepdf_protocol::RENDER_FAILED_MESSAGE;
use serde_json::json;
use url::Url;

fn client(server: &MockServer, artifact_url: Option<&str>) -> HttpRenderClient {
    HttpRenderClient::new(&RenderSettings {
        endpoint: Url::parse(&server.url("/api/pdf/render")).expect("endpoint"),
        artifact_url: artifact_url.map(|url| Url::parse(url).expect("artifact url")),
    })
    .expect("client")
}

fn request(config: RenderConfig, body: &str) -> RenderRequest {
    let mut store = OptionStore::new(config);
    store.set_payload(body);
    RenderRequest::new(1, store.snapshot())
}

#[tokio::test]
async fn posts_the_json_payload_and_returns_the_pdf_blob() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/pdf/render")
            .header("content-type", "application/json;charset=UTF-8")
            .header("user-agent", HttpRenderClient::user_agent())
            .json_body(json!({ "orientation": "portrait", "size": "A4", "body": "Hello" }));
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.7 fake");
    });

    let result = client(&server, None)
        .render(&request(RenderConfig::default(), "Hello"))
        .await;

    mock.assert();
    assert_eq!(result, RenderResult::Rendered(Artifact::pdf("%PDF-1.7 fake")));
}

#[tokio::test]
async fn sends_custom_size_and_engine_when_selected() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/pdf/render").json_body(json!({
            "orientation": "landscape",
            "size": "Custom",
            "sizeCustom": "100mm 200mm",
            "engine": "chromium",
            "body": "doc",
        }));
        then.status(200).body("%PDF-1.4");
    });

    let config = RenderConfig {
        orientation: Orientation::Landscape,
        page_size: PageSize::Custom,
        custom_size: Some("100mm 200mm".to_string()),
        engine: Some(Engine::Chromium),
    };
    let result = client(&server, None).render(&request(config, "doc")).await;

    mock.assert();
    assert!(!result.is_failed());
}

#[tokio::test]
async fn acknowledgements_resolve_to_a_remote_artifact() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/pdf/render");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok","url":"/storage/public/fly.pdf"}"#);
    });

    let artifact = client(&server, None)
        .try_render(&request(RenderConfig::default(), "Hello"))
        .await
        .expect("artifact");

    assert_eq!(
        artifact,
        Artifact::Remote {
            url: Url::parse(&server.url("/storage/public/fly.pdf")).expect("url"),
        }
    );
}

#[tokio::test]
async fn bare_acknowledgements_fall_back_to_the_configured_artifact() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/pdf/render");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"ok"}"#);
    });
    let pdf = server.mock(|when, then| {
        when.method("GET").path("/storage/fly.pdf");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.7 remote");
    });

    let artifact_url = server.url("/storage/fly.pdf");
    let client = client(&server, Some(&artifact_url));
    let artifact = client
        .try_render(&request(RenderConfig::default(), "Hello"))
        .await
        .expect("artifact");
    let bytes = client.fetch(&artifact).await.expect("download");

    pdf.assert();
    assert_eq!(artifact.kind(), "remote");
    assert_eq!(&bytes[..], b"%PDF-1.7 remote");
}

#[tokio::test]
async fn error_statuses_collapse_to_the_fixed_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/pdf/render");
        then.status(500).body("renderer exploded");
    });
    let client = client(&server, None);
    let request = request(RenderConfig::default(), "Hello");

    let err = client.try_render(&request).await.expect_err("status error");
    assert!(matches!(err, RenderError::Status { .. }));
    assert!(err.to_string().contains("renderer exploded"));

    assert_eq!(
        client.render(&request).await,
        RenderResult::Failed(RENDER_FAILED_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn unreachable_services_collapse_to_the_fixed_message() {
    let endpoint = {
        let server = MockServer::start();
        server.url("/api/pdf/render")
    };
    let client = HttpRenderClient::new(&RenderSettings {
        endpoint: Url::parse(&endpoint).expect("endpoint"),
        artifact_url: None,
    })
    .expect("client");

    let result = client
        .render(&request(RenderConfig::default(), "Hello"))
        .await;

    assert_eq!(result, RenderResult::failed());
}
