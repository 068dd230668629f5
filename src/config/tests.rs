use super::*;

fn raw_with_endpoint() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.render.endpoint = Some("https://render.example.test/api/pdf/render".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_endpoint();
    raw.preview.debounce_ms = Some(1200);
    raw.logging.level = Some("info".to_string());

    let overrides = PreviewOverrides {
        debounce_ms: Some(250),
        render: RenderOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_preview_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.preview.debounce, Duration::from_millis(250));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn preview_defaults_match_the_live_preview() {
    let settings = Settings::from_raw(raw_with_endpoint()).expect("valid settings");

    assert_eq!(settings.preview.debounce, Duration::from_millis(800));
    assert_eq!(settings.preview.template.title, "Preview");
    assert_eq!(settings.preview.template.mount_id, "pdfPreview");
    assert_eq!(settings.preview.defaults, RenderConfig::default());
    assert!(settings.render.artifact_url.is_none());
}

#[test]
fn endpoint_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing endpoint");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "render.endpoint",
            ..
        }
    ));
}

#[test]
fn endpoint_must_be_http() {
    let mut raw = RawSettings::default();
    raw.render.endpoint = Some("ftp://render.example.test".to_string());

    let err = Settings::from_raw(raw).expect_err("unsupported scheme");
    assert!(err.to_string().contains("unsupported scheme `ftp`"));
}

#[test]
fn zero_debounce_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.preview.debounce_ms = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero debounce");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "preview.debounce_ms",
            ..
        }
    ));
}

#[test]
fn initial_options_are_parsed() {
    let mut raw = raw_with_endpoint();
    let overrides = RenderOverrides {
        orientation: Some("Landscape".to_string()),
        page_size: Some("custom".to_string()),
        custom_size: Some("  100mm 200mm ".to_string()),
        engine: Some("weasyprint".to_string()),
        ..Default::default()
    };

    raw.apply_render_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.preview.defaults.orientation, Orientation::Landscape);
    assert_eq!(settings.preview.defaults.page_size, PageSize::Custom);
    assert_eq!(
        settings.preview.defaults.custom_size.as_deref(),
        Some("100mm 200mm")
    );
    assert_eq!(settings.preview.defaults.engine, Some(Engine::Weasyprint));
}

#[test]
fn unknown_engine_is_rejected() {
    let mut raw = raw_with_endpoint();
    raw.preview.engine = Some("prince".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown engine");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "preview.engine",
            ..
        }
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_endpoint();
    let overrides = RenderOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_render_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn parse_preview_arguments() {
    let args = CliArgs::parse_from([
        "livepdf",
        "preview",
        "--render-endpoint",
        "http://localhost:8080/render",
        "--page-size",
        "A5",
        "--debounce-ms",
        "400",
        "notes.md",
    ]);

    match args.command {
        Command::Preview(preview) => {
            assert_eq!(preview.file, std::path::Path::new("notes.md"));
            assert_eq!(
                preview.overrides.render.endpoint.as_deref(),
                Some("http://localhost:8080/render")
            );
            assert_eq!(preview.overrides.render.page_size.as_deref(), Some("A5"));
            assert_eq!(preview.overrides.debounce_ms, Some(400));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from([
        "livepdf",
        "render",
        "--engine",
        "chromium",
        "--output",
        "/tmp/out.pdf",
        "/tmp/notes.md",
    ]);

    match args.command {
        Command::Render(render) => {
            assert_eq!(render.file, std::path::Path::new("/tmp/notes.md"));
            assert_eq!(render.output, std::path::Path::new("/tmp/out.pdf"));
            assert_eq!(render.overrides.engine.as_deref(), Some("chromium"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_log_json_boolish() {
    let args = CliArgs::parse_from([
        "livepdf",
        "render",
        "--log-json=yes",
        "-o",
        "out.pdf",
        "in.md",
    ]);

    match args.command {
        Command::Render(render) => assert_eq!(render.overrides.log_json, Some(true)),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
#[serial_test::serial]
fn layers_resolve_file_then_env_then_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("config file");
    std::io::Write::write_all(
        &mut file,
        br#"
[render]
endpoint = "https://file.example.test/render"

[preview]
debounce_ms = 1000
mount_id = "fileMount"
title = "From file"
"#,
    )
    .expect("write config");

    // SAFETY: serialised with every other test touching the environment.
    unsafe {
        std::env::set_var("LIVEPDF__PREVIEW__DEBOUNCE_MS", "600");
        std::env::set_var("LIVEPDF__PREVIEW__MOUNT_ID", "envMount");
    }

    let path = file.path().to_string_lossy().into_owned();
    let cli = CliArgs::parse_from([
        "livepdf",
        "--config-file",
        path.as_str(),
        "preview",
        "--debounce-ms",
        "250",
        "notes.md",
    ]);
    let settings = load(&cli);

    unsafe {
        std::env::remove_var("LIVEPDF__PREVIEW__DEBOUNCE_MS");
        std::env::remove_var("LIVEPDF__PREVIEW__MOUNT_ID");
    }

    let settings = settings.expect("valid settings");
    assert_eq!(
        settings.render.endpoint.as_str(),
        "https://file.example.test/render"
    );
    assert_eq!(settings.preview.template.title, "From file");
    assert_eq!(settings.preview.template.mount_id, "envMount");
    assert_eq!(settings.preview.debounce, Duration::from_millis(250));
}
