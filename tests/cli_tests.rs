use clap::Parser;
use schema_form::cli::commands::{cmd_actions, cmd_compile, cmd_flatten, load_layout};
use schema_form::cli::config::{AppConfig, Cli, Commands, load_config, log_level, resolve_url};
use serde_json::{Value, json};

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_compile() {
    let cli = Cli::parse_from(["schema-form", "compile", "--layout", "layout.json"]);
    match cli.command {
        Commands::Compile { layout } => assert_eq!(layout, "layout.json"),
        _ => panic!("Expected Compile command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.trace.is_none());
}

#[test]
fn cli_parse_submit_all_args() {
    let cli = Cli::parse_from([
        "schema-form",
        "-vv",
        "--trace",
        "trace.jsonl",
        "submit",
        "--url",
        "http://localhost:8000/api/users/1/",
        "--data",
        "data.yaml",
        "--button",
        "save",
        "--cancel",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.trace.as_deref(), Some("trace.jsonl"));
    match cli.command {
        Commands::Submit {
            url,
            data,
            button,
            cancel,
        } => {
            assert_eq!(url.as_deref(), Some("http://localhost:8000/api/users/1/"));
            assert_eq!(data, "data.yaml");
            assert_eq!(button.as_deref(), Some("save"));
            assert!(cancel);
        }
        _ => panic!("Expected Submit command"),
    }
}

#[test]
fn cli_parse_fetch_without_url() {
    let cli = Cli::parse_from(["schema-form", "fetch", "--config", "other.yaml"]);
    assert_eq!(cli.config.as_deref(), Some("other.yaml"));
    assert!(matches!(cli.command, Commands::Fetch { url: None }));
}

#[test]
fn cli_rejects_missing_required_args() {
    assert!(Cli::try_parse_from(["schema-form", "flatten", "--layout", "l.json"]).is_err());
    assert!(Cli::try_parse_from(["schema-form", "submit"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_loads_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "schema-form.yaml",
        "server:\n  url: http://localhost:8000/api/users/1/\n  extra_form_data:\n    organisation: 3\ntrace:\n  path: form.jsonl\n",
    );

    let config = load_config(Some(&path));
    assert_eq!(config.server.url.as_deref(), Some("http://localhost:8000/api/users/1/"));
    assert_eq!(config.server.timeout_secs, 30, "Default timeout");
    assert_eq!(config.server.extra_form_data.get("organisation"), Some(&json!(3)));
    assert_eq!(config.trace.path.as_deref(), Some("form.jsonl"));
}

#[test]
fn config_missing_or_malformed_gives_defaults() {
    let config = load_config(Some("/nonexistent/schema-form.yaml"));
    assert!(config.server.url.is_none());

    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "bad.yaml", "server: [unclosed");
    let config = load_config(Some(&path));
    assert!(config.server.url.is_none());
    assert_eq!(config.server.timeout_secs, 30);
}

#[test]
fn url_resolution_prefers_cli() {
    let mut config = AppConfig::default();
    assert_eq!(resolve_url(None, &config), None);

    config.server.url = Some("http://config".into());
    assert_eq!(resolve_url(None, &config).as_deref(), Some("http://config"));
    assert_eq!(resolve_url(Some("http://cli"), &config).as_deref(), Some("http://cli"));
}

#[test]
fn verbosity_maps_to_log_level() {
    assert_eq!(log_level(0), log::LevelFilter::Warn);
    assert_eq!(log_level(1), log::LevelFilter::Info);
    assert_eq!(log_level(2), log::LevelFilter::Debug);
    assert_eq!(log_level(7), log::LevelFilter::Trace);
}

// ============================================================================
// Offline Command Tests
// ============================================================================

#[test]
fn compile_command_prints_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "layout.json", r#"[["Contact", ["email", "Email"]]]"#);

    let output: Value = serde_json::from_str(&cmd_compile(&path).unwrap()).unwrap();
    assert_eq!(output["nodes"][0]["kind"], json!("group"));
    assert_eq!(output["nodes"][0]["id"], json!("generated_0"));
    assert_eq!(output["nodes"][0]["children"][0]["id"], json!("email"));
    assert_eq!(output["fingerprint"].as_str().map(str::len), Some(40));
}

#[test]
fn layout_file_may_be_a_form_config_in_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "form.yaml",
        "form_title: Profile\nmethod: post\nlayout:\n  - [email, Email]\n  - [name]\n",
    );

    let layout = load_layout(&path).unwrap();
    assert_eq!(layout, vec![json!(["email", "Email"]), json!(["name"])]);
}

#[test]
fn compile_command_fails_on_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "layout.json", r#"[["volume", "Volume", "slider"]]"#);

    let err = cmd_compile(&path).unwrap_err();
    assert!(err.to_string().contains("slider"));
}

#[test]
fn flatten_command_removes_groups() {
    let dir = tempfile::tempdir().unwrap();
    let layout = write(&dir, "layout.json", r#"[["G", ["a"], ["H", ["b"]]]]"#);
    let value = write(&dir, "value.json", r#"{"generated_0": {"a": 1, "generated_1": {"b": 2}}}"#);

    let output: Value = serde_json::from_str(&cmd_flatten(&layout, &value).unwrap()).unwrap();
    assert_eq!(output, json!({"a": 1, "b": 2}));
}

#[test]
fn actions_command_reads_config_or_list() {
    let dir = tempfile::tempdir().unwrap();
    let list = write(&dir, "actions.json", r#"["delete"]"#);
    let config = write(&dir, "form.json", r#"{"actions": [["save", "Save"]], "layout": []}"#);

    let output: Value = serde_json::from_str(&cmd_actions(&list).unwrap()).unwrap();
    assert_eq!(output, json!([{"id": "delete", "label": "delete", "color": "primary", "cancel": null}]));

    let output: Value = serde_json::from_str(&cmd_actions(&config).unwrap()).unwrap();
    assert_eq!(output[0]["label"], json!("Save"));
}
