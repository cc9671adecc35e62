use schema_form::{
    ExternalErrorMap, FormConfig, FormSession,
    trace::{
        logger::TraceLogger,
        trace::{FormEventKind, TraceEvent},
    },
};
use serde_json::{Value, json};

fn read_events(path: &std::path::Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn logger_appends_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");

    let logger = TraceLogger::new(&path);
    assert!(logger.is_enabled());
    logger.log(&TraceEvent::now(FormEventKind::Compiled).with_fields(["a", "b"]));
    logger.log(&TraceEvent::now(FormEventKind::Cancelled).with_action(Some("cancel")));

    let events = read_events(&path);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], json!("compiled"));
    assert_eq!(events[0]["fields"], json!(["a", "b"]));
    assert_eq!(events[1]["action"], json!("cancel"));
}

#[test]
fn disabled_logger_is_silent() {
    let logger = TraceLogger::disabled();
    assert!(!logger.is_enabled());
    logger.log(&TraceEvent::now(FormEventKind::Failed).with_detail("ignored"));
}

#[test]
fn session_traces_its_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");

    let mut session = FormSession::offline().with_tracer(TraceLogger::new(&path));
    session
        .set_config(FormConfig {
            layout: vec![json!(["email"])],
            ..FormConfig::default()
        })
        .unwrap();
    let errors: ExternalErrorMap = [("email".to_string(), vec!["Bad".to_string()])].into();
    session.set_errors(Some(&errors));
    session.submitted(Some("save"), false).unwrap();

    let events = read_events(&path);
    let kinds: Vec<_> = events.iter().map(|e| e["event"].as_str().unwrap().to_string()).collect();
    assert_eq!(kinds, vec!["compiled", "errors_delivered", "submitted"]);

    let fingerprint = events[0]["layout_fingerprint"].clone();
    assert!(fingerprint.is_string());
    assert!(events.iter().all(|e| e["layout_fingerprint"] == fingerprint));
    assert_eq!(events[2]["action"], json!("save"));
}
