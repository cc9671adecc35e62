use schema_form::{
    ExternalErrorMap, FormConfig, FormError, FormSession,
    control::control_model::ControlNode,
    form::form_model::SubmitEvent,
    transport::{
        error::TransportError,
        mock::MockTransport,
        transport::{SubmitMethod, SubmitOutcome},
    },
};
use serde_json::{Value, json};

fn config(layout: Value, method: Option<&str>) -> FormConfig {
    FormConfig {
        form_title: Some("Profile".into()),
        actions: Some(json!([["save", "Save"], {"id": "cancel", "label": "Cancel", "cancel": true}])),
        layout: layout.as_array().unwrap().clone(),
        method: method.map(Into::into),
        has_initial_data: false,
    }
}

fn profile_layout() -> Value {
    json!([
        ["email", "Email"],
        ["Details", ["first_name", "First name"], ["last_name", "Last name"]]
    ])
}

fn error_of<'a>(session: &'a FormSession, id: &str) -> Option<&'a str> {
    session
        .tree()?
        .find(id)
        .and_then(ControlNode::state)
        .and_then(|s| s.error.as_deref())
}

// =========================================================================
// Setup
// =========================================================================

#[test]
fn init_fetches_and_compiles() {
    let transport = MockTransport::new().with_form(config(profile_layout(), Some("post")));
    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();

    assert_eq!(session.form_title(), Some("Profile"));
    assert_eq!(session.actions().len(), 2);
    assert!(session.actions()[1].is_cancel());

    let tree = session.tree().unwrap();
    assert_eq!(tree.leaf_ids(), vec!["email", "first_name", "last_name"]);
    assert_eq!(tree.group_ids(), vec!["generated_0"]);
}

#[test]
fn init_marks_every_field_touched() {
    let transport = MockTransport::new().with_form(config(profile_layout(), Some("post")));
    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();

    let tree = session.tree().unwrap();
    for id in tree.leaf_ids() {
        let state = tree.find(id).and_then(ControlNode::state).unwrap();
        assert!(state.touched, "'{}' should be touched after init", id);
        assert!(!state.dirty, "'{}' was never edited", id);
    }
}

#[test]
fn set_config_alone_leaves_fields_untouched() {
    let mut session = FormSession::offline();
    session.set_config(config(profile_layout(), None)).unwrap();

    let state = session.tree().unwrap().find("first_name").and_then(ControlNode::state).unwrap();
    assert!(!state.touched);
}

#[test]
fn explicit_title_wins_over_config() {
    let mut session = FormSession::offline().with_title("Edit profile");
    session.set_config(config(profile_layout(), None)).unwrap();
    assert_eq!(session.form_title(), Some("Edit profile"));
}

#[test]
fn init_without_transport_or_config_fails() {
    let mut session = FormSession::offline();
    assert!(matches!(session.init(), Err(FormError::NoTransport("form"))));
    assert!(matches!(session.submitted(None, false), Err(FormError::NotCompiled)));
}

#[test]
fn failed_compile_keeps_previous_tree() {
    let mut session = FormSession::offline();
    session.set_config(config(profile_layout(), None)).unwrap();

    let bad = config(json!([["dial", "Dial", "slider"]]), None);
    assert!(matches!(session.set_config(bad), Err(FormError::Compile(_))));
    assert_eq!(session.tree().unwrap().leaf_ids().len(), 3, "No partial tree replaces the old one");
}

// =========================================================================
// Initial data
// =========================================================================

#[test]
fn initial_data_is_fetched_and_transformed() {
    let mut form = config(profile_layout(), Some("patch"));
    form.has_initial_data = true;

    let transport = MockTransport::new()
        .with_form(form)
        .with_initial_data(json!({"user": {"email": "ada@example.com", "first_name": "Ada"}}));

    let mut session = FormSession::with_transport(transport).with_initial_data_transformation(|v| v["user"].clone());
    session.init().unwrap();

    assert_eq!(
        Value::Object(session.value()),
        json!({
            "email": "ada@example.com",
            "generated_0": {"first_name": "Ada", "last_name": null}
        })
    );
}

#[test]
fn initial_data_survives_recompilation() {
    let mut session = FormSession::offline();
    session.set_config(config(profile_layout(), None)).unwrap();
    assert_eq!(session.set_initial_data(json!({"email": "a@b.c", "last_name": "L"})), 2);

    session
        .set_layout(vec![json!(["Login", ["email"]]), json!(["last_name"])])
        .unwrap();

    assert_eq!(
        Value::Object(session.value()),
        json!({"generated_0": {"email": "a@b.c"}, "last_name": "L"})
    );
}

#[test]
fn non_object_initial_data_is_ignored() {
    let mut session = FormSession::offline();
    session.set_config(config(profile_layout(), None)).unwrap();
    assert_eq!(session.set_initial_data(json!(["not", "a", "record"])), 0);
}

// =========================================================================
// Submission
// =========================================================================

#[test]
fn submit_flattens_and_stamps_button() {
    let transport = MockTransport::new()
        .with_form(config(profile_layout(), Some("post")))
        .respond_with(SubmitOutcome::Accepted(json!({"id": 12})));
    let recorder = transport.clone();

    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();
    session.set_initial_data(json!({"email": "ada@example.com", "first_name": "Ada", "last_name": "L"}));

    let event = session.submitted(Some("save"), false).unwrap();
    let expected = json!({"email": "ada@example.com", "first_name": "Ada", "last_name": "L", "save": true});

    match &event {
        SubmitEvent::Submitted { data, response } => {
            assert_eq!(Value::Object(data.clone()), expected);
            assert_eq!(response, &Some(json!({"id": 12})));
        }
        other => panic!("Expected Submitted, got {:?}", other),
    }

    let submissions = recorder.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, SubmitMethod::Post);
    assert_eq!(Value::Object(submissions[0].1.clone()), expected);
}

#[test]
fn rejected_submission_surfaces_errors_once() {
    let rejection: ExternalErrorMap = [("email".to_string(), vec!["Already taken".to_string()])].into();
    let transport = MockTransport::new()
        .with_form(config(profile_layout(), Some("patch")))
        .respond_with(SubmitOutcome::Rejected(rejection.clone()));
    let recorder = transport.clone();

    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();
    session.set_initial_data(json!({"email": "taken@example.com"}));

    let event = session.submitted(None, false).unwrap();
    assert!(matches!(&event, SubmitEvent::Rejected { errors, .. } if *errors == rejection));
    assert_eq!(error_of(&session, "email"), Some("Already taken"));
    assert!(!session.valid());

    // The user edits the field: the consumed message does not come back.
    session.tree_mut().unwrap().set_value("email", json!("free@example.com"));
    assert_eq!(error_of(&session, "email"), None);
    assert!(session.valid());

    let retry = session.submit_on_enter().unwrap();
    assert!(matches!(retry, SubmitEvent::Submitted { .. }));
    assert_eq!(recorder.submissions().len(), 2);
    assert!(recorder.submissions().iter().all(|(m, _)| *m == SubmitMethod::Patch));
}

#[test]
fn accepted_submission_clears_pending_errors() {
    let transport = MockTransport::new().with_form(config(
        json!([{"id": "size", "type": "radio", "choices": [{"display_name": "S", "value": "s"}]}]),
        Some("post"),
    ));
    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();

    let pending: ExternalErrorMap = [("size".to_string(), vec!["Pick one".to_string()])].into();
    session.set_errors(Some(&pending));
    assert_eq!(session.tree().unwrap().correlator().pending_count(), 1);

    session.submitted(None, false).unwrap();
    assert_eq!(session.tree().unwrap().correlator().pending_count(), 0);
}

#[test]
fn cancel_does_not_reach_the_transport() {
    let transport = MockTransport::new().with_form(config(profile_layout(), Some("post")));
    let recorder = transport.clone();
    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();

    let event = session.submitted(Some("cancel"), true).unwrap();
    match event {
        SubmitEvent::Cancelled { data } => assert_eq!(data.get("cancel"), Some(&json!(true))),
        other => panic!("Expected Cancelled, got {:?}", other),
    }
    assert!(recorder.submissions().is_empty());
}

#[test]
fn offline_submit_reports_data_only() {
    let mut session = FormSession::offline();
    session.set_config(config(profile_layout(), None)).unwrap();

    match session.submitted(None, false).unwrap() {
        SubmitEvent::Submitted { data, response } => {
            assert_eq!(data.len(), 3);
            assert!(response.is_none());
        }
        other => panic!("Expected Submitted, got {:?}", other),
    }
}

#[test]
fn unknown_method_is_an_error() {
    let transport = MockTransport::new().with_form(config(profile_layout(), Some("put")));
    let recorder = transport.clone();
    let mut session = FormSession::with_transport(transport);
    session.init().unwrap();

    match session.submitted(None, false) {
        Err(FormError::Transport(TransportError::UnsupportedMethod(m))) => assert_eq!(m, "put"),
        other => panic!("Expected UnsupportedMethod, got {:?}", other.map(|e| e.data().len())),
    }
    assert!(recorder.submissions().is_empty());
}
