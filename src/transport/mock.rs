use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::{
    data::flatten::SubmissionRecord,
    form::form_model::FormConfig,
    transport::{
        error::TransportError,
        transport::{FormTransport, SubmitMethod, SubmitOutcome},
    },
};

/// In-memory transport replaying canned answers, for tests and dry runs.
///
/// Clones share their recorded submissions, so a test can keep one handle
/// after moving another into a session.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    form: Option<FormConfig>,
    initial_data: Option<Value>,
    outcomes: Arc<Mutex<VecDeque<SubmitOutcome>>>,
    submissions: Arc<Mutex<Vec<(SubmitMethod, SubmissionRecord)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, form: FormConfig) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Queue the answer to the next submission. With an empty queue every
    /// submission is accepted with a `null` body.
    pub fn respond_with(self, outcome: SubmitOutcome) -> Self {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
        self
    }

    pub fn submissions(&self) -> Vec<(SubmitMethod, SubmissionRecord)> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FormTransport for MockTransport {
    fn fetch_form(&self) -> Result<FormConfig, TransportError> {
        self.form.clone().ok_or(TransportError::MockExhausted("form"))
    }

    fn fetch_initial_data(&self) -> Result<Value, TransportError> {
        self.initial_data
            .clone()
            .ok_or(TransportError::MockExhausted("initial data"))
    }

    fn submit(&self, method: SubmitMethod, payload: &SubmissionRecord) -> Result<SubmitOutcome, TransportError> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method, payload.clone()));

        let next = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or(SubmitOutcome::Accepted(Value::Null)))
    }
}
