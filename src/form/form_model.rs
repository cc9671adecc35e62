use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{control::correlator::ExternalErrorMap, data::flatten::SubmissionRecord};

/// Form description served at `<url>/form/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_title: Option<String>,

    /// Raw action list, normalized by `normalize_actions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,

    #[serde(default)]
    pub layout: Vec<Value>,

    /// `post` or `patch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default)]
    pub has_initial_data: bool,
}

/// What happened when a form was submitted or cancelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SubmitEvent {
    Submitted {
        data: SubmissionRecord,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
    Rejected {
        data: SubmissionRecord,
        errors: ExternalErrorMap,
    },
    Cancelled {
        data: SubmissionRecord,
    },
}

impl SubmitEvent {
    pub fn data(&self) -> &SubmissionRecord {
        match self {
            SubmitEvent::Submitted { data, .. }
            | SubmitEvent::Rejected { data, .. }
            | SubmitEvent::Cancelled { data } => data,
        }
    }
}
