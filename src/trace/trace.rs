use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormEventKind {
    Compiled,
    InitialData,
    ErrorsDelivered,
    ErrorsCleared,
    Submitted,
    Rejected,
    Cancelled,
    Failed,
}

/// One line of the JSONL trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub event: FormEventKind,

    pub layout_fingerprint: Option<String>,

    pub fields: Vec<String>,

    pub action: Option<String>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(event: FormEventKind) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            event,
            layout_fingerprint: None,
            fields: vec![],
            action: None,
            detail: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<&str>) -> Self {
        self.layout_fingerprint = fingerprint.map(str::to_string);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_action(mut self, action: Option<&str>) -> Self {
        self.action = action.map(str::to_string);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
