use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde_json::Value;

/// Per-field messages reported by the server after a rejected submission.
pub type ExternalErrorMap = BTreeMap<String, Vec<String>>;

/// Messages waiting to be picked up by the next validation of their field.
#[derive(Debug, Default)]
pub struct PendingErrors {
    entries: HashMap<String, Vec<String>>,
}

impl PendingErrors {
    /// Merge a delivery; entries for an id already pending are replaced.
    pub fn merge(&mut self, errors: &ExternalErrorMap) {
        for (id, messages) in errors {
            self.entries.insert(id.clone(), messages.clone());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove the id entirely and hand back its first message.
    pub fn take_first(&mut self, id: &str) -> Option<String> {
        self.entries
            .remove(id)
            .and_then(|messages| messages.into_iter().next())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle to the pending-error store of one compiled tree.
///
/// The compiler creates one per pass and gives a clone to every string
/// field's validator, so a recompiled tree never sees errors meant for the
/// previous one. Every read-modify-write happens under the lock.
#[derive(Debug, Clone, Default)]
pub struct ErrorCorrelator {
    store: Arc<Mutex<PendingErrors>>,
}

impl ErrorCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, PendingErrors> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn validator_for(&self, field_id: &str) -> ExternalValidator {
        ExternalValidator {
            field_id: field_id.to_string(),
            correlator: self.clone(),
        }
    }

    pub fn is_pending(&self, field_id: &str) -> bool {
        self.lock().contains(field_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }
}

/// Validator bound to one string field. Reports a pending server message
/// at most once per delivery.
#[derive(Debug, Clone)]
pub struct ExternalValidator {
    field_id: String,
    correlator: ErrorCorrelator,
}

impl ExternalValidator {
    pub fn validate(&self) -> Option<String> {
        let mut pending = self.correlator.lock();
        self.validate_with(&mut pending)
    }

    /// Validate against a store the caller already holds locked.
    pub fn validate_with(&self, pending: &mut PendingErrors) -> Option<String> {
        let message = pending.take_first(&self.field_id);
        if let Some(message) = &message {
            debug!("external error consumed for '{}': {}", self.field_id, message);
        }
        message
    }
}

/// Read an error response body into an `ExternalErrorMap`.
///
/// Lists keep their string entries, a bare string becomes a one-message
/// list, anything else is rendered as JSON text. Returns `None` when the
/// body is not an object.
pub fn error_map_from_value(body: &Value) -> Option<ExternalErrorMap> {
    let fields = body.as_object()?;

    let map = fields
        .iter()
        .map(|(id, raw)| {
            let messages = match raw {
                Value::Array(items) => items.iter().map(message_text).collect(),
                other => vec![message_text(other)],
            };
            (id.clone(), messages)
        })
        .collect();

    Some(map)
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
