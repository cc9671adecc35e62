use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    control::correlator::ExternalErrorMap, data::flatten::SubmissionRecord, form::form_model::FormConfig,
    transport::error::TransportError,
};

/// Everything the form core needs from the remote service.
pub trait FormTransport {
    /// Download the form description.
    fn fetch_form(&self) -> Result<FormConfig, TransportError>;

    /// Download the flat record the form starts from.
    fn fetch_initial_data(&self) -> Result<Value, TransportError>;

    /// Create or partially update the resource.
    fn submit(&self, method: SubmitMethod, payload: &SubmissionRecord) -> Result<SubmitOutcome, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMethod {
    Post,
    Patch,
}

impl SubmitMethod {
    pub fn parse(method: Option<&str>) -> Result<Self, TransportError> {
        match method {
            Some("post") => Ok(SubmitMethod::Post),
            Some("patch") => Ok(SubmitMethod::Patch),
            other => Err(TransportError::UnsupportedMethod(
                other.unwrap_or("(none)").to_string(),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitMethod::Post => "post",
            SubmitMethod::Patch => "patch",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server took the data; carries the response body.
    Accepted(Value),
    /// The server refused the data with per-field messages.
    Rejected(ExternalErrorMap),
}

/// Extra form data goes underneath the payload; payload keys win.
pub fn merge_extra(extra: &Map<String, Value>, payload: &SubmissionRecord) -> Map<String, Value> {
    let mut merged = extra.clone();
    merged.extend(payload.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parsing() {
        assert_eq!(SubmitMethod::parse(Some("post")).unwrap(), SubmitMethod::Post);
        assert_eq!(SubmitMethod::parse(Some("patch")).unwrap(), SubmitMethod::Patch);
        assert!(matches!(
            SubmitMethod::parse(Some("put")),
            Err(TransportError::UnsupportedMethod(m)) if m == "put"
        ));
        assert!(SubmitMethod::parse(None).is_err());
    }

    #[test]
    fn payload_overrides_extra() {
        let extra = json!({"owner": 7, "name": "extra"});
        let payload = json!({"name": "form"});
        let merged = merge_extra(extra.as_object().unwrap(), payload.as_object().unwrap());
        assert_eq!(Value::Object(merged), json!({"owner": 7, "name": "form"}));
    }
}
