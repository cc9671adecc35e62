use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::{
    control::correlator::error_map_from_value,
    data::flatten::SubmissionRecord,
    form::form_model::FormConfig,
    transport::{
        error::TransportError,
        transport::{FormTransport, SubmitMethod, SubmitOutcome, merge_extra},
    },
};

/// Talks to a Django REST Framework style endpoint over blocking HTTP.
///
/// `url` is the resource itself: GET returns the initial data, POST/PATCH
/// submit, and `<url>/form/` describes the form.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
    extra: Map<String, Value>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            extra: Map::new(),
        })
    }

    /// Sent as query parameters when fetching the form, and merged under
    /// every submitted payload.
    pub fn with_extra_form_data(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn form_url(&self) -> String {
        form_url(&self.url)
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.extra
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect()
    }
}

pub fn form_url(url: &str) -> String {
    let mut form_url = url.to_string();
    if !form_url.ends_with('/') {
        form_url.push('/');
    }
    form_url.push_str("form/");
    form_url
}

impl FormTransport for HttpTransport {
    fn fetch_form(&self) -> Result<FormConfig, TransportError> {
        let url = self.form_url();
        debug!("GET {}", url);

        let response = self.client.get(&url).query(&self.query_pairs()).send()?;
        let body = success_body(response)?;
        decode(&body, "form description")
    }

    fn fetch_initial_data(&self) -> Result<Value, TransportError> {
        debug!("GET {}", self.url);

        let response = self.client.get(&self.url).send()?;
        let body = success_body(response)?;
        decode(&body, "initial data")
    }

    fn submit(&self, method: SubmitMethod, payload: &SubmissionRecord) -> Result<SubmitOutcome, TransportError> {
        let body = merge_extra(&self.extra, payload);
        debug!("{} {} ({} fields)", method.as_str().to_uppercase(), self.url, body.len());

        let request = match method {
            SubmitMethod::Post => self.client.post(&self.url),
            SubmitMethod::Patch => self.client.patch(&self.url),
        };
        let response = request.json(&body).send()?;
        let status = response.status();
        let text = response.text()?;
        submit_outcome(status, text)
    }
}

/// Map a submit response onto its outcome. A failed request whose body is a
/// field error object is a rejection; any other failure is a status error.
fn submit_outcome(status: StatusCode, text: String) -> Result<SubmitOutcome, TransportError> {
    if status.is_success() {
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            decode(&text, "submit response")?
        };
        return Ok(SubmitOutcome::Accepted(value));
    }

    match serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| error_map_from_value(&v))
    {
        Some(errors) => {
            warn!("server rejected submission with {} field errors", errors.len());
            Ok(SubmitOutcome::Rejected(errors))
        }
        None => Err(TransportError::Status {
            status: status.as_u16(),
            body: text,
        }),
    }
}

fn success_body(response: reqwest::blocking::Response) -> Result<String, TransportError> {
    let status = response.status();
    let text = response.text()?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(TransportError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(text: &str, context: &str) -> Result<T, TransportError> {
    serde_json::from_str(text).map_err(|source| TransportError::Decode {
        context: context.to_string(),
        source,
    })
}
