//! JSON calls from the functions to the stores.

use crate::errors::FunctionError;
use crate::metrics_defs::{DOWNSTREAM_DURATION, DOWNSTREAM_FAILURES};
use reqwest::Method;
use serde_json::Value;
use shared::http::{downstream_error_message, error_chain};
use std::time::Instant;
use url::Url;

#[derive(Clone)]
pub struct Downstream {
    client: reqwest::Client,
    function: &'static str,
}

impl Downstream {
    /// `function` labels the metrics and logs of every call.
    pub fn new(function: &'static str) -> Self {
        Downstream {
            client: reqwest::Client::new(),
            function,
        }
    }

    /// Sends `body` as JSON and decodes the JSON answer. An empty success
    /// body decodes to `null`.
    pub async fn send_json(&self, method: Method, url: Url, body: &Value) -> Result<Value, FunctionError> {
        let start = Instant::now();
        let result = self.exchange(method.clone(), url.clone(), body).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(_) => "error",
        };
        shared::histogram!(DOWNSTREAM_DURATION, "function" => self.function, "outcome" => outcome)
            .record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            shared::counter!(DOWNSTREAM_FAILURES, "function" => self.function).increment(1);
            tracing::warn!(
                function = self.function,
                %method,
                %url,
                status = e.status().as_u16(),
                error = %e,
                "downstream call failed"
            );
        }
        result
    }

    async fn exchange(&self, method: Method, url: Url, body: &Value) -> Result<Value, FunctionError> {
        let response = self
            .client
            .request(method, url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| FunctionError::Transport(error_chain(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FunctionError::Transport(error_chain(&e)))?;

        if !status.is_success() {
            return Err(FunctionError::Downstream {
                status,
                message: downstream_error_message(status, &bytes),
            });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| FunctionError::InvalidResponse(format!("invalid JSON from {url}: {e}")))
    }
}

/// The string `id` member of a created record.
pub fn created_id(record: &Value, kind: &str) -> Result<String, FunctionError> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| FunctionError::InvalidResponse(format!("created {kind} has no id")))
}
