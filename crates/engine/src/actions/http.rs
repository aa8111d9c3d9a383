// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request action.

use super::{build_client, check_url};
use crate::{template, ActionResult, ExecError, ExecutionContext};
use regex::Regex;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Sentinel stored when the declared extraction regex matches nothing.
const NO_MATCH_SENTINEL: &str = "No matches for pattern found in response body";

/// Issue an HTTP request; the response body (optionally wrapped with its
/// headers, optionally regex-filtered) lands in a step var or an
/// environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpRequest {
    #[serde(rename = "http_request")]
    pub url: String,
    /// HTTP method; GET when absent.
    #[serde(default, rename = "type")]
    pub method: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub headers: Vec<KeyValue>,
    #[serde(default)]
    pub parameters: Vec<KeyValue>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    /// Name of an environment variable to export the response into.
    #[serde(default)]
    pub response: Option<String>,
    /// Wrap the body in a `{head, body}` JSON envelope.
    #[serde(default)]
    pub response_headers: bool,
    #[serde(default)]
    pub outputvar: Option<String>,
}

/// A header or query parameter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyValue {
    pub field: String,
    pub value: String,
}

impl HttpRequest {
    pub fn is_empty(&self) -> bool {
        self.url.trim().is_empty()
    }

    fn method(&self) -> Result<Method, ExecError> {
        let name = self
            .method
            .as_deref()
            .unwrap_or("GET")
            .to_ascii_uppercase();
        match name.as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "HEAD" => Ok(Method::HEAD),
            "PATCH" => Ok(Method::PATCH),
            "OPTIONS" => Ok(Method::OPTIONS),
            other => Err(ExecError::Validation(format!(
                "unsupported http method {other:?}"
            ))),
        }
    }

    pub fn template(&mut self, ctx: &ExecutionContext) -> Result<(), ExecError> {
        let mut fields = vec![&mut self.url];
        fields.extend(self.method.as_mut());
        fields.extend(self.proxy.as_mut());
        fields.extend(self.body.as_mut());
        fields.extend(self.regex.as_mut());
        for entry in self.headers.iter_mut().chain(self.parameters.iter_mut()) {
            fields.push(&mut entry.field);
            fields.push(&mut entry.value);
        }
        template::render_fields(&ctx.vars, fields)
    }

    pub fn validate(&mut self, _ctx: &ExecutionContext) -> Result<(), ExecError> {
        if self.is_empty() {
            return Err(ExecError::Validation("http_request url is empty".into()));
        }
        check_url("url", &self.url)?;
        if let Some(proxy) = self.proxy.as_deref() {
            check_url("proxy", proxy)?;
        }
        self.method()?;
        for entry in self.headers.iter().chain(self.parameters.iter()) {
            if entry.field.is_empty() || entry.value.is_empty() {
                return Err(ExecError::Validation(
                    "http headers and parameters need both field and value".into(),
                ));
            }
        }
        if let Some(pattern) = self.regex.as_deref() {
            Regex::new(pattern).map_err(|e| {
                ExecError::Validation(format!("invalid response regex {pattern:?}: {e}"))
            })?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, ctx: &mut ExecutionContext) -> Result<ActionResult, ExecError> {
        let client = build_client(ctx.cfg.no_proxy, self.proxy.as_deref())?;
        let method = self.method()?;
        tracing::info!(method = %method, url = %self.url, "sending http request");

        let mut request = client.request(method, self.url.as_str());
        if !self.parameters.is_empty() {
            let query: Vec<(&str, &str)> = self
                .parameters
                .iter()
                .map(|p| (p.field.as_str(), p.value.as_str()))
                .collect();
            request = request.query(&query);
        }
        for header in &self.headers {
            request = request.header(header.field.as_str(), header.value.as_str());
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        let head: serde_json::Map<String, serde_json::Value> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    serde_json::Value::String(
                        value.to_str().unwrap_or_default().to_string(),
                    ),
                )
            })
            .collect();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "http response");

        let mut payload = if self.response_headers {
            serde_json::json!({ "head": head, "body": body }).to_string()
        } else {
            body
        };
        if let Some(pattern) = self.regex.as_deref() {
            let re = Regex::new(pattern).map_err(|e| {
                ExecError::Validation(format!("invalid response regex {pattern:?}: {e}"))
            })?;
            payload = match re.captures(&payload) {
                Some(captures) => captures
                    .get(1)
                    .or_else(|| captures.get(0))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                None => NO_MATCH_SENTINEL.to_string(),
            };
        }

        if let Some(var) = &self.outputvar {
            ctx.vars.step_vars.insert(var.clone(), payload.clone());
        } else if let Some(env_name) = &self.response {
            export_response(env_name, &payload);
        }
        Ok(ActionResult {
            stdout: payload,
            ..ActionResult::default()
        })
    }
}

/// Export the response into the process environment.
///
/// Legacy behavior carried from the original tool; kept in one place so it
/// can be disabled wholesale.
fn export_response(name: &str, value: &str) {
    tracing::debug!(name, "exporting http response to process environment");
    std::env::set_var(name, value);
}
