//! Wire types for the Ollama generate API.
//!
//! The request is a single non-streaming POST to `<endpoint>/api/generate`
//! carrying JSON; the reply is a JSON object of which only `response` is read.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Host name that marks an endpoint as eligible for the resolver fallback.
pub const LOOPBACK_HOST: &str = "localhost";

/// Body of a generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier, e.g. `gemma3:12b`.
    pub model: String,
    /// Full prompt: system instruction followed by the user's question.
    pub prompt: String,
    /// Always false; streamed replies are not consumed.
    pub stream: bool,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

/// Decoded reply body. Every field other than `response` is ignored.
///
/// Only a JSON object decodes; arrays and scalars are rejected rather than
/// matched to fields by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct GenerateResponse {
    /// Generated text. Absent or `null` decodes as empty.
    pub response: Option<String>,
}

impl TryFrom<Map<String, Value>> for GenerateResponse {
    type Error = String;

    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let response = match body.get("response") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => return Err(format!("`response` is not a string: {}", other)),
        };
        Ok(Self { response })
    }
}

impl GenerateResponse {
    /// The generated text, or an empty string when the server omitted it.
    pub fn text(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

/// Base address of an Ollama server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse a base URL such as `http://localhost:11434`.
    pub fn parse(raw: &str) -> Result<Self> {
        let base = Url::parse(raw).with_context(|| format!("Invalid server URL: {}", raw))?;
        if base.host_str().is_none() {
            anyhow::bail!("Server URL has no host: {}", raw);
        }
        Ok(Self { base })
    }

    /// URL of the generate call on this endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base.as_str().trim_end_matches('/'))
    }

    /// Whether the host is literally the loopback name.
    pub fn is_loopback_name(&self) -> bool {
        self.base
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(LOOPBACK_HOST))
    }

    /// Same scheme, port and path with the host replaced by `ip`.
    pub fn with_host(&self, ip: Ipv4Addr) -> Option<Self> {
        let mut base = self.base.clone();
        base.set_ip_host(IpAddr::V4(ip)).ok()?;
        Some(Self { base })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str().trim_end_matches('/'))
    }
}
