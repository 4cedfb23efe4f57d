//! Request delivery with a single fallback address.
//!
//! A request goes to the configured endpoint first. If that fails and the
//! endpoint's host is `localhost`, it is sent once more to the host offered by
//! the [`FallbackSource`]. Every failure ends up as a [`DeliveryError`]; nothing
//! here panics or leaks a raw client error.

pub mod fallback;
pub mod http;

pub use fallback::FallbackSource;
pub use http::HttpTransport;

use crate::protocol::{Endpoint, GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Why a request produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Could not connect to Ollama server: {0}")]
    Connection(String),
    #[error("Request timed out. The server might be overloaded.")]
    Timeout,
    #[error("{}", describe_status(.0))]
    Status(u16),
    #[error("Invalid response from server, not valid JSON: {0}")]
    MalformedBody(String),
    #[error("Server unreachable after {attempts} attempt(s); last error: {last}")]
    Unreachable {
        attempts: usize,
        last: Box<DeliveryError>,
    },
}

fn describe_status(code: &u16) -> String {
    match *code {
        404 => "HTTP 404: model not found, try another model".to_string(),
        500..=599 => format!("HTTP {}: the Ollama service might be having issues", code),
        _ => format!("HTTP error {}", code),
    }
}

/// One attempt at a generate call against one endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate(
        &self,
        endpoint: &Endpoint,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, DeliveryError>;
}

/// Picks the endpoint that answers: the primary, or its fallback.
pub struct Resolver<T> {
    transport: T,
    fallback: FallbackSource,
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, fallback: FallbackSource) -> Self {
        Self {
            transport,
            fallback,
        }
    }

    /// Deliver `request`, making at most two attempts.
    ///
    /// Returns [`DeliveryError::Unreachable`] when every attempt failed.
    pub async fn deliver(
        &self,
        primary: &Endpoint,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, DeliveryError> {
        let primary_error = match self.transport.generate(primary, request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        info!("Request to {} failed: {}", primary, primary_error);

        let Some(alternate) = self.alternate_endpoint(primary) else {
            return Err(DeliveryError::Unreachable {
                attempts: 1,
                last: Box::new(primary_error),
            });
        };

        info!("Retrying via fallback {}", alternate);
        match self.transport.generate(&alternate, request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                info!("Request to {} failed: {}", alternate, e);
                Err(DeliveryError::Unreachable {
                    attempts: 2,
                    last: Box::new(e),
                })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    fn alternate_endpoint(&self, primary: &Endpoint) -> Option<Endpoint> {
        if !primary.is_loopback_name() {
            debug!("{} is not a loopback name, no fallback", primary);
            return None;
        }
        let ip = self.fallback.alternate_host()?;
        primary.with_host(ip)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory transport answering from a URL table and recording each call.
    #[derive(Default)]
    pub struct ScriptedTransport {
        outcomes: HashMap<String, Result<GenerateResponse, DeliveryError>>,
        pub calls: Mutex<Vec<GenerateCall>>,
    }

    #[derive(Debug, Clone)]
    pub struct GenerateCall {
        pub url: String,
        pub request: GenerateRequest,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `url` with the given text.
        pub fn reply(mut self, url: &str, text: &str) -> Self {
            let response = GenerateResponse {
                response: Some(text.to_string()),
            };
            self.outcomes.insert(url.to_string(), Ok(response));
            self
        }

        /// Answer `url` with a raw decoded body.
        pub fn body(mut self, url: &str, response: GenerateResponse) -> Self {
            self.outcomes.insert(url.to_string(), Ok(response));
            self
        }

        /// Fail `url` with `error`.
        pub fn fail(mut self, url: &str, error: DeliveryError) -> Self {
            self.outcomes.insert(url.to_string(), Err(error));
            self
        }

        pub fn urls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.url.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn generate(
            &self,
            endpoint: &Endpoint,
            request: &GenerateRequest,
        ) -> Result<GenerateResponse, DeliveryError> {
            let url = endpoint.generate_url();
            self.calls.lock().unwrap().push(GenerateCall {
                url: url.clone(),
                request: request.clone(),
            });
            self.outcomes
                .get(&url)
                .cloned()
                .unwrap_or_else(|| Err(DeliveryError::Connection(format!("no route to {}", url))))
        }
    }
}
