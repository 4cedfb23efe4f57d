//! Turns a question into a single line of answer text.

use crate::protocol::{Endpoint, GenerateRequest};
use crate::transport::{DeliveryError, Resolver, Transport};
use tracing::{debug, info};

/// Instruction placed ahead of every question.
pub const SYSTEM_PROMPT: &str = "You are a senior Site Reliability Engineer and Systems Administrator. \
You will provide short concise answers to technical questions no longer than 140 characters. \
Do not provide a follow up, do not provide any other responses other than the answer.";

/// Answer text shown when no attempt reached the server.
pub const UNREACHABLE_MESSAGE: &str = "Cannot contact ollama server.";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemma3:12b";

/// Outcome of one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The server's `response` text, verbatim.
    Answer(String),
    /// Nothing answered; the cause is kept for diagnostics.
    Unreachable(DeliveryError),
}

impl Reply {
    /// Text to show the user and record in history.
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(text) => text.as_str(),
            Reply::Unreachable(_) => UNREACHABLE_MESSAGE,
        }
    }
}

/// Full prompt field for a user question.
pub fn compose_prompt(question: &str) -> String {
    format!("{}\n\nUser: {}", SYSTEM_PROMPT, question)
}

/// Sends questions to one server through a [`Resolver`].
pub struct Dispatcher<T> {
    resolver: Resolver<T>,
    endpoint: Endpoint,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(resolver: Resolver<T>, endpoint: Endpoint) -> Self {
        Self { resolver, endpoint }
    }

    /// Ask `question` of `model`. Never fails; see [`Reply`].
    pub async fn ask(&self, question: &str, model: &str) -> Reply {
        let request = GenerateRequest::new(model, compose_prompt(question));
        debug!("Asking {} via {}", model, self.endpoint);

        match self.resolver.deliver(&self.endpoint, &request).await {
            Ok(response) => Reply::Answer(response.text().to_string()),
            Err(e) => {
                info!("No answer: {}", e);
                Reply::Unreachable(e)
            }
        }
    }
}
