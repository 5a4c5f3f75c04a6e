//! Conversation state machine.
//!
//! Owns the message log, the draft input, the Sending flag and the standing
//! error. A turn is split in two so a front end can keep rendering while the
//! request is in flight: [`Conversation::begin_turn`] records the user message
//! and hands back the text to send, [`Conversation::complete_turn`] folds the
//! client's result back in. [`Conversation::submit`] does both for callers
//! that can simply await.

use tracing::{debug, warn};

use crate::client::ChatApi;
use crate::error::{ClientError, ErrorKind};
use crate::state::{ChatResponse, Message, Role};

pub const DEFAULT_GREETING: &str =
    "Hi! I'm your supportive coach. What's on your mind today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    /// Idle, with an error banner standing until the next submission
    Failed,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    input: String,
    sending: bool,
    last_error: Option<String>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_greeting(DEFAULT_GREETING)
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            input: String::new(),
            sending: false,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> Phase {
        if self.sending {
            Phase::Sending
        } else if self.last_error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// Start a turn from the current input. Returns the trimmed text to send,
    /// or `None` (leaving everything untouched) when the input is blank or a
    /// request is already in flight.
    pub fn begin_turn(&mut self) -> Option<String> {
        if self.sending {
            debug!("submission ignored, request already in flight");
            return None;
        }

        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();

        self.messages.push(Message::user(text.clone()));
        self.input.clear();
        self.last_error = None;
        self.sending = true;

        Some(text)
    }

    /// Resolve the in-flight turn with exactly one assistant message.
    /// Returns `false` if no turn was in flight.
    pub fn complete_turn(&mut self, result: Result<ChatResponse, ClientError>) -> bool {
        if !self.sending {
            warn!("turn result arrived with no request in flight, dropping it");
            return false;
        }

        match result {
            Ok(response) => {
                self.messages.push(Message::assistant(response.reply));
            }
            Err(err) => {
                self.messages.push(Message::assistant(narrate(&err)));
                self.last_error = Some(err.message().to_string());
            }
        }
        self.sending = false;
        true
    }

    /// Run a whole turn against `api`. Returns `false` when the submission
    /// was ignored.
    pub async fn submit<C>(&mut self, api: &C) -> bool
    where
        C: ChatApi + ?Sized,
    {
        let Some(text) = self.begin_turn() else {
            return false;
        };
        let result = api.send(&text).await;
        self.complete_turn(result)
    }

    pub fn last_role(&self) -> Option<Role> {
        self.messages.last().map(|m| m.role)
    }
}

/// Wrap a classified error in the assistant's framing for the chat log.
pub fn narrate(err: &ClientError) -> String {
    match err.kind() {
        ErrorKind::QuotaExceeded => format!(
            "I can't respond right now because the AI service has run out of quota.\n\n{}",
            err.message()
        ),
        ErrorKind::Configuration | ErrorKind::Authentication => format!(
            "I can't respond right now because of an API key problem on the server.\n\n{}",
            err.message()
        ),
        ErrorKind::RateLimited | ErrorKind::Backend | ErrorKind::Connectivity => {
            format!("Sorry, I ran into a problem: {}", err.message())
        }
    }
}
