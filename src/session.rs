//! Chat session glue between user input and the dispatcher

use crate::dispatch::{Dispatcher, MessageRequest};
use crate::error::SessionError;
use crate::identity::IdentityResolver;
use crate::rate_limit::RateLimiter;
use std::sync::Arc;

/// Prefix that routes plain text to the backend's AI handler
pub const DEFAULT_COMMAND_PREFIX: &str = ".ai ";

/// Rate-limit key used when the public IP is unknown
pub const ANONYMOUS_USER: &str = "anonymous";

/// Who said a line of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One line of the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Prepare user text for the backend: slash commands pass through, anything
/// else gets `prefix` in front. An empty prefix disables this.
pub fn format_for_server(message: &str, prefix: &str) -> String {
    if prefix.is_empty() || message.starts_with('/') {
        message.to_string()
    } else {
        format!("{}{}", prefix, message)
    }
}

/// A conversation with the backend.
///
/// The dispatcher, identity and limiter are shared handles, so several
/// sessions in one process share the cache and the per-user rate limit.
pub struct ChatSession {
    dispatcher: Arc<Dispatcher>,
    identity: Arc<IdentityResolver>,
    limiter: Arc<RateLimiter>,
    command_prefix: String,
    history: Vec<Turn>,
}

impl ChatSession {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        identity: Arc<IdentityResolver>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            dispatcher,
            identity,
            limiter,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            history: Vec::new(),
        }
    }

    /// Builder-style setter for the command prefix
    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Trim, rate-limit, format and send one user message.
    ///
    /// Backend failures do not surface here; the reply is then the
    /// dispatcher's fallback text.
    pub async fn submit(&mut self, input: &str) -> Result<String, SessionError> {
        let message = input.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let ip = self.identity.public_ip().await;
        let user = ip.as_deref().unwrap_or(ANONYMOUS_USER);
        if !self.limiter.is_allowed(user) {
            tracing::info!("Rate limit hit for {}", user);
            return Err(SessionError::RateLimited);
        }

        self.history.push(Turn {
            role: Role::User,
            text: message.to_string(),
        });

        let request = MessageRequest::new(format_for_server(message, &self.command_prefix))
            .with_jid(self.identity.jid().await);
        let reply = self.dispatcher.send_request(request).await;

        self.history.push(Turn {
            role: Role::Bot,
            text: reply.clone(),
        });
        Ok(reply)
    }

    /// Start a new chat. Identity and rate-limit state are kept.
    pub fn reset(&mut self) {
        self.history.clear();
        tracing::debug!("Chat cleared");
    }
}
