//! Scripted gateway double for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::gateway::LlmGateway;
use crate::message::Message;
use crate::tool::ToolDefinition;

/// A canned gateway reply.
#[derive(Debug)]
pub enum Reply {
    /// Free-text completion.
    Text(String),
    /// Tool call arguments, or no tool call at all.
    Tool(Option<Value>),
    /// A failed call.
    Error(GatewayError),
}

impl Reply {
    /// Free-text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Tool call with `args`.
    pub fn tool(args: Value) -> Self {
        Self::Tool(Some(args))
    }

    /// Answer without calling the tool.
    pub fn no_tool() -> Self {
        Self::Tool(None)
    }

    /// Failed call.
    pub fn error(error: GatewayError) -> Self {
        Self::Error(error)
    }
}

/// Which gateway method was called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// `complete`.
    Text,
    /// `complete_with_tool` with the named tool.
    Tool(String),
}

/// A recorded gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Method called.
    pub kind: CallKind,
    /// Messages sent.
    pub messages: Vec<Message>,
}

/// Gateway that plays back queued replies in order and records every call.
///
/// An exhausted queue answers with a configuration error so a runaway state
/// machine stops instead of looping.
#[derive(Debug, Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockGateway {
    /// Create a gateway with a reply script.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply.
    pub fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls of `kind`.
    pub fn count(&self, kind: &CallKind) -> usize {
        self.calls().iter().filter(|c| &c.kind == kind).count()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self, kind: CallKind, messages: &[Message]) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                kind,
                messages: messages.to_vec(),
            });
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        match self.next(CallKind::Text, messages) {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Error(e)) => Err(e),
            Some(other) => Err(GatewayError::Malformed(format!(
                "expected a text reply, scripted {:?}",
                other
            ))),
            None => Err(GatewayError::Configuration("mock reply script exhausted".into())),
        }
    }

    async fn complete_with_tool(
        &self,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<Option<Value>> {
        match self.next(CallKind::Tool(tool.name.clone()), messages) {
            Some(Reply::Tool(args)) => Ok(args),
            Some(Reply::Error(e)) => Err(e),
            Some(other) => Err(GatewayError::Malformed(format!(
                "expected a tool reply, scripted {:?}",
                other
            ))),
            None => Err(GatewayError::Configuration("mock reply script exhausted".into())),
        }
    }
}
