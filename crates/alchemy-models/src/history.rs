//! Bounded clarification history.
//!
//! The history is append-only: exchanges are never edited in place. The only
//! other update is a bulk drop that keeps the most recent tail, applied right
//! before code generation to bound the prompt size.

use serde::{Deserialize, Serialize};

/// Number of exchanges retained by a prune when nothing else is configured.
pub const DEFAULT_HISTORY_KEEP: usize = 3;

/// One clarification round: the questions asked and the human's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    /// Follow-up questions presented to the human.
    pub question: String,
    /// The human's reply, verbatim.
    pub answer: String,
}

impl Exchange {
    /// Create a new exchange.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The two update shapes the history accepts.
///
/// These are deliberately separate operations on the same field; a batch
/// append never truncates and a prune never adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryUpdate {
    /// Append a batch of exchanges after the existing ones.
    Append(Vec<Exchange>),
    /// Keep only the most recent `keep` exchanges.
    Prune {
        /// Number of exchanges to retain.
        keep: usize,
    },
}

/// Ordered log of clarification exchanges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory(Vec<Exchange>);

impl ConversationHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// All exchanges, oldest first.
    pub fn exchanges(&self) -> &[Exchange] {
        &self.0
    }

    /// Number of exchanges.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply an update, returning the new history.
    pub fn apply(mut self, update: HistoryUpdate) -> Self {
        match update {
            HistoryUpdate::Append(exchanges) => {
                self.0.extend(exchanges);
                self
            }
            HistoryUpdate::Prune { keep } => {
                if self.0.len() > keep {
                    let drop = self.0.len() - keep;
                    self.0.drain(..drop);
                }
                self
            }
        }
    }
}

impl From<Vec<Exchange>> for ConversationHistory {
    fn from(exchanges: Vec<Exchange>) -> Self {
        Self(exchanges)
    }
}
