use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rag::index::VectorIndex;

/// Interaction mode for a session. Also tags each recorded turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    #[default]
    Qa,
    QaCitations,
    Quiz,
}

/// One question/answer exchange. Append-only; the display layer renders the
/// sequence reverse-chronologically.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub context: Vec<String>,
    pub kind: ChatMode,
    pub asked_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(question: String, answer: String, context: Vec<String>, kind: ChatMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            context,
            kind,
            asked_at: Utc::now(),
        }
    }
}

/// All state for one session: the current index (absent until ingestion),
/// the flat chat log, and the active mode.
///
/// Lifecycle: empty → loaded (one ingestion event) → reset. Reset replaces
/// the whole value in a single assignment, so the index, history, mode and
/// counts can never be observed partially cleared.
#[derive(Default)]
pub struct Session {
    pub index: Option<Box<dyn VectorIndex>>,
    pub history: Vec<ChatTurn>,
    pub mode: ChatMode,
    pub page_count: usize,
    pub chunk_count: usize,
}

impl Session {
    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    pub fn load(&mut self, index: Box<dyn VectorIndex>, page_count: usize, chunk_count: usize) {
        self.index = Some(index);
        self.page_count = page_count;
        self.chunk_count = chunk_count;
    }

    pub fn record_turn(&mut self, turn: ChatTurn) {
        self.history.push(turn);
    }

    /// All-or-nothing: index discarded, history cleared, mode defaulted.
    pub fn reset(&mut self) {
        *self = Session::default();
    }
}
