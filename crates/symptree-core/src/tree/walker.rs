//! Diagnosis session state machine.
//!
//! ```text
//! NotStarted ──start──▶ AwaitingAnswer(root)
//!                            │ answer
//!          ┌─────────────────┼──────────────────────┐
//!          ▼                 ▼                      ▼
//!   branch missing     symptom child          disease child
//!   (Undetermined,     AwaitingAnswer(child)  persist record,
//!    stay put)                                Complete(code)
//!
//! any state ──reset──▶ NotStarted
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builder::DecisionTree;
use crate::db::DbError;
use crate::models::{DecisionNode, DiagnosisRecord, Disease};
use crate::store::DiagnosisStore;

/// Session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Decision tree is empty; diagnosis is not ready")]
    NotReady,

    #[error("Diagnosis session already started")]
    AlreadyStarted,

    #[error("Diagnosis session is not awaiting an answer")]
    NotAwaitingAnswer,

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    AwaitingAnswer { node_id: String },
    Complete { result_code: String },
}

/// One recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub node_id: String,
    pub answer: bool,
}

/// What a single answer led to.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Moved to another question
    Next { node_id: String },
    /// Reached a disease; the record has been persisted
    Complete {
        record: DiagnosisRecord,
        disease: Disease,
    },
    /// No branch is defined for this answer yet; the session did not move
    Undetermined { node_id: String, answer: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Awaiting,
    Complete(String),
}

/// A single user's walk through a tree snapshot.
///
/// The tree is captured when the session is created; later edits to the
/// node store are not visible until a new session is loaded.
#[derive(Debug, Clone)]
pub struct DiagnosisSession {
    tree: DecisionTree,
    user_email: String,
    phase: Phase,
    path: Vec<bool>,
    answers: Vec<Answer>,
}

impl DiagnosisSession {
    /// Create a session over an already built tree.
    pub fn new(tree: DecisionTree, user_email: impl Into<String>) -> Self {
        Self {
            tree,
            user_email: user_email.into(),
            phase: Phase::NotStarted,
            path: Vec::new(),
            answers: Vec::new(),
        }
    }

    /// Fetch the node set and build a fresh snapshot for a new session.
    pub fn load<S: DiagnosisStore + ?Sized>(
        store: &S,
        user_email: impl Into<String>,
    ) -> SessionResult<Self> {
        let nodes = store.fetch_all_nodes()?;
        Ok(Self::new(DecisionTree::build(&nodes), user_email))
    }

    /// Move to the root question.
    pub fn start(&mut self) -> SessionResult<&DecisionNode> {
        if self.phase != Phase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        let root = self.tree.root().ok_or(SessionError::NotReady)?;

        tracing::debug!(user = %self.user_email, root = %root.code(), "diagnosis session started");
        self.phase = Phase::Awaiting;
        self.path.clear();
        self.answers.clear();
        Ok(&root.node)
    }

    /// Answer the current question.
    ///
    /// Store failures leave the session exactly as it was, so the same answer
    /// can be retried.
    pub fn answer<S: DiagnosisStore + ?Sized>(
        &mut self,
        answer: bool,
        store: &S,
    ) -> SessionResult<AnswerOutcome> {
        if self.phase != Phase::Awaiting {
            return Err(SessionError::NotAwaitingAnswer);
        }
        let current = self
            .tree
            .descend(&self.path)
            .ok_or(SessionError::NotReady)?;
        let asked = current.code().to_string();

        let Some(target) = current.branch(answer) else {
            tracing::warn!(node_id = %asked, answer, "no branch defined for answer");
            return Ok(AnswerOutcome::Undetermined {
                node_id: asked,
                answer,
            });
        };
        let target_code = target.code().to_string();

        if target.node.is_terminal() {
            let disease = store.fetch_disease_detail(&target_code)?;

            let mut symptom_codes = self.confirmed_symptoms();
            if answer {
                symptom_codes.push(asked.clone());
            }
            let record =
                DiagnosisRecord::new(self.user_email.clone(), symptom_codes, target_code.clone());
            store.persist_diagnosis(&record)?;

            tracing::info!(
                user = %self.user_email,
                disease = %target_code,
                record_id = %record.id,
                "diagnosis completed"
            );
            self.record(asked, answer);
            self.phase = Phase::Complete(target_code);
            return Ok(AnswerOutcome::Complete { record, disease });
        }

        tracing::debug!(from = %asked, to = %target_code, answer, "diagnosis advanced");
        self.record(asked, answer);
        Ok(AnswerOutcome::Next {
            node_id: target_code,
        })
    }

    /// Discard all progress and return to `NotStarted`.
    pub fn reset(&mut self) {
        self.phase = Phase::NotStarted;
        self.path.clear();
        self.answers.clear();
    }

    fn record(&mut self, node_id: String, answer: bool) {
        self.answers.push(Answer { node_id, answer });
        self.path.push(answer);
    }

    /// Current observable state.
    pub fn state(&self) -> SessionState {
        match &self.phase {
            Phase::NotStarted => SessionState::NotStarted,
            Phase::Awaiting => SessionState::AwaitingAnswer {
                node_id: self
                    .current_node()
                    .map(|n| n.node_id.clone())
                    .unwrap_or_default(),
            },
            Phase::Complete(code) => SessionState::Complete {
                result_code: code.clone(),
            },
        }
    }

    /// The question being asked, while awaiting an answer.
    pub fn current_node(&self) -> Option<&DecisionNode> {
        match self.phase {
            Phase::Awaiting => self.tree.descend(&self.path).map(|n| &n.node),
            _ => None,
        }
    }

    /// All recorded answers in the order given.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Codes answered "yes", in the order given.
    pub fn confirmed_symptoms(&self) -> Vec<String> {
        self.answers
            .iter()
            .filter(|a| a.answer)
            .map(|a| a.node_id.clone())
            .collect()
    }

    /// Resulting disease code once complete.
    pub fn result_code(&self) -> Option<&str> {
        match &self.phase {
            Phase::Complete(code) => Some(code),
            _ => None,
        }
    }

    /// Check if the session reached a diagnosis.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }

    /// Answers from the root to the current node.
    pub fn path(&self) -> &[bool] {
        &self.path
    }

    /// User running this session.
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// The snapshot this session walks.
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }
}
