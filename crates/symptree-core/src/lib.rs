//! Symptree Core Library
//!
//! Expert-system symptom diagnosis driven by a binary decision tree.
//!
//! # Architecture
//!
//! ```text
//!   Admin edits ──▶ decision_nodes (flat parent-pointer rows)
//!                              │
//!                       fetch_all_nodes
//!                              │
//!                              ▼
//!                   DecisionTree::build  (derived, rebuilt per load)
//!                              │
//!                              ▼
//!                   DiagnosisSession (snapshot of the tree)
//!                     start → answer → answer → …
//!                              │
//!              ┌───────────────┼────────────────┐
//!              ▼               ▼                ▼
//!         Next question   Undetermined     Complete(P..)
//!                         (branch missing)      │
//!                                               ▼
//!                                    diagnoses (append-only)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (DecisionNode, Symptom, Disease, DiagnosisRecord)
//! - [`store`]: Persistence boundary used by the engine
//! - [`tree`]: Tree builder, outline renderer and diagnosis walker
//! - [`config`]: Environment configuration

pub mod config;
pub mod db;
pub mod models;
pub mod store;
pub mod tree;

// Re-export commonly used types
pub use config::StoreConfig;
pub use db::Database;
pub use models::{DecisionNode, DiagnosisRecord, Disease, NewNode, NodeType, Symptom};
pub use store::{DiagnosisStore, MemoryStore};
pub use tree::{
    render_outline, AnswerOutcome, DecisionTree, DiagnosisSession, IntegrityWarning,
    SessionError, SessionState, TreeNode,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SymptreeError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid session state: {0}")]
    SessionState(String),
}

impl From<db::DbError> for SymptreeError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => SymptreeError::NotFound(what),
            db::DbError::Constraint(why) => SymptreeError::InvalidInput(why),
            other => SymptreeError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SymptreeError {
    fn from(e: serde_json::Error) -> Self {
        SymptreeError::SerializationError(e.to_string())
    }
}

impl From<SessionError> for SymptreeError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Store(db_err) => db_err.into(),
            other => SymptreeError::SessionState(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for SymptreeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SymptreeError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<SymptreeCore>, SymptreeError> {
    let db = Database::open(&path)?;
    Ok(SymptreeCore::wrap(db))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<SymptreeCore>, SymptreeError> {
    let db = Database::open_in_memory()?;
    Ok(SymptreeCore::wrap(db))
}

/// Open the database named by `SYMPTREE_DB_PATH` (default `symptree.db`).
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<SymptreeCore>, SymptreeError> {
    let db = StoreConfig::from_env().open()?;
    Ok(SymptreeCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct SymptreeCore {
    db: Arc<Mutex<Database>>,
}

impl SymptreeCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    fn build_tree(db: &Database) -> Result<DecisionTree, SymptreeError> {
        let nodes = db.fetch_all_nodes()?;
        Ok(DecisionTree::build(&nodes))
    }
}

#[uniffi::export]
impl SymptreeCore {
    // =========================================================================
    // Symptom Operations
    // =========================================================================

    /// Add or update a symptom.
    pub fn upsert_symptom(&self, symptom: FfiSymptom) -> Result<(), SymptreeError> {
        let db = self.db.lock()?;
        db.upsert_symptom(&symptom.into())?;
        Ok(())
    }

    /// Get a symptom by code.
    pub fn get_symptom(&self, code: String) -> Result<Option<FfiSymptom>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.get_symptom(&code)?.map(|s| s.into()))
    }

    /// List all symptoms.
    pub fn list_symptoms(&self) -> Result<Vec<FfiSymptom>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.list_symptoms()?.into_iter().map(|s| s.into()).collect())
    }

    /// Delete a symptom.
    pub fn delete_symptom(&self, code: String) -> Result<bool, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.delete_symptom(&code)?)
    }

    // =========================================================================
    // Disease Operations
    // =========================================================================

    /// Add or update a disease.
    pub fn upsert_disease(&self, disease: FfiDisease) -> Result<(), SymptreeError> {
        let db = self.db.lock()?;
        db.upsert_disease(&disease.into())?;
        Ok(())
    }

    /// Get a disease by code.
    pub fn get_disease(&self, code: String) -> Result<Option<FfiDisease>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.get_disease(&code)?.map(|d| d.into()))
    }

    /// List all diseases.
    pub fn list_diseases(&self) -> Result<Vec<FfiDisease>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.list_diseases()?.into_iter().map(|d| d.into()).collect())
    }

    /// Delete a disease.
    pub fn delete_disease(&self, code: String) -> Result<bool, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.delete_disease(&code)?)
    }

    // =========================================================================
    // Decision Tree Operations
    // =========================================================================

    /// Add a node to the decision tree.
    pub fn insert_node(
        &self,
        node_id: String,
        node_type: FfiNodeType,
        parent_id: Option<i64>,
        is_yes_path: Option<bool>,
    ) -> Result<FfiDecisionNode, SymptreeError> {
        let db = self.db.lock()?;
        let node = NewNode {
            node_id,
            node_type: node_type.into(),
            parent_id,
            is_yes_path,
        };
        Ok(db.insert_node(&node)?.into())
    }

    /// List all nodes in creation order.
    pub fn list_nodes(&self) -> Result<Vec<FfiDecisionNode>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.list_nodes()?.into_iter().map(|n| n.into()).collect())
    }

    /// Point a node at a different code.
    pub fn update_node_code(&self, id: i64, node_id: String) -> Result<bool, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.update_node_code(id, &node_id)?)
    }

    /// Delete a node and its subtree; returns the number of removed nodes.
    pub fn delete_node(&self, id: i64) -> Result<u32, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.delete_node(id)? as u32)
    }

    /// Indented outline of the current tree, with catalog names.
    pub fn tree_outline(&self) -> Result<String, SymptreeError> {
        let db = self.db.lock()?;
        let tree = Self::build_tree(&db)?;

        let mut names: HashMap<String, String> = HashMap::new();
        for symptom in db.list_symptoms()? {
            names.insert(symptom.code, symptom.name);
        }
        for disease in db.list_diseases()? {
            names.insert(disease.code, disease.name);
        }

        Ok(tree::render_outline_with(&tree, |code| {
            names.get(code).cloned()
        }))
    }

    /// Nested tree as JSON.
    pub fn tree_json(&self) -> Result<String, SymptreeError> {
        let db = self.db.lock()?;
        Ok(Self::build_tree(&db)?.to_json()?)
    }

    /// Integrity warnings for the current node set.
    pub fn tree_warnings(&self) -> Result<Vec<String>, SymptreeError> {
        let db = self.db.lock()?;
        let tree = Self::build_tree(&db)?;
        Ok(tree.warnings().iter().map(|w| w.to_string()).collect())
    }

    // =========================================================================
    // Diagnosis Operations
    // =========================================================================

    /// Begin a diagnosis over a snapshot of the current tree.
    pub fn new_session(&self, user_email: String) -> Result<Arc<SessionHandle>, SymptreeError> {
        let db = self.db.lock()?;
        let session = DiagnosisSession::load(&*db, user_email)?;
        Ok(Arc::new(SessionHandle {
            db: Arc::clone(&self.db),
            session: Mutex::new(session),
        }))
    }

    /// A user's diagnosis history, newest first.
    pub fn list_diagnoses_for_user(
        &self,
        user_email: String,
    ) -> Result<Vec<FfiDiagnosisRecord>, SymptreeError> {
        let db = self.db.lock()?;
        let records = db.list_diagnoses_for_user(&user_email)?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    /// Every diagnosis, newest first.
    pub fn list_diagnoses(&self) -> Result<Vec<FfiDiagnosisRecord>, SymptreeError> {
        let db = self.db.lock()?;
        Ok(db.list_diagnoses()?.into_iter().map(|r| r.into()).collect())
    }
}

// =========================================================================
// Session Object
// =========================================================================

/// One user's diagnosis session, shared with the UI.
#[derive(uniffi::Object)]
pub struct SessionHandle {
    db: Arc<Mutex<Database>>,
    session: Mutex<DiagnosisSession>,
}

impl SessionHandle {
    /// Question prompt for a node the session has already moved to.
    ///
    /// A failed catalog lookup yields `text: None` because the session has
    /// already moved to this node.
    fn question_for(db: &Database, node_id: String) -> FfiQuestion {
        let text = match db.fetch_symptom(&node_id) {
            Ok(symptom) => symptom.map(|s| s.question()),
            Err(e) => {
                tracing::warn!(node_id = %node_id, error = %e, "question text lookup failed");
                None
            }
        };
        FfiQuestion { node_id, text }
    }
}

#[uniffi::export]
impl SessionHandle {
    /// Move to the root question.
    pub fn start(&self) -> Result<FfiQuestion, SymptreeError> {
        let mut session = self.session.lock()?;
        let db = self.db.lock()?;
        let root = session.start()?.node_id.clone();
        Ok(Self::question_for(&db, root))
    }

    /// Answer the current question.
    pub fn answer(&self, answer: bool) -> Result<FfiAnswerOutcome, SymptreeError> {
        let mut session = self.session.lock()?;
        let db = self.db.lock()?;
        let outcome = session.answer(answer, &*db)?;

        Ok(match outcome {
            AnswerOutcome::Next { node_id } => FfiAnswerOutcome::Next {
                question: Self::question_for(&db, node_id),
            },
            AnswerOutcome::Complete { record, disease } => FfiAnswerOutcome::Complete {
                record: record.into(),
                disease: disease.into(),
            },
            AnswerOutcome::Undetermined { node_id, answer } => {
                FfiAnswerOutcome::Undetermined { node_id, answer }
            }
        })
    }

    /// Discard progress.
    pub fn reset(&self) -> Result<(), SymptreeError> {
        self.session.lock()?.reset();
        Ok(())
    }

    /// Current session state.
    pub fn state(&self) -> Result<FfiSessionState, SymptreeError> {
        Ok(self.session.lock()?.state().into())
    }

    /// The question being asked, if any.
    pub fn current_question(&self) -> Result<Option<FfiQuestion>, SymptreeError> {
        let session = self.session.lock()?;
        let Some(node) = session.current_node() else {
            return Ok(None);
        };
        let db = self.db.lock()?;
        Ok(Some(Self::question_for(&db, node.node_id.clone())))
    }

    /// Codes answered "yes" so far.
    pub fn confirmed_symptoms(&self) -> Result<Vec<String>, SymptreeError> {
        Ok(self.session.lock()?.confirmed_symptoms())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiNodeType {
    Symptom,
    Disease,
}

impl From<NodeType> for FfiNodeType {
    fn from(t: NodeType) -> Self {
        match t {
            NodeType::Symptom => FfiNodeType::Symptom,
            NodeType::Disease => FfiNodeType::Disease,
        }
    }
}

impl From<FfiNodeType> for NodeType {
    fn from(t: FfiNodeType) -> Self {
        match t {
            FfiNodeType::Symptom => NodeType::Symptom,
            FfiNodeType::Disease => NodeType::Disease,
        }
    }
}

/// FFI-safe decision node.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDecisionNode {
    pub id: i64,
    pub node_id: String,
    pub node_type: FfiNodeType,
    pub parent_id: Option<i64>,
    pub is_yes_path: Option<bool>,
    pub created_at: String,
}

impl From<DecisionNode> for FfiDecisionNode {
    fn from(node: DecisionNode) -> Self {
        Self {
            id: node.id,
            node_id: node.node_id,
            node_type: node.node_type.into(),
            parent_id: node.parent_id,
            is_yes_path: node.is_yes_path,
            created_at: node.created_at,
        }
    }
}

/// FFI-safe symptom.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSymptom {
    pub code: String,
    pub name: String,
}

impl From<Symptom> for FfiSymptom {
    fn from(symptom: Symptom) -> Self {
        Self {
            code: symptom.code,
            name: symptom.name,
        }
    }
}

impl From<FfiSymptom> for Symptom {
    fn from(symptom: FfiSymptom) -> Self {
        Symptom::new(symptom.code, symptom.name)
    }
}

/// FFI-safe disease.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDisease {
    pub code: String,
    pub name: String,
    pub description: String,
    pub solution: String,
    pub image_path: Option<String>,
}

impl From<Disease> for FfiDisease {
    fn from(disease: Disease) -> Self {
        Self {
            code: disease.code,
            name: disease.name,
            description: disease.description,
            solution: disease.solution,
            image_path: disease.image_path,
        }
    }
}

impl From<FfiDisease> for Disease {
    fn from(disease: FfiDisease) -> Self {
        let mut d = Disease::new(disease.code, disease.name);
        d.description = disease.description;
        d.solution = disease.solution;
        d.image_path = disease.image_path;
        d
    }
}

/// FFI-safe diagnosis record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosisRecord {
    pub id: String,
    pub user_email: String,
    pub symptom_codes: Vec<String>,
    pub disease_code: String,
    pub created_at: String,
}

impl From<DiagnosisRecord> for FfiDiagnosisRecord {
    fn from(record: DiagnosisRecord) -> Self {
        Self {
            id: record.id,
            user_email: record.user_email,
            symptom_codes: record.symptom_codes,
            disease_code: record.disease_code,
            created_at: record.created_at,
        }
    }
}

/// FFI-safe question prompt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQuestion {
    /// Node code being asked about
    pub node_id: String,
    /// Question text, when the symptom is in the catalog
    pub text: Option<String>,
}

/// FFI-safe answer outcome.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiAnswerOutcome {
    Next {
        question: FfiQuestion,
    },
    Complete {
        record: FfiDiagnosisRecord,
        disease: FfiDisease,
    },
    Undetermined {
        node_id: String,
        answer: bool,
    },
}

/// FFI-safe session state.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSessionState {
    NotStarted,
    AwaitingAnswer { node_id: String },
    Complete { result_code: String },
}

impl From<SessionState> for FfiSessionState {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::NotStarted => FfiSessionState::NotStarted,
            SessionState::AwaitingAnswer { node_id } => FfiSessionState::AwaitingAnswer { node_id },
            SessionState::Complete { result_code } => FfiSessionState::Complete { result_code },
        }
    }
}
