//! Persistence boundary for the diagnosis engine.
//!
//! The tree builder and the walker only talk to storage through
//! [`DiagnosisStore`], so they can run against SQLite ([`Database`]) or the
//! in-memory [`MemoryStore`].

use std::cell::RefCell;

use crate::db::{Database, DbError, DbResult};
use crate::models::{DecisionNode, DiagnosisRecord, Disease, NewNode, Symptom};

/// Row-level access the diagnosis engine needs from a persistence store.
pub trait DiagnosisStore {
    /// Read the full node set, ordered by creation time.
    fn fetch_all_nodes(&self) -> DbResult<Vec<DecisionNode>>;

    /// Read a symptom (the question text for a node code).
    fn fetch_symptom(&self, code: &str) -> DbResult<Option<Symptom>>;

    /// Read full disease metadata for a terminal code.
    fn fetch_disease_detail(&self, code: &str) -> DbResult<Disease>;

    /// Append an immutable diagnosis record.
    fn persist_diagnosis(&self, record: &DiagnosisRecord) -> DbResult<()>;

    /// Add one record to the flat node store.
    fn insert_node(&self, node: &NewNode) -> DbResult<DecisionNode>;
}

impl DiagnosisStore for Database {
    fn fetch_all_nodes(&self) -> DbResult<Vec<DecisionNode>> {
        self.list_nodes()
    }

    fn fetch_symptom(&self, code: &str) -> DbResult<Option<Symptom>> {
        self.get_symptom(code)
    }

    fn fetch_disease_detail(&self, code: &str) -> DbResult<Disease> {
        self.get_disease(code)?
            .ok_or_else(|| DbError::NotFound(format!("disease {}", code)))
    }

    fn persist_diagnosis(&self, record: &DiagnosisRecord) -> DbResult<()> {
        self.insert_diagnosis(record)
    }

    fn insert_node(&self, node: &NewNode) -> DbResult<DecisionNode> {
        Database::insert_node(self, node)
    }
}

/// In-memory store for tests and embedders without SQLite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: RefCell<Vec<DecisionNode>>,
    symptoms: RefCell<Vec<Symptom>>,
    diseases: RefCell<Vec<Disease>>,
    diagnoses: RefCell<Vec<DiagnosisRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with raw node records.
    ///
    /// Records are taken as-is, without invariant checks, so callers can
    /// model inconsistent data.
    pub fn with_nodes(nodes: Vec<DecisionNode>) -> Self {
        let store = Self::new();
        *store.nodes.borrow_mut() = nodes;
        store
    }

    /// Insert or replace a symptom.
    pub fn put_symptom(&self, symptom: Symptom) {
        let mut symptoms = self.symptoms.borrow_mut();
        symptoms.retain(|s| s.code != symptom.code);
        symptoms.push(symptom);
    }

    /// Insert or replace a disease.
    pub fn put_disease(&self, disease: Disease) {
        let mut diseases = self.diseases.borrow_mut();
        diseases.retain(|d| d.code != disease.code);
        diseases.push(disease);
    }

    /// Diagnoses persisted so far, oldest first.
    pub fn diagnoses(&self) -> Vec<DiagnosisRecord> {
        self.diagnoses.borrow().clone()
    }
}

impl DiagnosisStore for MemoryStore {
    fn fetch_all_nodes(&self) -> DbResult<Vec<DecisionNode>> {
        Ok(self.nodes.borrow().clone())
    }

    fn fetch_symptom(&self, code: &str) -> DbResult<Option<Symptom>> {
        Ok(self
            .symptoms
            .borrow()
            .iter()
            .find(|s| s.code == code)
            .cloned())
    }

    fn fetch_disease_detail(&self, code: &str) -> DbResult<Disease> {
        self.diseases
            .borrow()
            .iter()
            .find(|d| d.code == code)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("disease {}", code)))
    }

    fn persist_diagnosis(&self, record: &DiagnosisRecord) -> DbResult<()> {
        let mut diagnoses = self.diagnoses.borrow_mut();
        if diagnoses.iter().any(|d| d.id == record.id) {
            return Err(DbError::Constraint(format!(
                "diagnosis {} already exists",
                record.id
            )));
        }
        diagnoses.push(record.clone());
        Ok(())
    }

    fn insert_node(&self, node: &NewNode) -> DbResult<DecisionNode> {
        let mut nodes = self.nodes.borrow_mut();
        node.validate_against(&nodes).map_err(DbError::Constraint)?;

        let id = nodes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let record = DecisionNode {
            id,
            node_id: node.node_id.clone(),
            node_type: node.node_type,
            parent_id: node.parent_id,
            is_yes_path: node.is_yes_path,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        nodes.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeType;

    fn exercise(store: &dyn DiagnosisStore) {
        let root = store.insert_node(&NewNode::root("G01")).unwrap();
        let leaf = store
            .insert_node(&NewNode::child("P01", NodeType::Disease, root.id, true))
            .unwrap();
        assert!(store
            .insert_node(&NewNode::child("P02", NodeType::Disease, root.id, true))
            .is_err());

        let nodes = store.fetch_all_nodes().unwrap();
        assert_eq!(nodes, vec![root, leaf]);

        assert!(matches!(
            store.fetch_disease_detail("P01"),
            Err(DbError::NotFound(_))
        ));

        let record = DiagnosisRecord::new("a@example.com".into(), vec!["G01".into()], "P01".into());
        store.persist_diagnosis(&record).unwrap();
        assert!(store.persist_diagnosis(&record).is_err());
    }

    #[test]
    fn test_memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_database_store_contract() {
        exercise(&Database::open_in_memory().unwrap());
    }

    #[test]
    fn test_memory_store_catalog() {
        let store = MemoryStore::new();
        store.put_symptom(Symptom::new("G01".into(), "Fever".into()));
        store.put_symptom(Symptom::new("G01".into(), "High fever".into()));
        store.put_disease(Disease::new("P01".into(), "Flu".into()));

        assert_eq!(store.fetch_symptom("G01").unwrap().unwrap().name, "High fever");
        assert!(store.fetch_symptom("G02").unwrap().is_none());
        assert_eq!(store.fetch_disease_detail("P01").unwrap().name, "Flu");
    }
}
