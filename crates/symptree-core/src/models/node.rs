//! Decision node models.

use serde::{Deserialize, Serialize};

/// Role of a node in the decision tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Question node: asks whether a symptom is present
    Symptom,
    /// Outcome node: names the diagnosed disease
    Disease,
}

impl NodeType {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Symptom => "symptom",
            NodeType::Disease => "disease",
        }
    }

    /// Parse the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "symptom" => Some(NodeType::Symptom),
            "disease" => Some(NodeType::Disease),
            _ => None,
        }
    }

    /// Whether nodes of this type end a diagnosis.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeType::Disease)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted decision tree record (flat, parent-pointer form).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionNode {
    /// Store-assigned identifier
    pub id: i64,
    /// Human-readable code ("G01" for symptoms, "P01" for diseases)
    pub node_id: String,
    /// Question or outcome
    pub node_type: NodeType,
    /// Owning node; `None` only for the root
    pub parent_id: Option<i64>,
    /// Which branch of the parent this node occupies; `None` only for the root
    pub is_yes_path: Option<bool>,
    /// Creation timestamp
    pub created_at: String,
}

impl DecisionNode {
    /// Check if this is a root record.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check if this node ends a diagnosis.
    pub fn is_terminal(&self) -> bool {
        self.node_type.is_terminal()
    }
}

/// Admin input for adding a node to the flat store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewNode {
    pub node_id: String,
    pub node_type: NodeType,
    pub parent_id: Option<i64>,
    pub is_yes_path: Option<bool>,
}

impl NewNode {
    /// A root question node.
    pub fn root(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: NodeType::Symptom,
            parent_id: None,
            is_yes_path: None,
        }
    }

    /// A child node on the given branch of `parent_id`.
    pub fn child(
        node_id: impl Into<String>,
        node_type: NodeType,
        parent_id: i64,
        is_yes_path: bool,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type,
            parent_id: Some(parent_id),
            is_yes_path: Some(is_yes_path),
        }
    }

    /// Check this insert against the existing records.
    ///
    /// Returns a description of the first violated tree invariant.
    pub fn validate_against(&self, existing: &[DecisionNode]) -> Result<(), String> {
        if self.node_id.trim().is_empty() {
            return Err("node_id must not be empty".into());
        }

        let Some(parent_id) = self.parent_id else {
            if self.is_yes_path.is_some() {
                return Err("root node cannot occupy a branch".into());
            }
            if self.node_type.is_terminal() {
                return Err("root node must be a symptom".into());
            }
            if let Some(root) = existing.iter().find(|n| n.is_root()) {
                return Err(format!("tree already has a root ({})", root.node_id));
            }
            return Ok(());
        };

        let Some(is_yes_path) = self.is_yes_path else {
            return Err("child node must specify is_yes_path".into());
        };

        let parent = existing
            .iter()
            .find(|n| n.id == parent_id)
            .ok_or_else(|| format!("parent {} does not exist", parent_id))?;

        if parent.is_terminal() {
            return Err(format!(
                "parent {} is a disease node and cannot have children",
                parent.node_id
            ));
        }

        if existing
            .iter()
            .any(|n| n.parent_id == Some(parent_id) && n.is_yes_path == Some(is_yes_path))
        {
            return Err(format!(
                "{} branch of {} is already taken",
                branch_label(is_yes_path),
                parent.node_id
            ));
        }

        Ok(())
    }
}

/// "yes" or "no".
pub fn branch_label(is_yes_path: bool) -> &'static str {
    if is_yes_path {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, code: &str, ty: NodeType, parent: Option<i64>, yes: Option<bool>) -> DecisionNode {
        DecisionNode {
            id,
            node_id: code.into(),
            node_type: ty,
            parent_id: parent,
            is_yes_path: yes,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_node_type_round_trip_str() {
        assert_eq!(NodeType::parse("symptom"), Some(NodeType::Symptom));
        assert_eq!(NodeType::parse(NodeType::Disease.as_str()), Some(NodeType::Disease));
        assert_eq!(NodeType::parse("Symptom"), None);
    }

    #[test]
    fn test_node_type_serde_lowercase() {
        let json = serde_json::to_string(&NodeType::Disease).unwrap();
        assert_eq!(json, "\"disease\"");
    }

    #[test]
    fn test_validate_root() {
        assert!(NewNode::root("G01").validate_against(&[]).is_ok());

        let existing = vec![node(1, "G01", NodeType::Symptom, None, None)];
        let err = NewNode::root("G02").validate_against(&existing).unwrap_err();
        assert!(err.contains("already has a root"));

        let mut branchy_root = NewNode::root("G01");
        branchy_root.is_yes_path = Some(true);
        assert!(branchy_root.validate_against(&[]).is_err());
    }

    #[test]
    fn test_validate_rejects_disease_root() {
        let mut disease_root = NewNode::root("P01");
        disease_root.node_type = NodeType::Disease;
        let err = disease_root.validate_against(&[]).unwrap_err();
        assert!(err.contains("must be a symptom"));
    }

    #[test]
    fn test_validate_child() {
        let existing = vec![
            node(1, "G01", NodeType::Symptom, None, None),
            node(2, "P01", NodeType::Disease, Some(1), Some(true)),
        ];

        // Free "no" slot
        assert!(NewNode::child("G02", NodeType::Symptom, 1, false)
            .validate_against(&existing)
            .is_ok());

        // Taken "yes" slot
        let err = NewNode::child("G02", NodeType::Symptom, 1, true)
            .validate_against(&existing)
            .unwrap_err();
        assert!(err.contains("yes branch"));

        // Disease parent
        assert!(NewNode::child("G03", NodeType::Symptom, 2, true)
            .validate_against(&existing)
            .is_err());

        // Missing parent
        assert!(NewNode::child("G03", NodeType::Symptom, 99, true)
            .validate_against(&existing)
            .is_err());
    }

    #[test]
    fn test_validate_empty_code() {
        assert!(NewNode::root("  ").validate_against(&[]).is_err());
    }
}
