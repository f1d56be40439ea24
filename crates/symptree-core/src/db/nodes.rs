//! Decision node database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{DecisionNode, NewNode, NodeType};

const NODE_COLUMNS: &str = "id, node_id, node_type, parent_id, is_yes_path, created_at";

impl Database {
    /// Insert a new decision node after checking the tree invariants.
    ///
    /// Validation and the insert share one transaction.
    pub fn insert_node(&self, node: &NewNode) -> DbResult<DecisionNode> {
        let tx = self.conn.unchecked_transaction()?;

        let existing = self.list_nodes()?;
        node.validate_against(&existing).map_err(DbError::Constraint)?;

        let created_at = chrono::Utc::now().to_rfc3339();
        tx.execute(
            r#"
            INSERT INTO decision_nodes (node_id, node_type, parent_id, is_yes_path, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                node.node_id,
                node.node_type.as_str(),
                node.parent_id,
                node.is_yes_path,
                created_at,
            ],
        )?;

        let id = tx.last_insert_rowid();
        let inserted = self
            .get_node(id)?
            .ok_or_else(|| DbError::NotFound(format!("decision node {}", id)))?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Get a node by its store ID.
    pub fn get_node(&self, id: i64) -> DbResult<Option<DecisionNode>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM decision_nodes WHERE id = ?", NODE_COLUMNS),
                [id],
                NodeRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List every node in creation order.
    pub fn list_nodes(&self) -> DbResult<Vec<DecisionNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM decision_nodes ORDER BY created_at, id",
            NODE_COLUMNS
        ))?;

        let rows = stmt.query_map([], NodeRow::from_row)?;

        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(row?.try_into()?);
        }
        Ok(nodes)
    }

    /// Change the code a node points at (e.g., swap G03 for G04).
    pub fn update_node_code(&self, id: i64, node_id: &str) -> DbResult<bool> {
        if node_id.trim().is_empty() {
            return Err(DbError::Constraint("node_id must not be empty".into()));
        }
        let rows_affected = self.conn.execute(
            "UPDATE decision_nodes SET node_id = ? WHERE id = ?",
            params![node_id, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a node together with its whole subtree.
    ///
    /// Returns the number of records removed.
    pub fn delete_node(&self, id: i64) -> DbResult<usize> {
        // Cascaded deletes are not reported by changes(), so count first
        let subtree_size: i64 = self.conn.query_row(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM decision_nodes WHERE id = ?1
                UNION
                SELECT n.id FROM decision_nodes n JOIN subtree s ON n.parent_id = s.id
            )
            SELECT COUNT(*) FROM subtree
            "#,
            [id],
            |row| row.get(0),
        )?;

        self.conn.execute(
            r#"
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM decision_nodes WHERE id = ?1
                UNION
                SELECT n.id FROM decision_nodes n JOIN subtree s ON n.parent_id = s.id
            )
            DELETE FROM decision_nodes WHERE id IN (SELECT id FROM subtree)
            "#,
            [id],
        )?;
        Ok(subtree_size as usize)
    }
}

/// Intermediate row struct for database mapping.
struct NodeRow {
    id: i64,
    node_id: String,
    node_type: String,
    parent_id: Option<i64>,
    is_yes_path: Option<bool>,
    created_at: String,
}

impl NodeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(NodeRow {
            id: row.get(0)?,
            node_id: row.get(1)?,
            node_type: row.get(2)?,
            parent_id: row.get(3)?,
            is_yes_path: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl TryFrom<NodeRow> for DecisionNode {
    type Error = DbError;

    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        let node_type = NodeType::parse(&row.node_type)
            .ok_or_else(|| DbError::Constraint(format!("unknown node type: {}", row.node_type)))?;

        Ok(DecisionNode {
            id: row.id,
            node_id: row.node_id,
            node_type,
            parent_id: row.parent_id,
            is_yes_path: row.is_yes_path,
            created_at: row.created_at,
        })
    }
}
