//! SQLite schema definition.

/// Complete database schema for symptree.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Symptom Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS symptoms (
    code TEXT PRIMARY KEY,                       -- e.g. G01
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Disease Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS diseases (
    code TEXT PRIMARY KEY,                       -- e.g. P01
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    solution TEXT NOT NULL DEFAULT '',
    image_path TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Decision Tree (flat parent-pointer records)
-- ============================================================================

CREATE TABLE IF NOT EXISTS decision_nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id TEXT NOT NULL,                       -- G.. (symptom) or P.. (disease)
    node_type TEXT NOT NULL CHECK (node_type IN ('symptom', 'disease')),
    parent_id INTEGER REFERENCES decision_nodes(id) ON DELETE CASCADE,
    is_yes_path INTEGER CHECK (is_yes_path IN (0, 1)),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    -- Root has neither parent nor branch; every other node has both
    CHECK ((parent_id IS NULL) = (is_yes_path IS NULL))
);

-- A parent has at most one child per branch
CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_branch
    ON decision_nodes(parent_id, is_yes_path)
    WHERE parent_id IS NOT NULL;

-- At most one root
CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_single_root
    ON decision_nodes((parent_id IS NULL))
    WHERE parent_id IS NULL;

CREATE INDEX IF NOT EXISTS idx_nodes_created ON decision_nodes(created_at, id);

-- Disease nodes are terminal
CREATE TRIGGER IF NOT EXISTS decision_nodes_check_parent BEFORE INSERT ON decision_nodes
WHEN new.parent_id IS NOT NULL
BEGIN
    SELECT CASE
        WHEN (SELECT node_type FROM decision_nodes WHERE id = new.parent_id) = 'disease' THEN
            RAISE(ABORT, 'Disease nodes cannot have children')
    END;
END;

-- ============================================================================
-- Diagnosis History (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS diagnoses (
    id TEXT PRIMARY KEY,
    user_email TEXT NOT NULL,
    symptom_codes TEXT NOT NULL DEFAULT '[]',    -- JSON array of symptom codes
    disease_code TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_diagnoses_user ON diagnoses(user_email, created_at);

CREATE TRIGGER IF NOT EXISTS diagnoses_no_update BEFORE UPDATE ON diagnoses
BEGIN
    SELECT RAISE(ABORT, 'Diagnosis records are immutable');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_reapplies() {
        let conn = setup();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_branch_uniqueness() {
        let conn = setup();
        conn.execute(
            "INSERT INTO decision_nodes (id, node_id, node_type) VALUES (1, 'G01', 'symptom')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type, parent_id, is_yes_path) VALUES ('G02', 'symptom', 1, 1)",
            [],
        )
        .unwrap();

        // Same branch again should fail
        let result = conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type, parent_id, is_yes_path) VALUES ('G03', 'symptom', 1, 1)",
            [],
        );
        assert!(result.is_err());

        // Other branch is free
        let result = conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type, parent_id, is_yes_path) VALUES ('G03', 'symptom', 1, 0)",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_single_root() {
        let conn = setup();
        conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type) VALUES ('G01', 'symptom')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type) VALUES ('G02', 'symptom')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_branch_flag_pairs_with_parent() {
        let conn = setup();
        conn.execute(
            "INSERT INTO decision_nodes (id, node_id, node_type) VALUES (1, 'G01', 'symptom')",
            [],
        )
        .unwrap();

        // Child without branch flag
        let result = conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type, parent_id) VALUES ('G02', 'symptom', 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_disease_is_terminal() {
        let conn = setup();
        conn.execute(
            "INSERT INTO decision_nodes (id, node_id, node_type) VALUES (1, 'G01', 'symptom')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO decision_nodes (id, node_id, node_type, parent_id, is_yes_path) VALUES (2, 'P01', 'disease', 1, 1)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO decision_nodes (node_id, node_type, parent_id, is_yes_path) VALUES ('G02', 'symptom', 2, 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_diagnoses_immutable() {
        let conn = setup();
        conn.execute(
            "INSERT INTO diagnoses (id, user_email, symptom_codes, disease_code) VALUES ('d1', 'a@b.c', '[]', 'P01')",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE diagnoses SET disease_code = 'P02' WHERE id = 'd1'", []);
        assert!(result.is_err());
    }
}
