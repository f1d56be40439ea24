//! Symptom and disease catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Disease, Symptom};

impl Database {
    // =========================================================================
    // Symptoms
    // =========================================================================

    /// Insert or update a symptom.
    pub fn upsert_symptom(&self, symptom: &Symptom) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO symptoms (code, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at
            "#,
            params![
                symptom.code,
                symptom.name,
                symptom.created_at,
                symptom.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a symptom by code.
    pub fn get_symptom(&self, code: &str) -> DbResult<Option<Symptom>> {
        self.conn
            .query_row(
                "SELECT code, name, created_at, updated_at FROM symptoms WHERE code = ?",
                [code],
                symptom_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all symptoms ordered by code.
    pub fn list_symptoms(&self) -> DbResult<Vec<Symptom>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, name, created_at, updated_at FROM symptoms ORDER BY code")?;
        let rows = stmt.query_map([], symptom_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a symptom.
    pub fn delete_symptom(&self, code: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM symptoms WHERE code = ?", [code])?;
        Ok(rows_affected > 0)
    }

    // =========================================================================
    // Diseases
    // =========================================================================

    /// Insert or update a disease.
    pub fn upsert_disease(&self, disease: &Disease) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO diseases (
                code, name, description, solution, image_path, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                solution = excluded.solution,
                image_path = excluded.image_path,
                updated_at = excluded.updated_at
            "#,
            params![
                disease.code,
                disease.name,
                disease.description,
                disease.solution,
                disease.image_path,
                disease.created_at,
                disease.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a disease by code.
    pub fn get_disease(&self, code: &str) -> DbResult<Option<Disease>> {
        self.conn
            .query_row(
                r#"
                SELECT code, name, description, solution, image_path, created_at, updated_at
                FROM diseases
                WHERE code = ?
                "#,
                [code],
                disease_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all diseases ordered by code.
    pub fn list_diseases(&self) -> DbResult<Vec<Disease>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT code, name, description, solution, image_path, created_at, updated_at
            FROM diseases
            ORDER BY code
            "#,
        )?;
        let rows = stmt.query_map([], disease_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a disease.
    pub fn delete_disease(&self, code: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM diseases WHERE code = ?", [code])?;
        Ok(rows_affected > 0)
    }
}

fn symptom_from_row(row: &Row<'_>) -> rusqlite::Result<Symptom> {
    Ok(Symptom {
        code: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn disease_from_row(row: &Row<'_>) -> rusqlite::Result<Disease> {
    Ok(Disease {
        code: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        solution: row.get(3)?,
        image_path: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_symptom_upsert_and_get() {
        let db = setup_db();

        let mut symptom = Symptom::new("G01".into(), "Fever".into());
        db.upsert_symptom(&symptom).unwrap();

        symptom.name = "High fever".into();
        db.upsert_symptom(&symptom).unwrap();

        let retrieved = db.get_symptom("G01").unwrap().unwrap();
        assert_eq!(retrieved.name, "High fever");
        assert_eq!(db.list_symptoms().unwrap().len(), 1);
        assert!(db.get_symptom("G99").unwrap().is_none());
    }

    #[test]
    fn test_symptoms_listed_by_code() {
        let db = setup_db();

        db.upsert_symptom(&Symptom::new("G03".into(), "Rash".into()))
            .unwrap();
        db.upsert_symptom(&Symptom::new("G01".into(), "Fever".into()))
            .unwrap();

        let codes: Vec<_> = db
            .list_symptoms()
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["G01", "G03"]);
    }

    #[test]
    fn test_disease_persistence() {
        let db = setup_db();

        let mut disease = Disease::new("P01".into(), "Dengue fever".into());
        disease.description = "Mosquito-borne viral infection".into();
        disease.solution = "Rest and fluids; see a doctor".into();
        disease.image_path = Some("diseases/p01.png".into());
        db.upsert_disease(&disease).unwrap();

        let retrieved = db.get_disease("P01").unwrap().unwrap();
        assert_eq!(retrieved, disease);
    }

    #[test]
    fn test_disease_update_keeps_created_at() {
        let db = setup_db();

        let mut disease = Disease::new("P01".into(), "Flu".into());
        disease.created_at = "2024-01-01T00:00:00+00:00".into();
        db.upsert_disease(&disease).unwrap();

        disease.name = "Influenza".into();
        disease.created_at = "2030-01-01T00:00:00+00:00".into();
        disease.touch();
        db.upsert_disease(&disease).unwrap();

        let retrieved = db.get_disease("P01").unwrap().unwrap();
        assert_eq!(retrieved.name, "Influenza");
        assert_eq!(retrieved.created_at, "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_delete() {
        let db = setup_db();

        db.upsert_symptom(&Symptom::new("G01".into(), "Fever".into()))
            .unwrap();
        db.upsert_disease(&Disease::new("P01".into(), "Flu".into()))
            .unwrap();

        assert!(db.delete_symptom("G01").unwrap());
        assert!(!db.delete_symptom("G01").unwrap());
        assert!(db.delete_disease("P01").unwrap());
        assert!(db.list_diseases().unwrap().is_empty());
    }
}
