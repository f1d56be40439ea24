//! Diagnosis history database operations (append-only).

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::DiagnosisRecord;

impl Database {
    /// Append a diagnosis record.
    pub fn insert_diagnosis(&self, record: &DiagnosisRecord) -> DbResult<()> {
        let symptom_codes_json = serde_json::to_string(&record.symptom_codes)?;

        self.conn.execute(
            r#"
            INSERT INTO diagnoses (id, user_email, symptom_codes, disease_code, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.user_email,
                symptom_codes_json,
                record.disease_code,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a diagnosis record by ID.
    pub fn get_diagnosis(&self, id: &str) -> DbResult<Option<DiagnosisRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_email, symptom_codes, disease_code, created_at
                FROM diagnoses
                WHERE id = ?
                "#,
                [id],
                |row| {
                    Ok(DiagnosisRow {
                        id: row.get(0)?,
                        user_email: row.get(1)?,
                        symptom_codes: row.get(2)?,
                        disease_code: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a user's diagnoses, newest first.
    pub fn list_diagnoses_for_user(&self, user_email: &str) -> DbResult<Vec<DiagnosisRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_email, symptom_codes, disease_code, created_at
            FROM diagnoses
            WHERE user_email = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([user_email], |row| {
            Ok(DiagnosisRow {
                id: row.get(0)?,
                user_email: row.get(1)?,
                symptom_codes: row.get(2)?,
                disease_code: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// List every diagnosis, newest first (admin report).
    pub fn list_diagnoses(&self) -> DbResult<Vec<DiagnosisRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_email, symptom_codes, disease_code, created_at
            FROM diagnoses
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DiagnosisRow {
                id: row.get(0)?,
                user_email: row.get(1)?,
                symptom_codes: row.get(2)?,
                disease_code: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Intermediate row struct for database mapping.
struct DiagnosisRow {
    id: String,
    user_email: String,
    symptom_codes: String,
    disease_code: String,
    created_at: String,
}

impl TryFrom<DiagnosisRow> for DiagnosisRecord {
    type Error = DbError;

    fn try_from(row: DiagnosisRow) -> Result<Self, Self::Error> {
        Ok(DiagnosisRecord {
            id: row.id,
            user_email: row.user_email,
            symptom_codes: serde_json::from_str(&row.symptom_codes)?,
            disease_code: row.disease_code,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn record(email: &str, disease: &str, at: &str) -> DiagnosisRecord {
        let mut record = DiagnosisRecord::new(
            email.into(),
            vec!["G01".into(), "G02".into()],
            disease.into(),
        );
        record.created_at = at.into();
        record
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let record = record("a@example.com", "P01", "2024-05-01T10:00:00+00:00");
        db.insert_diagnosis(&record).unwrap();

        let retrieved = db.get_diagnosis(&record.id).unwrap().unwrap();
        assert_eq!(retrieved, record);
        assert_eq!(retrieved.symptom_codes, vec!["G01", "G02"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let db = setup_db();

        let record = record("a@example.com", "P01", "2024-05-01T10:00:00+00:00");
        db.insert_diagnosis(&record).unwrap();
        assert!(db.insert_diagnosis(&record).is_err());
    }

    #[test]
    fn test_list_for_user_newest_first() {
        let db = setup_db();

        db.insert_diagnosis(&record("a@example.com", "P01", "2024-05-01T10:00:00+00:00"))
            .unwrap();
        db.insert_diagnosis(&record("a@example.com", "P02", "2024-06-01T10:00:00+00:00"))
            .unwrap();
        db.insert_diagnosis(&record("b@example.com", "P03", "2024-07-01T10:00:00+00:00"))
            .unwrap();

        let mine = db.list_diagnoses_for_user("a@example.com").unwrap();
        let diseases: Vec<_> = mine.iter().map(|r| r.disease_code.as_str()).collect();
        assert_eq!(diseases, vec!["P02", "P01"]);

        assert_eq!(db.list_diagnoses().unwrap().len(), 3);
        assert_eq!(db.list_diagnoses().unwrap()[0].disease_code, "P03");
    }
}
