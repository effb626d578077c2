//! Analysis history persistence
//!
//! Records are created once after a successful API-path classification,
//! listed newest-first, and deleted individually. There is no update
//! operation; an id never changes after insert.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A persisted analysis, as returned by the history listing
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub patient_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_number: String,
    pub medical_history: String,
    pub tumor_type: String,
    /// Confidence as a percentage in [0, 100]
    pub confidence: f64,
    pub image_path: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields of a record not assigned by the store (id and timestamp are)
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub patient_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub contact_number: String,
    pub medical_history: String,
    pub tumor_type: String,
    pub confidence: f64,
    pub image_path: String,
}

/// Durable store of past analyses backed by the shared connection pool
#[derive(Debug, Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a completed analysis and return the assigned id.
    ///
    /// The timestamp is taken from the clock at insert time, so it is
    /// monotonically non-decreasing with insertion order.
    pub async fn insert(&self, analysis: &NewAnalysis) -> Result<i64> {
        let timestamp = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO analysis_history
            (patient_name, date_of_birth, gender, contact_number, medical_history,
             tumor_type, confidence, image_path, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&analysis.patient_name)
        .bind(&analysis.date_of_birth)
        .bind(&analysis.gender)
        .bind(&analysis.contact_number)
        .bind(&analysis.medical_history)
        .bind(&analysis.tumor_type)
        .bind(analysis.confidence)
        .bind(&analysis.image_path)
        .bind(timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List all records, most recent timestamp first (id breaks ties)
    pub async fn list_all(&self) -> Result<Vec<AnalysisRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, patient_name, date_of_birth, gender, contact_number,
                   medical_history, tumor_type, confidence, image_path, timestamp
            FROM analysis_history
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Delete a record by id; returns whether a row was removed.
    ///
    /// Deleting a nonexistent id is not an error — it reports false, and
    /// callers treat that as an idempotent success.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analysis_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AnalysisRecord> {
    let timestamp_str: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| crate::Error::Internal(format!("malformed timestamp in history: {}", e)))?
        .with_timezone(&Utc);

    Ok(AnalysisRecord {
        id: row.get("id"),
        patient_name: row.get("patient_name"),
        date_of_birth: row.get("date_of_birth"),
        gender: row.get("gender"),
        contact_number: row.get("contact_number"),
        medical_history: row.get("medical_history"),
        tumor_type: row.get("tumor_type"),
        confidence: row.get("confidence"),
        image_path: row.get("image_path"),
        timestamp,
    })
}
