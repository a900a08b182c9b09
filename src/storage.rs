use crate::emissions::CarbonFootprintResult;
use crate::model::CalculationData;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub user_id: String,
    pub calculation_id: Uuid,
    pub carbon_footprint: f64,
    pub breakdown: CarbonFootprintResult,
    pub calculation_data: CalculationData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CalculationRecord {
    /// Creates a record with a fresh calculation id stamped with the current time.
    pub fn new(
        user_id: String,
        breakdown: CarbonFootprintResult,
        calculation_data: CalculationData,
        ai_analysis: Option<String>,
    ) -> Self {
        Self {
            user_id,
            calculation_id: Uuid::new_v4(),
            carbon_footprint: breakdown.total,
            breakdown,
            calculation_data,
            ai_analysis,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to create storage directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),
    #[error("Storage task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait CalculationStore: Send + Sync {
    async fn put(&self, record: &CalculationRecord) -> Result<(), StorageError>;

    /// Most recent calculations for a user, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StorageError>;
}

/// Calculation history kept in a single SQLite table.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(db_path: &str) -> Result<Self, StorageError> {
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(db_path)?
        };

        Self::init_database(&conn)?;
        log::info!("Calculation store ready at {db_path}");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_database(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ecoviz (
                calculation_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                carbon_footprint REAL NOT NULL,
                breakdown TEXT NOT NULL,
                calculation_data TEXT NOT NULL,
                ai_analysis TEXT,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_ecoviz_user ON ecoviz (user_id, timestamp);",
        )?;
        Ok(())
    }

    fn insert(conn: &Connection, record: &CalculationRecord) -> Result<(), StorageError> {
        conn.execute(
            "INSERT INTO ecoviz
                (calculation_id, user_id, carbon_footprint, breakdown, calculation_data, ai_analysis, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.calculation_id.to_string(),
                record.user_id,
                record.carbon_footprint,
                serde_json::to_string(&record.breakdown)?,
                serde_json::to_string(&record.calculation_data)?,
                record.ai_analysis,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn select_for_user(
        conn: &Connection,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StorageError> {
        let mut stmt = conn.prepare(
            "SELECT calculation_id, user_id, carbon_footprint, breakdown, calculation_data, ai_analysis, timestamp
             FROM ecoviz WHERE user_id = ?1
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, user_id, carbon_footprint, breakdown, data, ai_analysis, timestamp) = row?;
            records.push(CalculationRecord {
                user_id,
                calculation_id: Uuid::parse_str(&id)
                    .map_err(|e| StorageError::Corrupt(format!("calculation id {id}: {e}")))?,
                carbon_footprint,
                breakdown: serde_json::from_str(&breakdown)?,
                calculation_data: serde_json::from_str(&data)?,
                ai_analysis,
                timestamp: DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| StorageError::Corrupt(format!("timestamp {timestamp}: {e}")))?
                    .with_timezone(&Utc),
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl CalculationStore for SqliteStore {
    async fn put(&self, record: &CalculationRecord) -> Result<(), StorageError> {
        let conn = self.conn.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Task("connection lock poisoned".to_string()))?;
            Self::insert(&conn, &record)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CalculationRecord>, StorageError> {
        let conn = self.conn.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Task("connection lock poisoned".to_string()))?;
            Self::select_for_user(&conn, &user_id, limit)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}
