//! libSQL backend: async `PredictionStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{
    CountStat, CountryStat, PredictionRecord, PredictionStats, PredictionStore, RecentPrediction,
};

/// Rows returned by the top-N aggregates.
const TOP_N: i64 = 10;
/// Countries returned in the per-country breakdown.
const COUNTRY_LIMIT: i64 = 20;

/// libSQL prediction store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db)?;
        store.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let store = Self::from_database(db)?;
        store.run_migrations().await?;
        Ok(store)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn count_by(&self, column: &str) -> Result<Vec<CountStat>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {column}, COUNT(*) AS n FROM predictions GROUP BY {column} ORDER BY n DESC, {column} ASC LIMIT ?1"
                ),
                params![TOP_N],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_by {column}: {e}")))?;

        let mut stats = Vec::new();
        while let Some(row) = next_row(&mut rows, "count_by").await? {
            stats.push(CountStat {
                value: get_text(&row, 0, "count_by")?,
                count: get_count(&row, 1, "count_by")?,
            });
        }
        Ok(stats)
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format: fixed-width so text ordering matches time ordering.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

async fn next_row(rows: &mut libsql::Rows, op: &str) -> Result<Option<Row>, DatabaseError> {
    rows.next()
        .await
        .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))
}

fn column_error(op: &str, idx: i32, e: libsql::Error) -> DatabaseError {
    DatabaseError::Serialization(format!("{op} column {idx}: {e}"))
}

fn get_text(row: &Row, idx: i32, op: &str) -> Result<String, DatabaseError> {
    row.get::<String>(idx).map_err(|e| column_error(op, idx, e))
}

fn get_count(row: &Row, idx: i32, op: &str) -> Result<u64, DatabaseError> {
    row.get::<i64>(idx)
        .map(|n| n.max(0) as u64)
        .map_err(|e| column_error(op, idx, e))
}

fn get_real(row: &Row, idx: i32, op: &str) -> Result<f64, DatabaseError> {
    row.get::<f64>(idx).map_err(|e| column_error(op, idx, e))
}

fn row_to_recent(row: &Row) -> Result<RecentPrediction, DatabaseError> {
    let op = "recent_predictions";
    let id = get_text(row, 0, op)?;
    let created = get_text(row, 6, op)?;
    Ok(RecentPrediction {
        id: Uuid::parse_str(&id)
            .map_err(|e| DatabaseError::Serialization(format!("prediction id {id}: {e}")))?,
        name: get_text(row, 1, op)?,
        aspiration: get_text(row, 2, op)?,
        university: get_text(row, 3, op)?,
        predicted_lifetime_nw: get_real(row, 4, op)?,
        rank_band: get_text(row, 5, op)?,
        timestamp: parse_datetime(&created),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl PredictionStore for LibSqlStore {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn save_prediction(&self, record: &PredictionRecord) -> Result<Uuid, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO predictions (id, created_at, name, age, university, aspiration, country, predicted_lifetime_nw, predicted_10_year_nw, rank_band, college_tier, college_rank, success_probability, oracle_confidence, reasoning, session_id, ip_address, user_agent) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    record.id.to_string(),
                    format_datetime(&record.created_at),
                    record.name.clone(),
                    record.age as i64,
                    record.university.clone(),
                    record.aspiration.clone(),
                    record.country.clone(),
                    record.predicted_lifetime_nw,
                    record.predicted_10_year_nw,
                    record.rank_band.clone(),
                    opt_text_owned(record.college_tier.clone()),
                    record.college_rank as i64,
                    record.success_probability,
                    record.oracle_confidence.clone(),
                    record.reasoning.clone(),
                    record.session_id.clone(),
                    record.ip_address.clone(),
                    record.user_agent.clone(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_prediction: {e}")))?;

        debug!(prediction_id = %record.id, session_id = %record.session_id, "Prediction saved");
        Ok(record.id)
    }

    async fn prediction_stats(&self) -> Result<PredictionStats, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM predictions", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("prediction_stats: {e}")))?;
        let total_predictions = match next_row(&mut rows, "prediction_stats").await? {
            Some(row) => get_count(&row, 0, "prediction_stats")?,
            None => 0,
        };

        let top_aspirations = self.count_by("aspiration").await?;
        let top_universities = self.count_by("university").await?;

        let mut rows = self
            .conn()
            .query(
                "SELECT country, AVG(predicted_lifetime_nw), COUNT(*) AS n FROM predictions GROUP BY country ORDER BY n DESC, country ASC LIMIT ?1",
                params![COUNTRY_LIMIT],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("country_stats: {e}")))?;
        let mut country_stats = Vec::new();
        while let Some(row) = next_row(&mut rows, "country_stats").await? {
            country_stats.push(CountryStat {
                country: get_text(&row, 0, "country_stats")?,
                avg_lifetime: get_real(&row, 1, "country_stats")?,
                count: get_count(&row, 2, "country_stats")?,
            });
        }

        Ok(PredictionStats {
            total_predictions,
            top_aspirations,
            top_universities,
            country_stats,
            last_updated: Utc::now(),
        })
    }

    async fn recent_predictions(&self, limit: usize) -> Result<Vec<RecentPrediction>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, name, aspiration, university, predicted_lifetime_nw, rank_band, created_at FROM predictions ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("recent_predictions: {e}")))?;

        let mut predictions = Vec::new();
        while let Some(row) = next_row(&mut rows, "recent_predictions").await? {
            predictions.push(row_to_recent(&row)?);
        }
        Ok(predictions)
    }
}
