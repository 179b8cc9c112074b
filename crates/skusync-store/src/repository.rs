//! SQLite implementation of the persistence ports
//!
//! One [`SqliteStore`] implements both `IScanStore` (sessions + results)
//! and `ICatalogRepository` (records + links): the two live in the same
//! database file and share the pool.
//!
//! ## Type Mapping
//!
//! | Domain Type                  | SQL Type | Strategy                        |
//! |------------------------------|----------|---------------------------------|
//! | SessionId/ResultId/RecordId  | TEXT     | UUID string via Display/FromStr |
//! | SourceRef                    | TEXT x2  | type name + instance id ('' for None) |
//! | ScanStatus                   | TEXT     | plain name; Failed as "failed:<msg>" |
//! | ScanKind/MatchStatus/...     | TEXT     | stable string names             |
//! | DateTime<Utc>                | TEXT     | RFC 3339                        |
//! | snapshots / diff / summary   | TEXT     | serde_json                      |
//! | counters                     | INTEGER  | i64, incremented in place       |

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use skusync_core::domain::conflict::FieldDiff;
use skusync_core::domain::newtypes::{RecordId, ResultId, SessionId, Sku, SourceId};
use skusync_core::domain::record::{CatalogRecord, RecordStatus, SourceLink, SourceRef, SourceType};
use skusync_core::domain::scan_result::{MatchStatus, ResolutionStatus, ScanResult};
use skusync_core::domain::session::{ScanKind, ScanSession, ScanStatus};
use skusync_core::ports::catalog::ICatalogRepository;
use skusync_core::ports::scan_store::{IScanStore, ResultFilter, ResultPage};

use crate::StoreError;

/// Columns accepted by [`ICatalogRepository::update_record_fields`]
const UPDATABLE_RECORD_FIELDS: &[&str] = &[
    "name",
    "code",
    "description",
    "manufacturer",
    "price_net",
    "stock",
    "unit",
    "active",
];

/// SQLite-backed implementation of the persistence ports
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Loads the links for a set of record ids, grouped by record
    async fn links_for_records(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, Vec<SourceLink>>, StoreError> {
        let mut grouped: HashMap<String, Vec<SourceLink>> = HashMap::new();
        if ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb = sqlx::QueryBuilder::new(
            "SELECT record_id, source_type, source_id, external_id, synced, last_synced_at, \
             has_conflicts, conflicts, conflicts_detected_at FROM source_links WHERE record_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("load links: {e}")))?;

        for row in rows {
            let record_id: String = row.get("record_id");
            grouped
                .entry(record_id)
                .or_default()
                .push(link_from_row(&row)?);
        }
        Ok(grouped)
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Serialize a ScanStatus to a string for storage
///
/// Simple states are stored as plain strings; the Failed variant is stored
/// as "failed:<message>".
fn scan_status_to_string(status: &ScanStatus) -> String {
    match status {
        ScanStatus::Pending => "pending".to_string(),
        ScanStatus::Running => "running".to_string(),
        ScanStatus::Completed => "completed".to_string(),
        ScanStatus::Cancelled => "cancelled".to_string(),
        ScanStatus::Failed(msg) => format!("failed:{}", msg),
    }
}

/// Deserialize a ScanStatus from its stored string representation
fn scan_status_from_string(s: &str) -> Result<ScanStatus, StoreError> {
    match s {
        "pending" => Ok(ScanStatus::Pending),
        "running" => Ok(ScanStatus::Running),
        "completed" => Ok(ScanStatus::Completed),
        "cancelled" => Ok(ScanStatus::Cancelled),
        s if s.starts_with("failed:") => Ok(ScanStatus::Failed(s[7..].to_string())),
        other => Err(StoreError::SerializationError(format!(
            "Unknown scan status: {}",
            other
        ))),
    }
}

/// Splits a source reference into its two storage columns
///
/// The instance selector becomes the empty string for single-instance
/// sources so it can participate in the link primary key.
fn source_to_columns(source: &SourceRef) -> (&'static str, String) {
    let id = source
        .source_id
        .as_ref()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();
    (source.source_type.as_str(), id)
}

/// Rebuilds a source reference from its two storage columns
fn source_from_columns(type_str: &str, id_str: &str) -> Result<SourceRef, StoreError> {
    let source_type = SourceType::from_str(type_str)
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let source_id = if id_str.is_empty() {
        None
    } else {
        Some(SourceId::new(id_str))
    };
    Ok(SourceRef::new(source_type, source_id))
}

/// Parse a DateTime<Utc> from an RFC 3339 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Parse an optional DateTime<Utc> from an optional string
fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, StoreError> {
    match s {
        Some(ref val) if !val.is_empty() => parse_datetime(val).map(Some),
        _ => Ok(None),
    }
}

/// Parse an optional JSON column
fn parse_optional_json(s: Option<String>) -> Result<Option<serde_json::Value>, StoreError> {
    match s {
        Some(ref val) if !val.is_empty() => serde_json::from_str(val)
            .map(Some)
            .map_err(|e| StoreError::SerializationError(format!("Invalid JSON column: {e}"))),
        _ => Ok(None),
    }
}

fn to_json_column(value: Option<&serde_json::Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

// ============================================================================
// Row mapping functions
// ============================================================================

fn session_from_row(row: &SqliteRow) -> Result<ScanSession, StoreError> {
    let id_str: String = row.get("id");
    let source_type: String = row.get("source_type");
    let source_id: String = row.get("source_id");
    let kind_str: String = row.get("kind");
    let status_str: String = row.get("status");
    let created_at: String = row.get("created_at");
    let started_at: Option<String> = row.get("started_at");
    let completed_at: Option<String> = row.get("completed_at");
    let error_message: Option<String> = row.get("error_message");
    let result_summary: Option<String> = row.get("result_summary");
    let expected_total: Option<i64> = row.get("expected_total");

    let id = SessionId::from_str(&id_str)
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;
    let kind =
        ScanKind::from_str(&kind_str).map_err(|e| StoreError::SerializationError(e.to_string()))?;

    Ok(ScanSession::reconstitute(
        id,
        source_from_columns(&source_type, &source_id)?,
        kind,
        scan_status_from_string(&status_str)?,
        (
            row.get::<i64, _>("total_scanned") as u64,
            row.get::<i64, _>("matched_count") as u64,
            row.get::<i64, _>("unmatched_count") as u64,
            row.get::<i64, _>("errors_count") as u64,
        ),
        expected_total.map(|v| v as u64),
        parse_datetime(&created_at)?,
        parse_optional_datetime(started_at)?,
        parse_optional_datetime(completed_at)?,
        error_message,
        parse_optional_json(result_summary)?,
    ))
}

fn result_from_row(row: &SqliteRow) -> Result<ScanResult, StoreError> {
    let id_str: String = row.get("id");
    let session_id_str: String = row.get("session_id");
    let internal_record_id: Option<String> = row.get("internal_record_id");
    let match_status_str: String = row.get("match_status");
    let resolution_status_str: String = row.get("resolution_status");
    let diff_str: Option<String> = row.get("diff");

    let diff: Option<Vec<FieldDiff>> = match diff_str {
        Some(ref s) if !s.is_empty() => Some(
            serde_json::from_str(s)
                .map_err(|e| StoreError::SerializationError(format!("Invalid diff JSON: {e}")))?,
        ),
        _ => None,
    };

    let internal_record_id = internal_record_id
        .map(|s| RecordId::from_str(&s))
        .transpose()
        .map_err(|e| StoreError::SerializationError(e.to_string()))?;

    Ok(ScanResult::reconstitute(
        ResultId::from_str(&id_str).map_err(|e| StoreError::SerializationError(e.to_string()))?,
        SessionId::from_str(&session_id_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        row.get("sku"),
        row.get("name"),
        row.get("external_id"),
        internal_record_id,
        MatchStatus::from_str(&match_status_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        ResolutionStatus::from_str(&resolution_status_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        parse_optional_json(row.get("internal_snapshot"))?,
        parse_optional_json(row.get("external_snapshot"))?,
        diff,
    ))
}

fn record_from_row(row: &SqliteRow) -> Result<CatalogRecord, StoreError> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");

    Ok(CatalogRecord {
        id: RecordId::from_str(&id_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        sku_raw: row.get("sku"),
        name: row.get("name"),
        code: row.get("code"),
        description: row.get("description"),
        manufacturer: row.get("manufacturer"),
        price_net: row.get("price_net"),
        stock: row.get("stock"),
        unit: row.get("unit"),
        active: row.get::<i64, _>("active") != 0,
        status: RecordStatus::from_str(&status_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        links: Vec::new(),
    })
}

fn link_from_row(row: &SqliteRow) -> Result<SourceLink, StoreError> {
    let record_id_str: String = row.get("record_id");
    let source_type: String = row.get("source_type");
    let source_id: String = row.get("source_id");
    let conflicts_str: Option<String> = row.get("conflicts");

    let conflicts: Option<Vec<FieldDiff>> = match conflicts_str {
        Some(ref s) if !s.is_empty() => Some(serde_json::from_str(s).map_err(|e| {
            StoreError::SerializationError(format!("Invalid conflicts JSON: {e}"))
        })?),
        _ => None,
    };

    Ok(SourceLink {
        record_id: RecordId::from_str(&record_id_str)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?,
        source: source_from_columns(&source_type, &source_id)?,
        external_id: row.get("external_id"),
        synced: row.get::<i64, _>("synced") != 0,
        last_synced_at: parse_optional_datetime(row.get("last_synced_at"))?,
        has_conflicts: row.get::<i64, _>("has_conflicts") != 0,
        conflicts,
        conflicts_detected_at: parse_optional_datetime(row.get("conflicts_detected_at"))?,
    })
}

// ============================================================================
// IScanStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IScanStore for SqliteStore {
    async fn create_session(&self, session: &ScanSession) -> anyhow::Result<()> {
        let (source_type, source_id) = source_to_columns(session.source());

        sqlx::query(
            "INSERT INTO scan_sessions \
             (id, source_type, source_id, kind, status, total_scanned, matched_count, \
              unmatched_count, errors_count, expected_total, created_at, started_at, \
              completed_at, error_message, result_summary) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id().to_string())
        .bind(source_type)
        .bind(source_id)
        .bind(session.kind().to_string())
        .bind(scan_status_to_string(session.status()))
        .bind(session.total_scanned() as i64)
        .bind(session.matched_count() as i64)
        .bind(session.unmatched_count() as i64)
        .bind(session.errors_count() as i64)
        .bind(session.expected_total().map(|v| v as i64))
        .bind(session.created_at().to_rfc3339())
        .bind(session.started_at().map(|dt| dt.to_rfc3339()))
        .bind(session.completed_at().map(|dt| dt.to_rfc3339()))
        .bind(session.error_message().map(str::to_string))
        .bind(to_json_column(session.result_summary()))
        .execute(&self.pool)
        .await?;

        debug!(session_id = %session.id(), "Session created");
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> anyhow::Result<Option<ScanSession>> {
        let row = sqlx::query("SELECT * FROM scan_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(session_from_row).transpose().map_err(Into::into)
    }

    async fn update_session(&self, session: &ScanSession) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE scan_sessions SET status = ?, expected_total = ?, started_at = ?, \
             completed_at = ?, error_message = ?, result_summary = ? WHERE id = ?",
        )
        .bind(scan_status_to_string(session.status()))
        .bind(session.expected_total().map(|v| v as i64))
        .bind(session.started_at().map(|dt| dt.to_rfc3339()))
        .bind(session.completed_at().map(|dt| dt.to_rfc3339()))
        .bind(session.error_message().map(str::to_string))
        .bind(to_json_column(session.result_summary()))
        .bind(session.id().to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_counters(
        &self,
        id: &SessionId,
        scanned: u64,
        matched: u64,
        unmatched: u64,
        errors: u64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE scan_sessions SET \
             total_scanned = total_scanned + ?, \
             matched_count = matched_count + ?, \
             unmatched_count = unmatched_count + ?, \
             errors_count = errors_count + ? \
             WHERE id = ?",
        )
        .bind(scanned as i64)
        .bind(matched as i64)
        .bind(unmatched as i64)
        .bind(errors as i64)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn request_cancel(&self, id: &SessionId) -> anyhow::Result<()> {
        sqlx::query("UPDATE scan_sessions SET cancel_requested = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn is_cancel_requested(&self, id: &SessionId) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT cancel_requested FROM scan_sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|r| r.get::<i64, _>("cancel_requested") != 0)
            .unwrap_or(false))
    }

    async fn insert_results(&self, results: &[ScanResult]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for result in results {
            sqlx::query(
                "INSERT INTO scan_results \
                 (id, session_id, sku, name, external_id, internal_record_id, match_status, \
                  resolution_status, internal_snapshot, external_snapshot, diff) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(result.id().to_string())
            .bind(result.session_id().to_string())
            .bind(result.sku())
            .bind(result.name())
            .bind(result.external_id())
            .bind(result.internal_record_id().map(|id| id.to_string()))
            .bind(result.match_status().as_str())
            .bind(result.resolution_status().as_str())
            .bind(to_json_column(result.internal_snapshot()))
            .bind(to_json_column(result.external_snapshot()))
            .bind(
                result
                    .diff()
                    .map(serde_json::to_string)
                    .transpose()?,
            )
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_result(&self, id: &ResultId) -> anyhow::Result<Option<ScanResult>> {
        let row = sqlx::query("SELECT * FROM scan_results WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(result_from_row).transpose().map_err(Into::into)
    }

    async fn query_results(&self, filter: &ResultFilter) -> anyhow::Result<ResultPage> {
        let push_conditions = |qb: &mut sqlx::QueryBuilder<sqlx::Sqlite>| {
            qb.push(" WHERE session_id = ")
                .push_bind(filter.session_id.to_string());
            if let Some(status) = filter.match_status {
                qb.push(" AND match_status = ").push_bind(status.as_str());
            }
            if let Some(status) = filter.resolution_status {
                qb.push(" AND resolution_status = ")
                    .push_bind(status.as_str());
            }
            if let Some(term) = &filter.search {
                let pattern = format!("%{}%", term.to_lowercase());
                qb.push(" AND (LOWER(sku) LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR LOWER(name) LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        };

        let mut count_qb = sqlx::QueryBuilder::new("SELECT COUNT(*) AS n FROM scan_results");
        push_conditions(&mut count_qb);
        let total: i64 = count_qb.build().fetch_one(&self.pool).await?.get("n");

        let mut qb = sqlx::QueryBuilder::new("SELECT * FROM scan_results");
        push_conditions(&mut qb);
        qb.push(" ORDER BY rowid LIMIT ")
            .push_bind(filter.per_page as i64)
            .push(" OFFSET ")
            .push_bind(((filter.page.max(1) - 1) * filter.per_page) as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let results = rows
            .iter()
            .map(result_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResultPage {
            results,
            total: total as u64,
        })
    }

    async fn update_resolution(
        &self,
        id: &ResultId,
        status: ResolutionStatus,
        internal_record_id: Option<RecordId>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE scan_results SET resolution_status = ?, \
             internal_record_id = COALESCE(?, internal_record_id) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(internal_record_id.map(|r| r.to_string()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ============================================================================
// ICatalogRepository implementation
// ============================================================================

#[async_trait::async_trait]
impl ICatalogRepository for SqliteStore {
    async fn list_records(&self) -> anyhow::Result<Vec<CatalogRecord>> {
        let rows = sqlx::query("SELECT * FROM catalog_records ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
        let mut links = self.links_for_records(&ids).await?;
        for record in &mut records {
            if let Some(found) = links.remove(&record.id.to_string()) {
                record.links = found;
            }
        }
        Ok(records)
    }

    async fn list_linked_records(&self, source: &SourceRef) -> anyhow::Result<Vec<CatalogRecord>> {
        let (source_type, source_id) = source_to_columns(source);
        let rows = sqlx::query(
            "SELECT r.* FROM catalog_records r \
             JOIN source_links l ON l.record_id = r.id \
             WHERE l.source_type = ? AND l.source_id = ? \
             ORDER BY r.id",
        )
        .bind(source_type)
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
        let mut links = self.links_for_records(&ids).await?;
        for record in &mut records {
            if let Some(found) = links.remove(&record.id.to_string()) {
                record.links = found;
            }
        }
        Ok(records)
    }

    async fn get_record(&self, id: &RecordId) -> anyhow::Result<Option<CatalogRecord>> {
        let row = sqlx::query("SELECT * FROM catalog_records WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let mut record = record_from_row(&row)?;
        let mut links = self.links_for_records(&[record.id.to_string()]).await?;
        if let Some(found) = links.remove(&record.id.to_string()) {
            record.links = found;
        }
        Ok(Some(record))
    }

    async fn get_record_by_sku(&self, sku: &Sku) -> anyhow::Result<Option<CatalogRecord>> {
        let row = sqlx::query("SELECT * FROM catalog_records WHERE sku = ? ORDER BY id LIMIT 1")
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else { return Ok(None) };
        let mut record = record_from_row(&row)?;
        let mut links = self.links_for_records(&[record.id.to_string()]).await?;
        if let Some(found) = links.remove(&record.id.to_string()) {
            record.links = found;
        }
        Ok(Some(record))
    }

    async fn insert_record(&self, record: &CatalogRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO catalog_records \
             (id, sku, name, code, description, manufacturer, price_net, stock, unit, active, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.sku_raw)
        .bind(&record.name)
        .bind(&record.code)
        .bind(&record.description)
        .bind(&record.manufacturer)
        .bind(record.price_net)
        .bind(record.stock)
        .bind(&record.unit)
        .bind(record.active as i64)
        .bind(record.status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_record_fields(
        &self,
        id: &RecordId,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> anyhow::Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        for field in fields.keys() {
            if !UPDATABLE_RECORD_FIELDS.contains(&field.as_str()) {
                anyhow::bail!("field '{field}' is not updatable");
            }
        }

        let mut qb = sqlx::QueryBuilder::new("UPDATE catalog_records SET ");
        let mut separated = qb.separated(", ");
        for (field, value) in fields {
            separated.push(format!("{field} = "));
            match value {
                serde_json::Value::String(s) => {
                    separated.push_bind_unseparated(s.clone());
                }
                serde_json::Value::Number(n) => {
                    separated.push_bind_unseparated(n.as_f64());
                }
                serde_json::Value::Bool(b) => {
                    separated.push_bind_unseparated(*b as i64);
                }
                serde_json::Value::Null => {
                    separated.push_bind_unseparated(None::<String>);
                }
                other => anyhow::bail!("field '{field}' has unsupported value {other}"),
            }
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_link(&self, link: &SourceLink) -> anyhow::Result<()> {
        let (source_type, source_id) = source_to_columns(&link.source);
        sqlx::query(
            "INSERT INTO source_links \
             (record_id, source_type, source_id, external_id, synced, last_synced_at, \
              has_conflicts, conflicts, conflicts_detected_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(record_id, source_type, source_id) DO UPDATE SET \
             external_id = excluded.external_id, \
             synced = excluded.synced, \
             last_synced_at = excluded.last_synced_at, \
             has_conflicts = excluded.has_conflicts, \
             conflicts = excluded.conflicts, \
             conflicts_detected_at = excluded.conflicts_detected_at",
        )
        .bind(link.record_id.to_string())
        .bind(source_type)
        .bind(source_id)
        .bind(&link.external_id)
        .bind(link.synced as i64)
        .bind(link.last_synced_at.map(|dt| dt.to_rfc3339()))
        .bind(link.has_conflicts as i64)
        .bind(
            link.conflicts
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        )
        .bind(link.conflicts_detected_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_link(&self, record_id: &RecordId, source: &SourceRef) -> anyhow::Result<()> {
        let (source_type, source_id) = source_to_columns(source);
        sqlx::query(
            "DELETE FROM source_links WHERE record_id = ? AND source_type = ? AND source_id = ?",
        )
        .bind(record_id.to_string())
        .bind(source_type)
        .bind(source_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
