//! SQLite-backed scheme store.

use super::{contains_ci, SchemeQuery, SchemeRepository};
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use sanchar_core::{AppError, AppResult, NewScheme, SchemeRecord};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "id, name, category, eligibility, benefits, how_to_apply, \
                              keywords, localized_summary, created_at, updated_at";

/// Scheme store in a single SQLite file.
///
/// Ids come from `AUTOINCREMENT`, so ordering by id is insertion order.
///
/// Reads through [`SchemeRepository`] run on tokio's blocking pool. They
/// share one connection, so concurrent queries take turns on it without
/// holding up async worker threads.
pub struct SqliteSchemeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSchemeRepository {
    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open scheme database: {}", e)))?;

        tracing::debug!("Opened scheme database at {:?}", db_path);
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Storage(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schemes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (length(trim(name)) > 0),
                category TEXT NOT NULL CHECK (length(trim(category)) > 0),
                eligibility TEXT NOT NULL CHECK (length(trim(eligibility)) > 0),
                benefits TEXT NOT NULL CHECK (length(trim(benefits)) > 0),
                how_to_apply TEXT NOT NULL CHECK (length(trim(how_to_apply)) > 0),
                keywords TEXT NOT NULL CHECK (length(trim(keywords)) > 0),
                localized_summary TEXT NOT NULL CHECK (length(trim(localized_summary)) > 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

        // SQLite's own lower()/LIKE only fold ASCII.
        conn.create_scalar_function(
            "ci_contains",
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let haystack = ctx.get::<String>(0)?;
                let needle = ctx.get::<String>(1)?;
                Ok(contains_ci(&haystack, &needle))
            },
        )
        .map_err(|e| AppError::Storage(format!("Failed to register ci_contains: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    /// Validate and insert one scheme, stamping its timestamps.
    pub fn insert(&self, scheme: NewScheme) -> AppResult<SchemeRecord> {
        let conn = self.lock()?;
        insert_scheme(&conn, scheme.validated()?)
    }

    /// Insert many schemes in one transaction, optionally clearing the
    /// table first. Nothing is written if any scheme is invalid.
    pub fn insert_all(&self, schemes: Vec<NewScheme>, reset: bool) -> AppResult<Vec<SchemeRecord>> {
        let validated = schemes
            .into_iter()
            .map(NewScheme::validated)
            .collect::<AppResult<Vec<_>>>()?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        if reset {
            tx.execute("DELETE FROM schemes", [])
                .map_err(|e| AppError::Storage(format!("Failed to delete schemes: {}", e)))?;
        }

        let mut inserted = Vec::with_capacity(validated.len());
        for scheme in validated {
            inserted.push(insert_scheme(&tx, scheme)?);
        }

        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit schemes: {}", e)))?;

        Ok(inserted)
    }

    /// Delete every scheme.
    pub fn reset(&self) -> AppResult<()> {
        self.lock()?
            .execute("DELETE FROM schemes", [])
            .map_err(|e| AppError::Storage(format!("Failed to delete schemes: {}", e)))?;

        tracing::info!("Reset scheme store");
        Ok(())
    }

    /// Number of stored schemes.
    pub fn count(&self) -> AppResult<usize> {
        self.lock()?
            .query_row("SELECT COUNT(*) FROM schemes", [], |row| {
                row.get::<_, i64>(0).map(|v| v as usize)
            })
            .map_err(|e| AppError::Storage(format!("Failed to count schemes: {}", e)))
    }

    async fn query_records(&self, sql: String, params: Vec<Value>) -> AppResult<Vec<SchemeRecord>> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

            let rows = stmt
                .query_map(params_from_iter(params.iter()), row_to_record)
                .map_err(|e| AppError::Storage(format!("Failed to query schemes: {}", e)))?;

            let records = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::Storage(format!("Failed to read scheme row: {}", e)))?;
            Ok::<_, AppError>(records)
        })
        .await
        .map_err(|e| AppError::Storage(format!("Scheme query task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl SchemeRepository for SqliteSchemeRepository {
    async fn find(&self, query: &SchemeQuery) -> AppResult<Vec<SchemeRecord>> {
        if query.fields.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let predicate = query
            .fields
            .iter()
            .map(|field| format!("ci_contains({}, ?1)", field.column()))
            .collect::<Vec<_>>()
            .join(" OR ");

        let sql = format!(
            "SELECT {} FROM schemes WHERE {} ORDER BY id LIMIT ?2",
            SELECT_COLUMNS, predicate
        );

        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let records = self
            .query_records(sql, vec![Value::Text(query.needle.clone()), Value::Integer(limit)])
            .await?;

        tracing::debug!(
            "Matched {} schemes (limit {}) for needle {:?}",
            records.len(),
            query.limit,
            query.needle
        );

        Ok(records)
    }

    async fn all(&self) -> AppResult<Vec<SchemeRecord>> {
        let sql = format!("SELECT {} FROM schemes ORDER BY id", SELECT_COLUMNS);
        self.query_records(sql, Vec::new()).await
    }
}

fn lock(conn: &Mutex<Connection>) -> AppResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| AppError::Storage("Scheme database lock poisoned".to_string()))
}

fn insert_scheme(conn: &Connection, scheme: NewScheme) -> AppResult<SchemeRecord> {
    let now = Utc::now();
    let stamp = now.to_rfc3339();

    conn.execute(
        "INSERT INTO schemes (name, category, eligibility, benefits, how_to_apply, \
         keywords, localized_summary, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            scheme.name,
            scheme.category,
            scheme.eligibility,
            scheme.benefits,
            scheme.how_to_apply,
            scheme.keywords,
            scheme.localized_summary,
            stamp,
        ],
    )
    .map_err(|e| AppError::Storage(format!("Failed to insert scheme: {}", e)))?;

    Ok(SchemeRecord {
        id: conn.last_insert_rowid(),
        name: scheme.name,
        category: scheme.category,
        eligibility: scheme.eligibility,
        benefits: scheme.benefits,
        how_to_apply: scheme.how_to_apply,
        keywords: scheme.keywords,
        localized_summary: scheme.localized_summary,
        created_at: now,
        updated_at: now,
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SchemeRecord> {
    Ok(SchemeRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        eligibility: row.get(3)?,
        benefits: row.get(4)?,
        how_to_apply: row.get(5)?,
        keywords: row.get(6)?,
        localized_summary: row.get(7)?,
        created_at: parse_timestamp(row, 8)?,
        updated_at: parse_timestamp(row, 9)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::sample_schemes;
    use sanchar_core::{MatchPolicy, SchemeField};
    use tempfile::TempDir;

    fn seeded() -> SqliteSchemeRepository {
        let repo = SqliteSchemeRepository::open_in_memory().unwrap();
        repo.insert_all(sample_schemes(), false).unwrap();
        repo
    }

    #[tokio::test]
    async fn test_find_by_keyword() {
        let repo = seeded();
        let query = SchemeQuery::new("जन धन", MatchPolicy::Extended.fields(), 3);

        let records = repo.find(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "प्रधानमंत्री जन धन योजना");
    }

    #[tokio::test]
    async fn test_find_is_case_insensitive() {
        let repo = seeded();
        let query = SchemeQuery::new("pm-kisan", MatchPolicy::Legacy.fields(), 3);

        let records = repo.find(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "प्रधानमंत्री किसान सम्मान निधि");
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order_and_limit() {
        let repo = seeded();
        // "प्रधानमंत्री" appears in three scheme names
        let query = SchemeQuery::new("प्रधानमंत्री", &[SchemeField::Name], 2);

        let records = repo.find(&query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].id < records[1].id);
        assert_eq!(records[0].name, "प्रधानमंत्री जन धन योजना");
        assert_eq!(records[1].name, "प्रधानमंत्री किसान सम्मान निधि");
    }

    #[tokio::test]
    async fn test_find_does_not_treat_needle_as_pattern() {
        let repo = seeded();
        let query = SchemeQuery::new("%", MatchPolicy::Extended.fields(), 10);
        assert!(repo.find(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_with_no_fields_is_empty() {
        let repo = seeded();
        let query = SchemeQuery::new("योजना", &[], 10);
        assert!(repo.find(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_round_trips_timestamps() {
        let repo = seeded();
        let all = repo.all().await.unwrap();

        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.created_at == r.updated_at));
        assert!(all.iter().all(SchemeRecord::is_groundable));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_finds_share_the_connection() {
        let repo = Arc::new(seeded());

        let lookups = ["जन धन", "pm-kisan", "आयुष्मान", "पेंशन"]
            .into_iter()
            .cycle()
            .take(16)
            .map(|needle| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let query = SchemeQuery::new(needle, MatchPolicy::Extended.fields(), 3);
                    repo.find(&query).await.map(|records| records.len())
                })
            });

        let counts: Vec<usize> = futures::future::join_all(lookups)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(counts.len(), 16);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[1], 1);
        assert!(counts.chunks(4).all(|chunk| chunk == &counts[..4]));
    }

    #[test]
    fn test_insert_rejects_invalid_scheme() {
        let repo = SqliteSchemeRepository::open_in_memory().unwrap();
        let mut scheme = sample_schemes().remove(0);
        scheme.keywords = " ".to_string();

        assert!(repo.insert(scheme).is_err());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_all_is_atomic() {
        let repo = SqliteSchemeRepository::open_in_memory().unwrap();
        let mut schemes = sample_schemes();
        schemes[3].eligibility = String::new();

        assert!(repo.insert_all(schemes, false).is_err());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_reset_and_count() {
        let repo = seeded();
        assert_eq!(repo.count().unwrap(), 5);

        repo.insert_all(sample_schemes(), true).unwrap();
        assert_eq!(repo.count().unwrap(), 5);

        repo.reset().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_on_disk_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/schemes.sqlite");

        {
            let repo = SqliteSchemeRepository::open(&path).unwrap();
            repo.insert_all(sample_schemes(), false).unwrap();
        }

        let reopened = SqliteSchemeRepository::open(&path).unwrap();
        assert_eq!(reopened.all().await.unwrap().len(), 5);
    }
}
