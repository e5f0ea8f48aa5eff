//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{Category, Country, Keyword, Person, Record};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredRecord, UpsertOutcome};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_people(&self, table: &str, record_id: i64) -> StorageResult<Vec<Person>> {
        let sql = format!(
            "SELECT p.href, p.name, p.image FROM {table} j
             JOIN people p ON p.href = j.person_href
             WHERE j.record_id = ?1 ORDER BY j.rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let people = stmt
            .query_map(params![record_id], |row| {
                Ok(Person {
                    href: row.get(0)?,
                    name: row.get(1)?,
                    image: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(people)
    }

    fn load_categories(&self, record_id: i64) -> StorageResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.href, c.name FROM record_categories j
             JOIN categories c ON c.href = j.category_href
             WHERE j.record_id = ?1 ORDER BY j.rowid",
        )?;
        let categories = stmt
            .query_map(params![record_id], |row| {
                Ok(Category {
                    href: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn load_countries(&self, record_id: i64) -> StorageResult<Vec<Country>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.code, c.href, c.name FROM record_countries j
             JOIN countries c ON c.code = j.country_code
             WHERE j.record_id = ?1 ORDER BY j.rowid",
        )?;
        let countries = stmt
            .query_map(params![record_id], |row| {
                Ok(Country {
                    code: row.get(0)?,
                    href: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(countries)
    }

    fn load_keywords(&self, record_id: i64) -> StorageResult<Vec<Keyword>> {
        let mut stmt = self
            .conn
            .prepare("SELECT keyword FROM record_keywords WHERE record_id = ?1 ORDER BY rowid")?;
        let keywords = stmt
            .query_map(params![record_id], |row| Ok(Keyword { text: row.get(0)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keywords)
    }

    fn count_table(&self, table: &str) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, total_pages, workers, \
                           status, tasks_completed, tasks_failed";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        total_pages: row.get(4)?,
        workers: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Running),
        tasks_completed: row.get::<_, i64>(7)? as u64,
        tasks_failed: row.get::<_, i64>(8)? as u64,
    })
}

/// Links `people` to a record, creating people not seen before
///
/// A person already stored keeps its name; a missing image is filled in
/// when this occurrence carries one.
fn link_people(
    tx: &Transaction<'_>,
    join_table: &str,
    record_id: i64,
    people: &[Person],
    now: &str,
) -> rusqlite::Result<()> {
    let link_sql =
        format!("INSERT OR IGNORE INTO {join_table} (record_id, person_href) VALUES (?1, ?2)");
    for person in people {
        tx.execute(
            "INSERT INTO people (href, name, image, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(href) DO UPDATE SET image = COALESCE(people.image, excluded.image)",
            params![person.href, person.name, person.image, now],
        )?;
        tx.execute(&link_sql, params![record_id, person.href])?;
    }
    Ok(())
}

fn link_related(tx: &Transaction<'_>, record_id: i64, record: &Record, now: &str) -> rusqlite::Result<()> {
    link_people(tx, "record_directors", record_id, &record.directors, now)?;
    link_people(tx, "record_actors", record_id, &record.actors, now)?;

    for category in &record.categories {
        tx.execute(
            "INSERT OR IGNORE INTO categories (href, name, created_at) VALUES (?1, ?2, ?3)",
            params![category.href, category.name, now],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO record_categories (record_id, category_href) VALUES (?1, ?2)",
            params![record_id, category.href],
        )?;
    }

    for country in &record.countries {
        tx.execute(
            "INSERT OR IGNORE INTO countries (code, href, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![country.code, country.href, country.name, now],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO record_countries (record_id, country_code) VALUES (?1, ?2)",
            params![record_id, country.code],
        )?;
    }

    for keyword in &record.keywords {
        tx.execute(
            "INSERT OR IGNORE INTO keywords (text) VALUES (?1)",
            params![keyword.text],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO record_keywords (record_id, keyword) VALUES (?1, ?2)",
            params![record_id, keyword.text],
        )?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        config_hash: &str,
        total_pages: u32,
        workers: u32,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, total_pages, workers, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                now,
                config_hash,
                total_pages,
                workers,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1");
        let run = self
            .conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;
        Ok(run)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY id DESC LIMIT 1");
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        tasks_completed: u64,
        tasks_failed: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, tasks_completed = ?3, tasks_failed = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                tasks_completed as i64,
                tasks_failed as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn upsert_record(&mut self, record: &Record) -> StorageResult<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM records WHERE url = ?1",
                params![record.url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            tx.commit()?;
            return Ok(UpsertOutcome::Existing(id));
        }

        tx.execute(
            "INSERT INTO records (
                url, title, original_title, duration, quality, resolution, language,
                production_company, release_date, status, poster, content,
                year, views, imdb_score, aw_score, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                record.url,
                record.title,
                record.original_title,
                record.duration,
                record.quality,
                record.resolution,
                record.language,
                record.production_company,
                record.release_date,
                record.status,
                record.poster,
                record.content,
                record.year,
                record.views,
                record.imdb_score,
                record.aw_score,
                now
            ],
        )?;
        let id = tx.last_insert_rowid();

        link_related(&tx, id, record, &now)?;
        tx.commit()?;

        Ok(UpsertOutcome::Inserted(id))
    }

    fn get_record_by_url(&self, url: &str) -> StorageResult<Option<StoredRecord>> {
        let stored = self
            .conn
            .query_row(
                "SELECT id, created_at, url, title, original_title, duration, quality, resolution,
                        language, production_company, release_date, status, poster, content,
                        year, views, imdb_score, aw_score
                 FROM records WHERE url = ?1",
                params![url],
                |row| {
                    Ok(StoredRecord {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        record: Record {
                            url: row.get(2)?,
                            title: row.get(3)?,
                            original_title: row.get(4)?,
                            duration: row.get(5)?,
                            quality: row.get(6)?,
                            resolution: row.get(7)?,
                            language: row.get(8)?,
                            production_company: row.get(9)?,
                            release_date: row.get(10)?,
                            status: row.get(11)?,
                            poster: row.get(12)?,
                            content: row.get(13)?,
                            year: row.get(14)?,
                            views: row.get(15)?,
                            imdb_score: row.get(16)?,
                            aw_score: row.get(17)?,
                            ..Record::default()
                        },
                    })
                },
            )
            .optional()?;

        let Some(mut stored) = stored else {
            return Ok(None);
        };

        stored.record.directors = self.load_people("record_directors", stored.id)?;
        stored.record.actors = self.load_people("record_actors", stored.id)?;
        stored.record.categories = self.load_categories(stored.id)?;
        stored.record.countries = self.load_countries(stored.id)?;
        stored.record.keywords = self.load_keywords(stored.id)?;

        Ok(Some(stored))
    }

    // ===== Statistics =====

    fn count_records(&self) -> StorageResult<u64> {
        self.count_table("records")
    }

    fn count_people(&self) -> StorageResult<u64> {
        self.count_table("people")
    }

    fn count_categories(&self) -> StorageResult<u64> {
        self.count_table("categories")
    }

    fn count_countries(&self) -> StorageResult<u64> {
        self.count_table("countries")
    }

    fn count_keywords(&self) -> StorageResult<u64> {
        self.count_table("keywords")
    }

    fn count_runs(&self) -> StorageResult<u64> {
        self.count_table("runs")
    }
}
