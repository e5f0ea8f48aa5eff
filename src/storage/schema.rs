//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Reel-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    total_pages INTEGER NOT NULL,
    workers INTEGER NOT NULL,
    status TEXT NOT NULL,
    tasks_completed INTEGER NOT NULL DEFAULT 0,
    tasks_failed INTEGER NOT NULL DEFAULT 0
);

-- One row per detail page; url is the natural key
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    original_title TEXT NOT NULL,
    duration TEXT NOT NULL,
    quality TEXT NOT NULL,
    resolution TEXT NOT NULL,
    language TEXT NOT NULL,
    production_company TEXT NOT NULL,
    release_date TEXT NOT NULL,
    status TEXT NOT NULL,
    poster TEXT NOT NULL,
    content TEXT NOT NULL,
    year INTEGER NOT NULL,
    views REAL NOT NULL,
    imdb_score REAL NOT NULL,
    aw_score REAL NOT NULL,
    created_at TEXT NOT NULL
);

-- Shared related entities, keyed by natural key
CREATE TABLE IF NOT EXISTS people (
    href TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    image TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    href TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS countries (
    code TEXT PRIMARY KEY,
    href TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS keywords (
    text TEXT PRIMARY KEY
);

-- Record <-> entity links
CREATE TABLE IF NOT EXISTS record_directors (
    record_id INTEGER NOT NULL REFERENCES records(id),
    person_href TEXT NOT NULL REFERENCES people(href),
    PRIMARY KEY (record_id, person_href)
);

CREATE TABLE IF NOT EXISTS record_actors (
    record_id INTEGER NOT NULL REFERENCES records(id),
    person_href TEXT NOT NULL REFERENCES people(href),
    PRIMARY KEY (record_id, person_href)
);

CREATE TABLE IF NOT EXISTS record_categories (
    record_id INTEGER NOT NULL REFERENCES records(id),
    category_href TEXT NOT NULL REFERENCES categories(href),
    PRIMARY KEY (record_id, category_href)
);

CREATE TABLE IF NOT EXISTS record_countries (
    record_id INTEGER NOT NULL REFERENCES records(id),
    country_code TEXT NOT NULL REFERENCES countries(code),
    PRIMARY KEY (record_id, country_code)
);

CREATE TABLE IF NOT EXISTS record_keywords (
    record_id INTEGER NOT NULL REFERENCES records(id),
    keyword TEXT NOT NULL REFERENCES keywords(text),
    PRIMARY KEY (record_id, keyword)
);

CREATE INDEX IF NOT EXISTS idx_record_actors_person ON record_actors(person_href);
CREATE INDEX IF NOT EXISTS idx_record_directors_person ON record_directors(person_href);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Initialize twice
        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        // Should succeed the second time too
        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables = vec![
            "runs",
            "records",
            "people",
            "categories",
            "countries",
            "keywords",
            "record_directors",
            "record_actors",
            "record_categories",
            "record_countries",
            "record_keywords",
        ];

        for table in tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
