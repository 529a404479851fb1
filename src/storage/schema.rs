//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Catalog-Ingest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Catalog entities, loaded once by the catalog step
CREATE TABLE IF NOT EXISTS apps (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    no_data INTEGER NOT NULL DEFAULT 0,
    no_data_details INTEGER NOT NULL DEFAULT 0,
    no_data_tags INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_apps_no_data ON apps(no_data);

-- Reference sets
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS store_tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

-- Entity <-> reference links
CREATE TABLE IF NOT EXISTS apps_genres (
    app_id INTEGER NOT NULL REFERENCES apps(id),
    genre_id INTEGER NOT NULL REFERENCES genres(id),
    PRIMARY KEY (app_id, genre_id)
);

CREATE TABLE IF NOT EXISTS apps_categories (
    app_id INTEGER NOT NULL REFERENCES apps(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    PRIMARY KEY (app_id, category_id)
);

CREATE TABLE IF NOT EXISTS apps_store_tags (
    app_id INTEGER NOT NULL REFERENCES apps(id),
    tag_id INTEGER NOT NULL REFERENCES store_tags(id),
    tag_order INTEGER NOT NULL,
    PRIMARY KEY (app_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_apps_genres_genre ON apps_genres(genre_id);
CREATE INDEX IF NOT EXISTS idx_apps_categories_category ON apps_categories(category_id);
CREATE INDEX IF NOT EXISTS idx_apps_store_tags_tag ON apps_store_tags(tag_id);

-- Final price in minor units
CREATE TABLE IF NOT EXISTS apps_prices (
    app_id INTEGER PRIMARY KEY REFERENCES apps(id),
    price INTEGER NOT NULL CHECK (price >= 0)
);
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
