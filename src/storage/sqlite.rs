//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{Entity, EntityId, IdRange, ReferenceKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{BatchRows, NoDataFlags};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::path::Path;

const PROCESSED_SQL: &str = "
    SELECT app_id FROM apps_genres
    UNION SELECT app_id FROM apps_categories
    UNION SELECT app_id FROM apps_store_tags
    UNION SELECT app_id FROM apps_prices
    UNION SELECT id FROM apps WHERE no_data = 1
";

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
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection, used by tests to inject failures
    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Writes every row of a batch inside an open transaction
fn write_batch(tx: &Transaction<'_>, rows: &BatchRows) -> rusqlite::Result<()> {
    for kind in ReferenceKind::all() {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (id, name) VALUES (?1, ?2)",
            kind.table()
        );
        let mut stmt = tx.prepare_cached(&sql)?;
        for reference in rows.new_references(kind) {
            stmt.execute(params![reference.id, reference.name])?;
        }
    }

    {
        let mut stmt =
            tx.prepare_cached("UPDATE apps SET no_data = 1, no_data_details = 1 WHERE id = ?1")?;
        for id in &rows.no_data {
            stmt.execute(params![id])?;
        }

        let mut stmt = tx.prepare_cached("UPDATE apps SET no_data_tags = 1 WHERE id = ?1")?;
        for id in &rows.no_tags {
            stmt.execute(params![id])?;
        }
    }

    {
        let mut stmt =
            tx.prepare_cached("INSERT INTO apps_genres (app_id, genre_id) VALUES (?1, ?2)")?;
        for link in &rows.genre_links {
            stmt.execute(params![link.entity_id, link.reference_id])?;
        }

        let mut stmt = tx
            .prepare_cached("INSERT INTO apps_categories (app_id, category_id) VALUES (?1, ?2)")?;
        for link in &rows.category_links {
            stmt.execute(params![link.entity_id, link.reference_id])?;
        }

        let mut stmt = tx.prepare_cached(
            "INSERT INTO apps_store_tags (app_id, tag_id, tag_order) VALUES (?1, ?2, ?3)",
        )?;
        for link in &rows.tag_links {
            stmt.execute(params![link.entity_id, link.tag_id, link.order])?;
        }
    }

    let mut stmt = tx.prepare_cached("INSERT INTO apps_prices (app_id, price) VALUES (?1, ?2)")?;
    for row in &rows.prices {
        stmt.execute(params![row.entity_id, row.price])?;
    }

    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Catalog =====

    fn insert_entities(&mut self, entities: &[Entity]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached("INSERT OR IGNORE INTO apps (id, name) VALUES (?1, ?2)")?;
            for entity in entities {
                inserted += stmt.execute(params![entity.id, entity.name])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn entity_ids(&self, range: Option<IdRange>) -> StorageResult<Vec<EntityId>> {
        let ids = match range {
            Some(range) => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id FROM apps WHERE id >= ?1 AND id < ?2 ORDER BY id")?;
                let ids = stmt
                    .query_map(params![range.start, range.end], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            }
            None => {
                let mut stmt = self.conn.prepare("SELECT id FROM apps ORDER BY id")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            }
        };

        Ok(ids)
    }

    // ===== Checkpoint =====

    fn processed_entity_ids(&self) -> StorageResult<HashSet<EntityId>> {
        let mut stmt = self.conn.prepare(PROCESSED_SQL)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn reference_ids(&self, kind: ReferenceKind) -> StorageResult<HashSet<i64>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {}", kind.table()))?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    // ===== Batch Commit =====

    fn commit_batch(&mut self, rows: &BatchRows) -> StorageResult<()> {
        // Dropping the transaction without commit rolls it back
        let tx = self.conn.transaction()?;
        write_batch(&tx, rows)?;
        tx.commit()?;
        Ok(())
    }

    fn clear_ingested(&mut self) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "
            DELETE FROM apps_genres;
            DELETE FROM apps_categories;
            DELETE FROM apps_store_tags;
            DELETE FROM apps_prices;
            UPDATE apps SET no_data = 0, no_data_details = 0, no_data_tags = 0;
        ",
        )?;
        tx.commit()?;
        Ok(())
    }

    // ===== Read-back =====

    fn reference_name(&self, kind: ReferenceKind, id: i64) -> StorageResult<Option<String>> {
        let name = self
            .conn
            .query_row(
                &format!("SELECT name FROM {} WHERE id = ?1", kind.table()),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    fn linked_references(
        &self,
        kind: ReferenceKind,
        entity_id: EntityId,
    ) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {col} FROM {table} WHERE app_id = ?1 ORDER BY {col}",
            col = kind.link_column(),
            table = kind.link_table()
        ))?;
        let ids = stmt
            .query_map(params![entity_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn tag_links_for(&self, entity_id: EntityId) -> StorageResult<Vec<(i64, u32)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag_id, tag_order FROM apps_store_tags WHERE app_id = ?1 ORDER BY tag_order",
        )?;
        let links = stmt
            .query_map(params![entity_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn price_for(&self, entity_id: EntityId) -> StorageResult<Option<i64>> {
        let price = self
            .conn
            .query_row(
                "SELECT price FROM apps_prices WHERE app_id = ?1",
                params![entity_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(price)
    }

    fn no_data_flags(&self, entity_id: EntityId) -> StorageResult<NoDataFlags> {
        self.conn
            .query_row(
                "SELECT no_data, no_data_details, no_data_tags FROM apps WHERE id = ?1",
                params![entity_id],
                |row| {
                    Ok(NoDataFlags {
                        no_data: row.get(0)?,
                        no_data_details: row.get(1)?,
                        no_data_tags: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StorageError::EntityNotFound(entity_id))
    }

    // ===== Statistics =====

    fn count_entities(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM apps")
    }

    fn count_no_data(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM apps WHERE no_data = 1")
    }

    fn count_no_tags(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM apps WHERE no_data_tags = 1")
    }

    fn count_references(&self, kind: ReferenceKind) -> StorageResult<u64> {
        self.count(&format!("SELECT COUNT(*) FROM {}", kind.table()))
    }

    fn count_links(&self, kind: ReferenceKind) -> StorageResult<u64> {
        self.count(&format!("SELECT COUNT(*) FROM {}", kind.link_table()))
    }

    fn count_prices(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM apps_prices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NamedRef;
    use crate::storage::{LinkRow, PriceRow, TagLinkRow};

    fn storage_with_catalog(ids: &[EntityId]) -> SqliteStorage {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let entities: Vec<_> = ids
            .iter()
            .map(|id| Entity::new(*id, format!("App {}", id)))
            .collect();
        storage.insert_entities(&entities).unwrap();
        storage
    }

    fn sample_batch() -> BatchRows {
        BatchRows {
            entity_count: 3,
            new_genres: vec![NamedRef::new(10, "Action")],
            new_categories: vec![NamedRef::new(2, "Single-player")],
            new_tags: vec![NamedRef::new(19, "Action"), NamedRef::new(492, "Indie")],
            genre_links: vec![LinkRow {
                entity_id: 1,
                reference_id: 10,
            }],
            category_links: vec![LinkRow {
                entity_id: 1,
                reference_id: 2,
            }],
            tag_links: vec![
                TagLinkRow {
                    entity_id: 1,
                    tag_id: 492,
                    order: 0,
                },
                TagLinkRow {
                    entity_id: 1,
                    tag_id: 19,
                    order: 1,
                },
            ],
            prices: vec![PriceRow {
                entity_id: 1,
                price: 49900,
            }],
            no_data: vec![2],
            no_tags: vec![],
        }
    }

    #[test]
    fn test_insert_entities_ignores_duplicates() {
        let mut storage = storage_with_catalog(&[1, 2]);
        let inserted = storage
            .insert_entities(&[Entity::new(2, "Dup"), Entity::new(3, "New")])
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(storage.count_entities().unwrap(), 3);
    }

    #[test]
    fn test_entity_ids_ordered_and_ranged() {
        let storage = storage_with_catalog(&[30, 10, 20]);
        assert_eq!(storage.entity_ids(None).unwrap(), vec![10, 20, 30]);
        assert_eq!(
            storage
                .entity_ids(Some(IdRange { start: 15, end: 30 }))
                .unwrap(),
            vec![20]
        );
    }

    #[test]
    fn test_processed_empty_on_first_run() {
        let storage = storage_with_catalog(&[1, 2, 3]);
        assert!(storage.processed_entity_ids().unwrap().is_empty());
    }

    #[test]
    fn test_commit_batch_and_read_back() {
        let mut storage = storage_with_catalog(&[1, 2, 3]);
        storage.commit_batch(&sample_batch()).unwrap();

        let processed = storage.processed_entity_ids().unwrap();
        assert_eq!(processed, HashSet::from([1, 2]));

        assert_eq!(
            storage
                .reference_name(ReferenceKind::Genre, 10)
                .unwrap()
                .as_deref(),
            Some("Action")
        );
        assert_eq!(
            storage.linked_references(ReferenceKind::Category, 1).unwrap(),
            vec![2]
        );
        assert_eq!(storage.tag_links_for(1).unwrap(), vec![(492, 0), (19, 1)]);
        assert_eq!(storage.price_for(1).unwrap(), Some(49900));

        let flags = storage.no_data_flags(2).unwrap();
        assert!(flags.no_data && flags.no_data_details && !flags.no_data_tags);
        assert_eq!(storage.no_data_flags(1).unwrap(), NoDataFlags::default());
    }

    #[test]
    fn test_price_only_entity_counts_as_processed() {
        let mut storage = storage_with_catalog(&[5]);
        let rows = BatchRows {
            entity_count: 1,
            prices: vec![PriceRow {
                entity_id: 5,
                price: 0,
            }],
            no_tags: vec![5],
            ..Default::default()
        };
        storage.commit_batch(&rows).unwrap();

        assert!(storage.processed_entity_ids().unwrap().contains(&5));
        assert!(storage.no_data_flags(5).unwrap().no_data_tags);
    }

    #[test]
    fn test_failed_commit_rolls_back_everything() {
        let mut storage = storage_with_catalog(&[1, 2, 3]);
        storage
            .conn()
            .execute_batch(
                "CREATE TRIGGER fail_price BEFORE INSERT ON apps_prices
                 BEGIN SELECT RAISE(ABORT, 'injected price failure'); END;",
            )
            .unwrap();

        let result = storage.commit_batch(&sample_batch());
        assert!(result.is_err());

        assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 0);
        assert_eq!(storage.count_references(ReferenceKind::Tag).unwrap(), 0);
        assert_eq!(storage.count_links(ReferenceKind::Genre).unwrap(), 0);
        assert_eq!(storage.count_no_data().unwrap(), 0);
        assert!(storage.processed_entity_ids().unwrap().is_empty());
    }

    #[test]
    fn test_known_reference_is_never_renamed() {
        let mut storage = storage_with_catalog(&[1]);
        storage
            .commit_batch(&BatchRows {
                new_genres: vec![NamedRef::new(10, "Action")],
                ..Default::default()
            })
            .unwrap();
        storage
            .commit_batch(&BatchRows {
                new_genres: vec![NamedRef::new(10, "Renamed")],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 1);
        assert_eq!(
            storage
                .reference_name(ReferenceKind::Genre, 10)
                .unwrap()
                .as_deref(),
            Some("Action")
        );
    }

    #[test]
    fn test_link_to_unknown_entity_fails() {
        let mut storage = storage_with_catalog(&[1]);
        let rows = BatchRows {
            new_genres: vec![NamedRef::new(10, "Action")],
            genre_links: vec![LinkRow {
                entity_id: 99,
                reference_id: 10,
            }],
            ..Default::default()
        };

        assert!(storage.commit_batch(&rows).is_err());
        assert_eq!(storage.count_references(ReferenceKind::Genre).unwrap(), 0);
    }

    #[test]
    fn test_clear_ingested_keeps_references() {
        let mut storage = storage_with_catalog(&[1, 2, 3]);
        storage.commit_batch(&sample_batch()).unwrap();
        storage.clear_ingested().unwrap();

        assert!(storage.processed_entity_ids().unwrap().is_empty());
        assert_eq!(storage.count_prices().unwrap(), 0);
        assert_eq!(storage.count_no_data().unwrap(), 0);
        assert_eq!(storage.count_references(ReferenceKind::Tag).unwrap(), 2);
        assert_eq!(
            storage.reference_ids(ReferenceKind::Tag).unwrap(),
            HashSet::from([19, 492])
        );
    }

    #[test]
    fn test_no_data_flags_for_missing_entity() {
        let storage = storage_with_catalog(&[1]);
        assert!(matches!(
            storage.no_data_flags(42),
            Err(StorageError::EntityNotFound(42))
        ));
    }
}
