use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use serde::Deserialize;
use serde_json::Value;

use crate::db::query::sort_and_paginate;
use crate::db::types::{Entity, Page, QueryOptions, RecordMeta};
use crate::db::Repository;
use crate::error::{RepoError, RepoResult};

/// Handle to the SQLite database backing the indexed repositories. Every
/// entity type gets its own table: `id` primary key, one indexed column per
/// field in [`Entity::INDEXES`], and the JSON `body`.
#[derive(Clone)]
pub struct IndexedDb {
    conn: Arc<Mutex<Connection>>,
}

impl IndexedDb {
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(IndexedDb {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens (creating if needed) the table for `E`.
    pub fn table<E: Entity>(&self) -> Result<TableRepository<E>> {
        let conn = self.connection()?;
        let index_columns: String = E::INDEXES
            .iter()
            .map(|field| format!("{} TEXT, ", quote(field)))
            .collect();
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT NOT NULL PRIMARY KEY, {}body TEXT NOT NULL);",
            quote(E::COLLECTION),
            index_columns
        );
        for field in E::INDEXES {
            sql.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({});",
                quote(&format!("{}_{}_idx", E::COLLECTION, field)),
                quote(E::COLLECTION),
                quote(field)
            ));
        }
        conn.execute_batch(&sql)
            .with_context(|| format!("Failed to create table '{}'", E::COLLECTION))?;
        log::debug!("TABLE READY: '{}' indexes={:?}", E::COLLECTION, E::INDEXES);

        Ok(TableRepository {
            db: self.clone(),
            _entity: PhantomData,
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire connection lock"))
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[derive(Deserialize)]
struct StoredRow {
    id: String,
    body: String,
}

/// Repository backend over one [`IndexedDb`] table.
pub struct TableRepository<E: Entity> {
    db: IndexedDb,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> TableRepository<E> {
    fn select(&self, conn: &Connection, clause: &str, values: &[&str]) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT id, body FROM {} {} ORDER BY rowid",
            quote(E::COLLECTION),
            clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = serde_rusqlite::from_rows::<StoredRow>(stmt.query(params_from_iter(values.iter()))?);
        let mut entities = Vec::new();
        for row in rows {
            let row = row?;
            let entity = serde_json::from_str(&row.body).with_context(|| {
                format!("Failed to decode {} '{}'", E::COLLECTION, row.id)
            })?;
            entities.push(entity);
        }
        Ok(entities)
    }

    fn get(&self, conn: &Connection, id: &str) -> Result<Option<E>> {
        Ok(self.select(conn, "WHERE id = ?1", &[id])?.into_iter().next())
    }

    /// Column values in table order: id, index columns, body.
    fn row_values(entity: &E) -> Result<Vec<Option<String>>> {
        let value = serde_json::to_value(entity)?;
        let mut values = vec![Some(entity.id().to_string())];
        for field in E::INDEXES {
            values.push(match value.get(*field) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            });
        }
        values.push(Some(serde_json::to_string(&value)?));
        Ok(values)
    }

    fn insert(&self, conn: &Connection, entity: &E) -> Result<()> {
        let columns: Vec<String> = std::iter::once("id".to_string())
            .chain(E::INDEXES.iter().map(|field| quote(field)))
            .chain(std::iter::once("body".to_string()))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(E::COLLECTION),
            columns.join(", "),
            placeholders.join(", ")
        );
        conn.execute(&sql, params_from_iter(Self::row_values(entity)?))?;
        Ok(())
    }

    fn replace(&self, conn: &Connection, entity: &E) -> Result<()> {
        let mut values = Self::row_values(entity)?;
        // id moves to the end to bind the WHERE clause
        let id = values.remove(0);
        values.push(id);
        let assignments: Vec<String> = E::INDEXES
            .iter()
            .map(|field| quote(field))
            .chain(std::iter::once("body".to_string()))
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            quote(E::COLLECTION),
            assignments.join(", "),
            values.len()
        );
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn remove(&self, conn: &Connection, id: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", quote(E::COLLECTION));
        Ok(conn.execute(&sql, params![id])? > 0)
    }

    fn all(&self) -> Result<Vec<E>> {
        let conn = self.db.connection()?;
        self.select(&conn, "", &[])
    }
}

impl<E: Entity> Repository<E> for TableRepository<E> {
    fn find_all(&self, options: &QueryOptions) -> RepoResult<Page<E>> {
        let records = self.all().map_err(|e| RepoError::storage("find_all", e))?;
        Ok(sort_and_paginate(records, options))
    }

    fn find_by_id(&self, id: &str) -> RepoResult<E> {
        let found = self
            .db
            .connection()
            .and_then(|conn| self.get(&conn, id))
            .map_err(|e| RepoError::storage("find_by_id", e))?;
        found.ok_or_else(|| RepoError::not_found(E::COLLECTION, id))
    }

    fn find_by_ids(&self, ids: &[String]) -> RepoResult<Vec<E>> {
        let lookup = || -> Result<Vec<E>> {
            let conn = self.db.connection()?;
            let mut found = Vec::new();
            for id in ids {
                if let Some(entity) = self.get(&conn, id)? {
                    found.push(entity);
                }
            }
            Ok(found)
        };
        lookup().map_err(|e| RepoError::storage("find_by_ids", e))
    }

    fn find_where(&self, field: &str, value: &str) -> RepoResult<Vec<E>> {
        let lookup = || -> Result<Vec<E>> {
            let conn = self.db.connection()?;
            if E::INDEXES.contains(&field) {
                let clause = format!("WHERE {} = ?1", quote(field));
                self.select(&conn, &clause, &[value])
            } else {
                let path = format!("$.\"{}\"", field.replace('"', ""));
                self.select(&conn, "WHERE json_extract(body, ?1) = ?2", &[path.as_str(), value])
            }
        };
        lookup().map_err(|e| RepoError::storage("find_where", e))
    }

    fn create(&self, input: E::Create) -> RepoResult<E> {
        let entity = E::build(RecordMeta::new(E::ID_PREFIX), input);
        self.db
            .connection()
            .and_then(|conn| self.insert(&conn, &entity))
            .map_err(|e| RepoError::storage("create", e))?;
        log::debug!("CREATE: {} '{}'", E::COLLECTION, entity.id());
        Ok(entity)
    }

    fn update(&self, id: &str, patch: E::Patch) -> RepoResult<E> {
        let apply = || -> Result<Option<E>> {
            let mut conn = self.db.connection()?;
            let txn = conn.transaction()?;
            let Some(mut entity) = self.get(&txn, id)? else {
                return Ok(None);
            };
            entity.apply(patch);
            entity.meta_mut().touch();
            self.replace(&txn, &entity)?;
            txn.commit()?;
            Ok(Some(entity))
        };
        apply()
            .map_err(|e| RepoError::storage("update", e))?
            .ok_or_else(|| RepoError::not_found(E::COLLECTION, id))
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<bool> {
        let removed = self
            .db
            .connection()
            .and_then(|conn| self.remove(&conn, id))
            .map_err(|e| RepoError::storage("delete_by_id", e))?;
        if removed {
            Ok(true)
        } else {
            Err(RepoError::not_found(E::COLLECTION, id))
        }
    }

    fn delete_by_ids(&self, ids: &[String]) -> RepoResult<usize> {
        let remove_all = || -> Result<usize> {
            let mut conn = self.db.connection()?;
            let txn = conn.transaction()?;
            let mut removed = 0;
            for id in ids {
                if self.remove(&txn, id)? {
                    removed += 1;
                }
            }
            txn.commit()?;
            Ok(removed)
        };
        remove_all().map_err(|e| RepoError::storage("delete_by_ids", e))
    }

    fn count(&self) -> RepoResult<usize> {
        let count = || -> Result<usize> {
            let conn = self.db.connection()?;
            let sql = format!("SELECT COUNT(*) FROM {}", quote(E::COLLECTION));
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count as usize)
        };
        count().map_err(|e| RepoError::storage("count", e))
    }
}
