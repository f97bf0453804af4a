//! Database layer using SQLite

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Mutex;

/// SQLite database wrapper
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("webhallen.db");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Run database migrations
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Products scraped from the Webhallen store. The id column is
            -- deliberately not unique: the scraper may land the same product
            -- more than once and lookups return every matching row.
            CREATE TABLE IF NOT EXISTS Products (
                id TEXT NOT NULL,
                name TEXT,
                price REAL,
                ean TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_products_id
                ON Products(id);
        "#,
        )?;

        Ok(())
    }

    /// Look up all products matching an id, returned as loosely typed
    /// JSON objects so columns added out-of-band flow through untouched
    pub fn products_by_id(&self, product_id: &str) -> Result<Vec<Value>> {
        self.query("SELECT * FROM Products WHERE id = ?", &[&product_id])
    }

    /// Execute a query and return results as JSON
    pub fn query(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Value>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;

        let column_count = stmt.column_count();
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt.query_map(params, |row| {
            let mut obj = serde_json::Map::new();
            for i in 0..column_count {
                let value: Value = match row.get_ref(i)? {
                    rusqlite::types::ValueRef::Null => Value::Null,
                    rusqlite::types::ValueRef::Integer(i) => json!(i),
                    rusqlite::types::ValueRef::Real(f) => json!(f),
                    rusqlite::types::ValueRef::Text(s) => json!(String::from_utf8_lossy(s)),
                    rusqlite::types::ValueRef::Blob(b) => json!(format!(
                        "0x{}",
                        b.iter().map(|byte| format!("{:02x}", byte)).collect::<String>()
                    )),
                };
                obj.insert(column_names[i].clone(), value);
            }
            Ok(Value::Object(obj))
        })?;

        let results = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Execute a statement (INSERT, UPDATE, DELETE)
    pub fn execute(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(sql, params)?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn migrate_creates_products_table() {
        let (_dir, db) = open_db();
        db.migrate().unwrap();

        let rows = db.products_by_id("1").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn lookup_returns_matching_rows() {
        let (_dir, db) = open_db();
        db.migrate().unwrap();
        db.execute(
            "INSERT INTO Products (id, name, price, ean) VALUES (?, ?, ?, ?)",
            &[&"42", &"Widget", &19.9, &"7340004664925"],
        )
        .unwrap();

        let rows = db.products_by_id("42").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "42");
        assert_eq!(rows[0]["name"], "Widget");
        assert_eq!(rows[0]["price"], 19.9);
    }

    #[test]
    fn lookup_returns_every_row_sharing_an_id() {
        let (_dir, db) = open_db();
        db.migrate().unwrap();
        db.execute(
            "INSERT INTO Products (id, name) VALUES (?, ?)",
            &[&"7", &"First"],
        )
        .unwrap();
        db.execute(
            "INSERT INTO Products (id, name) VALUES (?, ?)",
            &[&"7", &"Second"],
        )
        .unwrap();

        let rows = db.products_by_id("7").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn null_columns_pass_through_as_json_null() {
        let (_dir, db) = open_db();
        db.migrate().unwrap();
        db.execute("INSERT INTO Products (id) VALUES (?)", &[&"9"]).unwrap();

        let rows = db.products_by_id("9").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["name"].is_null());
        assert!(rows[0]["price"].is_null());
    }

    #[test]
    fn query_against_missing_table_fails() {
        let (_dir, db) = open_db();
        // No migrate: the Products table does not exist yet.
        assert!(db.products_by_id("1").is_err());
    }
}
