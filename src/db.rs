use crate::config::Config;
use crate::error::DbError;
use crate::model::{Book, NewBook, format_date, parse_date};
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

const SCHEMA: &str = include_str!("schema.sql");

/// Owns the store handle. Created once at startup and shared through `AppState`.
pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    replica: bool,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_replica(&self) -> bool {
        self.replica
    }

    pub async fn sync(&self) -> Result<()> {
        if self.replica {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());

        let (db, replica) = match cfg.app.remote() {
            Some((url, token)) => {
                tracing::info!("[db] running as embedded replica of {}", url);
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                let db = Builder::new_synced_database(&path, url.to_string(), token.to_string())
                    .sync_interval(sync_interval)
                    .build()
                    .await?;
                (db, true)
            }
            None => {
                tracing::info!("[db] using local database at {:?}", path);
                (Builder::new_local(&path).build().await?, false)
            }
        };

        Self::bootstrap(db, replica).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::bootstrap(db, false).await
    }

    async fn bootstrap(db: LibsqlDatabase, replica: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;
        conn.execute_batch(SCHEMA)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create schema: {e}"))?;

        Ok(Database { db, conn, replica })
    }
}

/// Maps `Book` records to statements against the `books` table.
pub struct Books<'a> {
    conn: &'a Connection,
}

impl<'a> Books<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, book: NewBook) -> Result<(), DbError> {
        let query = "INSERT INTO books (title, author, published_date) VALUES (?, ?, ?)";
        self.conn
            .execute(
                query,
                libsql::params![book.title, book.author, format_date(book.published_date)],
            )
            .await?;
        Ok(())
    }

    /// Rows whose columns cannot be read, or whose date is not `YYYY-MM-DD`,
    /// are logged and left out of the result.
    pub async fn get_all(&self) -> Result<Vec<Book>, DbError> {
        let query = "SELECT id, title, author, published_date FROM books";
        let mut rows = self.conn.query(query, ()).await?;
        let mut books = Vec::new();

        while let Some(row) = rows.next().await? {
            let (id, title, author, raw_date) = match Self::read_row(&row) {
                Ok(columns) => columns,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable book row");
                    continue;
                }
            };

            match parse_date(&raw_date) {
                Ok(published_date) => books.push(Book {
                    id,
                    title,
                    author,
                    published_date,
                }),
                Err(e) => {
                    tracing::warn!(book_id = id, published_date = %raw_date, error = %e, "skipping book with invalid date");
                }
            }
        }

        Ok(books)
    }

    pub async fn get_one(&self, id: i64) -> Result<Book, DbError> {
        let query = "SELECT id, title, author, published_date FROM books WHERE id = ?";
        let mut rows = self.conn.query(query, libsql::params![id]).await?;

        let Some(row) = rows.next().await? else {
            return Err(DbError::NotFound(id));
        };

        let (id, title, author, raw_date) = Self::read_row(&row)?;
        let published_date = parse_date(&raw_date).map_err(|source| {
            tracing::warn!(book_id = id, published_date = %raw_date, error = %source, "book has invalid date");
            DbError::InvalidDate {
                value: raw_date.clone(),
                source,
            }
        })?;

        Ok(Book {
            id,
            title,
            author,
            published_date,
        })
    }

    pub async fn update(&self, book: Book) -> Result<(), DbError> {
        let query = "UPDATE books SET title = ?, author = ?, published_date = ? WHERE id = ?";
        let affected = self
            .conn
            .execute(
                query,
                libsql::params![book.title, book.author, format_date(book.published_date), book.id],
            )
            .await?;

        if affected == 0 {
            tracing::debug!(book_id = book.id, "update matched no rows");
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id])
            .await?;

        if affected == 0 {
            tracing::debug!(book_id = id, "delete matched no rows");
        }
        Ok(())
    }

    fn read_row(row: &libsql::Row) -> Result<(i64, String, String, String), libsql::Error> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dune() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            published_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
        }
    }

    async fn insert_raw(conn: &Connection, title: &str, date: &str) {
        conn.execute(
            "INSERT INTO books (title, author, published_date) VALUES (?, ?, ?)",
            libsql::params![title, "Someone", date],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_then_get_one() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());

        books.create(dune()).await.unwrap();
        let all = books.get_all().await.unwrap();
        assert_eq!(all.len(), 1);

        let book = books.get_one(all[0].id).await.unwrap();
        assert_eq!(book, dune().with_id(all[0].id));
    }

    #[tokio::test]
    async fn test_dates_are_stored_as_plain_calendar_dates() {
        let db = Database::open_in_memory().await.unwrap();
        Books::new(db.connection()).create(dune()).await.unwrap();

        let mut rows = db
            .connection()
            .query("SELECT published_date FROM books", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let raw: String = row.get(0).unwrap();
        assert_eq!(raw, "1965-08-01");
    }

    #[tokio::test]
    async fn test_get_all_skips_rows_with_bad_dates() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());

        books.create(dune()).await.unwrap();
        insert_raw(db.connection(), "Broken", "01/08/1965").await;
        insert_raw(db.connection(), "Timestamped", "1965-08-01 00:00:00").await;
        insert_raw(db.connection(), "Unpadded", "1965-8-1").await;
        insert_raw(db.connection(), "ShortYear", "65-08-01").await;
        insert_raw(db.connection(), "Emma", "1815-12-23").await;

        let mut titles: Vec<String> = books
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn test_get_all_on_empty_table() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(Books::new(db.connection()).get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_one_missing_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let err = Books::new(db.connection()).get_one(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(999)));
    }

    #[tokio::test]
    async fn test_get_one_surfaces_bad_date() {
        let db = Database::open_in_memory().await.unwrap();
        insert_raw(db.connection(), "Broken", "yesterday").await;

        let books = Books::new(db.connection());
        let mut rows = db
            .connection()
            .query("SELECT id FROM books WHERE title = 'Broken'", ())
            .await
            .unwrap();
        let id: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();

        let err = books.get_one(id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidDate { ref value, .. } if value == "yesterday"));
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());
        books.create(dune()).await.unwrap();
        let id = books.get_all().await.unwrap()[0].id;

        let changed = Book {
            id,
            title: "Dune Messiah".to_string(),
            author: "Frank Herbert".to_string(),
            published_date: NaiveDate::from_ymd_opt(1969, 10, 15).unwrap(),
        };
        books.update(changed.clone()).await.unwrap();

        assert_eq!(books.get_one(id).await.unwrap(), changed);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_a_no_op() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());
        books.create(dune()).await.unwrap();
        let before = books.get_all().await.unwrap();

        books.update(dune().with_id(4242)).await.unwrap();

        assert_eq!(books.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());
        books.create(dune()).await.unwrap();
        let id = books.get_all().await.unwrap()[0].id;

        books.delete(id).await.unwrap();

        assert!(books.get_all().await.unwrap().is_empty());
        assert!(matches!(books.get_one(id).await, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_a_no_op() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());
        books.create(dune()).await.unwrap();
        let before = books.get_all().await.unwrap();

        books.delete(4242).await.unwrap();

        assert_eq!(books.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_ids_are_assigned_by_the_store() {
        let db = Database::open_in_memory().await.unwrap();
        let books = Books::new(db.connection());
        books.create(dune()).await.unwrap();
        books.create(dune()).await.unwrap();

        let mut ids: Vec<i64> = books.get_all().await.unwrap().iter().map(|b| b.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| *id > 0));
    }

    #[tokio::test]
    async fn test_store_errors_are_propagated() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection().execute("DROP TABLE books", ()).await.unwrap();
        let books = Books::new(db.connection());

        assert!(matches!(books.create(dune()).await, Err(DbError::Store(_))));
        assert!(matches!(books.get_all().await, Err(DbError::Store(_))));
    }

    #[tokio::test]
    async fn test_local_database_is_not_a_replica() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::from_yaml("app:\n  database: books.db\n  port: 8080\n").unwrap();

        let db = Database::new(&cfg, dir.path()).await.unwrap();
        assert!(!db.is_replica());
        db.sync().await.unwrap();
        assert!(dir.path().join("books.db").exists());
    }
}
