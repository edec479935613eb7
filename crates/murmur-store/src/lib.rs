//! Murmur Storage Layer
//!
//! Implements every store trait of murmur-domain on top of SQLite.
//!
//! # Architecture
//!
//! - One table per entity, plus `follows` and `likes` edge tables keyed by the
//!   pair itself, so a duplicate edge cannot exist at any isolation level
//! - Edge writes use `INSERT ... ON CONFLICT DO NOTHING`; the affected-row
//!   count tells created from already-present
//! - A like and its notification are written in one `IMMEDIATE` transaction
//!
//! # Examples
//!
//! ```no_run
//! use murmur_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

mod content;
mod graph;

use murmur_domain::traits::Storage;
use murmur_domain::{
    Comment, CommentId, Notification, NotificationId, PageRequest, Post, PostId, User, UserId,
};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How long a connection waits for another writer before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row the operation depends on does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of the Murmur store traits
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance; several instances may share one database file, and
/// the schema's uniqueness constraints keep concurrent writers consistent.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialize the schema
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use murmur_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("murmur.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // In-memory databases answer "memory" here; that is fine.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "opened sqlite database");

        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Grant or revoke staff privileges
    ///
    /// There is no HTTP route for this; it is an operator action.
    pub fn set_staff(&mut self, user: UserId, is_staff: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE users SET is_staff = ?2 WHERE id = ?1",
            rusqlite::params![id_to_bytes(user.value()), is_staff],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {}", user)));
        }
        Ok(())
    }

    /// Total number of notifications, across all recipients
    pub fn notification_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Total number of like edges, across all posts
    pub fn like_edge_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStore {
    type Error = StoreError;
}

/// Convert an id value to bytes for storage
pub(crate) fn id_to_bytes(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Convert stored bytes back to an id value
pub(crate) fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
    if bytes.len() != 16 {
        return Err(StoreError::InvalidData(format!(
            "Expected 16 bytes for an id, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 16];
    arr.copy_from_slice(bytes);
    Ok(u128::from_be_bytes(arr))
}

/// Read an id column inside a row mapper
pub(crate) fn read_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<u128> {
    let bytes: Vec<u8> = row.get(idx)?;
    bytes_to_id(&bytes).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Blob, Box::new(e))
    })
}

/// Read a nullable id column inside a row mapper
pub(crate) fn read_optional_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<u128>> {
    let bytes: Option<Vec<u8>> = row.get(idx)?;
    bytes
        .map(|b| {
            bytes_to_id(&b).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Blob,
                    Box::new(e),
                )
            })
        })
        .transpose()
}

/// `LIMIT` and `OFFSET` values for `page`
///
/// `None` when the offset does not fit SQLite's signed 64-bit integers. No
/// row can lie that far in, so callers answer with an empty page.
pub(crate) fn sql_window(page: PageRequest) -> Option<(i64, i64)> {
    let limit = i64::try_from(page.page_size).ok()?;
    let offset = i64::try_from(page.offset()?).ok()?;
    Some((limit, offset))
}

/// Column list matching [`user_from_row`]
pub(crate) const USER_COLUMNS: &str = "u.id, u.username, u.email, u.bio, u.is_staff, u.created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::from_value(read_id(row, 0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        bio: row.get(3)?,
        is_staff: row.get(4)?,
        created_at: row.get::<_, i64>(5)? as u64,
    })
}

/// Column list matching [`post_from_row`]
pub(crate) const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.content, p.created_at, p.updated_at";

pub(crate) fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: PostId::from_value(read_id(row, 0)?),
        author: UserId::from_value(read_id(row, 1)?),
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get::<_, i64>(4)? as u64,
        updated_at: row.get::<_, i64>(5)? as u64,
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId::from_value(read_id(row, 0)?),
        post: PostId::from_value(read_id(row, 1)?),
        author: UserId::from_value(read_id(row, 2)?),
        content: row.get(3)?,
        created_at: row.get::<_, i64>(4)? as u64,
        updated_at: row.get::<_, i64>(5)? as u64,
    })
}

pub(crate) fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: NotificationId::from_value(read_id(row, 0)?),
        recipient: UserId::from_value(read_id(row, 1)?),
        actor: UserId::from_value(read_id(row, 2)?),
        verb: row.get(3)?,
        target: read_optional_id(row, 4)?.map(PostId::from_value),
        created_at: row.get::<_, i64>(5)? as u64,
    })
}
