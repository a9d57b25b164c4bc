//! Persistence layer.
//!
//! Grounded on the teacher's `auth/user_store.rs`, which opens a `rusqlite`
//! connection per call against a shared sqlite file. Here the connection is
//! long-lived and guarded by a `parking_lot::Mutex` (sqlite only serves one
//! writer at a time regardless, so a single shared connection is not an
//! additional bottleneck); every call runs on a blocking-pool thread via
//! `tokio::task::spawn_blocking` so handlers never block the async
//! executor on DB I/O, per the suspension-point rule in the concurrency
//! model.

pub mod competitions;
pub mod prices;
pub mod schema;
pub mod snapshots;
pub mod teams;
pub mod trades;

use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::init(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run a closure against the connection on a blocking-pool thread.
    pub async fn call<T, F>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .expect("database task panicked")
    }

    /// Run a closure inside a transaction on a blocking-pool thread. The
    /// closure receives a `rusqlite::Transaction`; returning `Err` rolls
    /// back, returning `Ok` commits.
    pub async fn transaction<T, F>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            let tx = guard.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;
            Ok(result)
        })
        .await
        .expect("database task panicked")
    }
}
