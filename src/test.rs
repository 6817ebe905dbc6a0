use crate::db::migration;
use deadpool_sqlite::{Config, Hook, Pool, Runtime};
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn mock_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    migration::run(&mut conn).unwrap();
    conn
}

static MEM_DB_COUNTER: AtomicUsize = AtomicUsize::new(1);

/// Shared-cache in-memory databases live as long as one connection stays
/// open, so the migrating connection is kept around next to the pool.
pub struct MockState {
    pub pool: Pool,
    #[allow(dead_code)]
    pub conn: Connection,
}

pub fn mock_state() -> MockState {
    let uri = format!(
        "file::testdb_{}:?mode=memory&cache=shared",
        MEM_DB_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let mut conn = Connection::open(&uri).unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    migration::run(&mut conn).unwrap();
    let pool = Config::new(uri)
        .builder(Runtime::Tokio1)
        .unwrap()
        .post_create(Hook::Fn(Box::new(|conn, _| {
            conn.lock()
                .unwrap()
                .pragma_update(None, "foreign_keys", "ON")
                .unwrap();
            Ok(())
        })))
        .build()
        .unwrap();
    MockState { pool, conn }
}
