pub mod attendance;
pub mod certificate;
pub mod individual;
pub mod migration;
pub mod overall;
pub mod result;

use crate::conf::Conf;
use crate::Result;
use deadpool_sqlite::{Config, Hook, Pool, Runtime};

pub fn pool(conf: &Conf) -> Result<Pool> {
    let pool_size = std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(8);
    let pool = Config::new(conf.db_path.clone())
        .builder(Runtime::Tokio1)?
        .max_size(pool_size)
        .post_create(Hook::Fn(Box::new(|conn, _| {
            let conn = conn.lock().unwrap();
            conn.pragma_update(None, "journal_mode", "WAL").unwrap();
            conn.pragma_update(None, "synchronous", "NORMAL").unwrap();
            conn.pragma_update(None, "foreign_keys", "ON").unwrap();
            Ok(())
        })))
        .build()?;
    Ok(pool)
}

/// True when an INSERT/UPDATE hit a UNIQUE constraint. Duplicate natural
/// keys are enforced by the store, not by check-then-act reads.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
