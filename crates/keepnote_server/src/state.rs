//! Shared application state.
//!
//! One `rusqlite::Connection` behind a mutex. Core calls run on the
//! blocking pool while holding it; writers from other processes are
//! serialized by the core's `BEGIN IMMEDIATE` transactions.

use crate::error::ApiError;
use keepnote_core::ServiceError;
use log::error;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a connection returned by `keepnote_core::db::open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` against the connection on the blocking thread pool.
    pub async fn with_db<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ServiceError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().map_err(|_| {
                error!("event=db_lock module=server status=error error_code=poisoned");
                ApiError::Internal("poisoned connection lock".to_string())
            })?;
            op(&mut *conn).map_err(ApiError::from)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => {
                error!("event=db_task module=server status=error error_code=join_failed error={err}");
                Err(ApiError::Internal("blocking task failed".to_string()))
            }
        }
    }
}
