use std::ops::{Deref, DerefMut};
use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::{PgConnection, PgPool, Transaction};
use tracing::debug;

use crate::config::DbConfig;
use crate::error::ApiError;

/// Pool sizing follows the settings directly: `pool_size` handles are kept
/// warm, bursts may open up to `pool_size + max_overflow`, and idle handles
/// above the floor are closed again by the pool's reaper. Handles older than
/// the recycle interval are replaced, and every pooled handle is
/// liveness-probed before reuse, so a server-side disconnect after failover
/// never reaches a caller.
fn pool_options(cfg: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(cfg.pool_size)
        .max_connections(cfg.pool_size + cfg.max_overflow)
        .acquire_timeout(Duration::from_secs(cfg.pool_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.pool_recycle_secs))
        .test_before_acquire(true)
}

pub async fn connect(cfg: &DbConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(cfg).connect(&cfg.url()).await
}

/// Trivial round-trip used for the startup check and `/health/db`.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// One unit-of-work scope, bound to a single request.
///
/// Wraps a transaction on a handle checked out of the pool. Writes become
/// durable only on [`Session::commit`]; every other exit path (early return,
/// error, cancelled request future) rolls back in `Drop` and returns the
/// handle to the pool, so release happens exactly once without any caller
/// discipline.
pub struct Session {
    tx: Transaction<'static, Postgres>,
}

impl Session {
    pub async fn begin(pool: &PgPool) -> Result<Self, ApiError> {
        let tx = pool.begin().await?;
        debug!("session opened");
        Ok(Self { tx })
    }

    /// Consume the scope, making all staged writes durable as one unit.
    pub async fn commit(self) -> Result<(), ApiError> {
        self.tx.commit().await?;
        debug!("session committed");
        Ok(())
    }
}

impl Deref for Session {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.tx
    }
}
