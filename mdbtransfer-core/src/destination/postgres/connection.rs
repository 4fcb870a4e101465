//! PostgreSQL pool construction.
//!
//! Every new connection gets a statement timeout, an application name and
//! UTC as its session time zone, so timestamps are stored as exported.

use crate::config::DestinationConfig;
use crate::error::TransferError;
use crate::Result;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Builds a lazily connecting pool for the destination.
///
/// The URL is handed to the driver as is.
///
/// # Errors
/// Returns a connection error if the driver cannot parse the URL
pub(crate) fn create_pool(config: &DestinationConfig) -> Result<PgPool> {
    use sqlx::Executor;

    let statement_timeout_secs = config.statement_timeout.as_secs().max(1);

    PgPoolOptions::new()
        .max_connections(config.max_connections.min(100))
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                conn.execute(
                    format!("SET statement_timeout = '{}s'", statement_timeout_secs).as_str(),
                )
                .await?;

                let app_name = format!("mdbtransfer-{}", env!("CARGO_PKG_VERSION"));
                conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                    .await?;

                conn.execute("SET timezone = 'UTC'").await?;

                Ok(())
            })
        })
        .connect_lazy(config.url())
        .map_err(|e| {
            tracing::error!(
                "Failed to configure destination pool for {}",
                config.redacted_url()
            );
            TransferError::connection_failed(e)
        })
}
