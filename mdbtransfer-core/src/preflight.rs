//! Destination reachability check run before any table work.

use crate::destination::Destination;
use crate::error::TransferError;
use serde::Serialize;

/// Outcome of the connectivity preflight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    /// True when a query round trip succeeded
    pub ok: bool,
    /// Server version on success, diagnostic otherwise
    pub message: String,
}

impl PreflightReport {
    /// Converts a failed report into the fatal run error.
    ///
    /// # Errors
    /// Returns [`TransferError::Preflight`] when `ok` is false
    pub fn into_result(self) -> crate::Result<String> {
        if self.ok {
            Ok(self.message)
        } else {
            Err(TransferError::Preflight {
                message: self.message,
            })
        }
    }
}

/// Opens a connection and runs a trivial query. No retries.
pub async fn check_destination(destination: &dyn Destination) -> PreflightReport {
    match destination.check_connectivity().await {
        Ok(version) => {
            tracing::info!("Destination reachable: {}", version);
            PreflightReport {
                ok: true,
                message: version,
            }
        }
        Err(e) => {
            let message = e.detailed_message();
            tracing::error!("Destination unreachable: {}", message);
            PreflightReport { ok: false, message }
        }
    }
}
