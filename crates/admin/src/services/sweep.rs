//! Status-refresh sweep: re-check carrier status for undelivered orders and
//! finalize costs on delivery.
//!
//! Single-flight is owned by the service, not hidden module state: callers
//! can observe [`StatusSweep::is_in_progress`] and a second concurrent run
//! is rejected explicitly.

use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use parceldesk_core::OrderStatus;

use crate::db::{self, OrderRepository, RepositoryError};
use crate::models::order::SweepReport;
use crate::services::allocation::AllocationService;
use crate::services::carrier::{TrackingClient, TrackingStatus};

/// Errors from the status-refresh sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Another sweep is still running.
    #[error("a status sweep is already in progress")]
    AlreadyRunning,

    /// Loading the order list failed. Per-order failures never surface here;
    /// they are aggregated into the report.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Sweeps undelivered orders against the carrier tracking API.
pub struct StatusSweep {
    pool: PgPool,
    in_progress: AtomicBool,
}

impl StatusSweep {
    /// Create a new sweep service.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Whether a sweep is currently running.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Run one sweep. Carrier lookups happen outside any transaction; each
    /// order's status transition (and cost finalization) is its own
    /// transaction, so one failing order never disturbs the others.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::AlreadyRunning` when a sweep is in flight, or
    /// `SweepError::Repository` if the order list cannot be loaded.
    pub async fn run(&self, tracking: &dyn TrackingClient) -> Result<SweepReport, SweepError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SweepError::AlreadyRunning);
        }

        let result = self.run_inner(tracking).await;
        self.in_progress.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, tracking: &dyn TrackingClient) -> Result<SweepReport, SweepError> {
        let orders = OrderRepository::new(&self.pool)
            .list_undelivered_with_tracking()
            .await?;

        let mut report = SweepReport::default();
        let allocation = AllocationService::new(&self.pool);

        for order in orders {
            let Some(tracking_number) = order.tracking_number.as_deref() else {
                continue;
            };
            report.checked += 1;

            let status = match tracking.fetch_status(tracking_number).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "Carrier lookup failed");
                    report.failed += 1;
                    continue;
                }
            };

            match status {
                TrackingStatus::Delivered => match allocation.mark_delivered(order.id).await {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        warn!(order_id = %order.id, error = %e, "Delivered transition failed");
                        report.failed += 1;
                    }
                },
                TrackingStatus::InTransit if order.status == OrderStatus::Pending => {
                    match self.mark_shipped(order.id).await {
                        Ok(()) => report.updated += 1,
                        Err(e) => {
                            warn!(order_id = %order.id, error = %e, "Shipped transition failed");
                            report.failed += 1;
                        }
                    }
                }
                TrackingStatus::Pending | TrackingStatus::InTransit | TrackingStatus::Unknown => {}
            }
        }

        info!(
            checked = report.checked,
            updated = report.updated,
            failed = report.failed,
            "Status sweep complete"
        );
        Ok(report)
    }

    async fn mark_shipped(&self, order_id: parceldesk_core::OrderId) -> Result<(), SweepError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;
        db::orders::set_status(&mut tx, order_id, OrderStatus::Shipped).await?;
        tx.commit().await.map_err(RepositoryError::Database)?;
        Ok(())
    }
}
