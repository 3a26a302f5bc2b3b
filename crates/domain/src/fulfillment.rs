//! Fulfillment of pending requests against shared inventory.
//!
//! ```text
//! fulfill(request, staff)
//!   ├─ staff exists?            no ─► NotFound(Staff)
//!   ├─ request exists?          no ─► NotFound(Request)
//!   ├─ request Pending?         no ─► AlreadyFulfilled / InvalidState
//!   └─ transaction
//!        ├─ lock request, re-check Pending
//!        ├─ debit(need, quantity)   short ─► InsufficientStock (rollback)
//!        ├─ Pending ─► Fulfilled
//!        └─ commit
//! ```
//!
//! The debit and the status transition share one transaction, so a request
//! is `Fulfilled` exactly when its quantity left the ledger.

use std::time::Instant;

use catalog::{CatalogStore, CatalogTx, Request, RequestStatus};
use chrono::Utc;
use common::{RequestId, StaffId};

use crate::error::DomainError;

/// Maps a non-pending status to the error reported for it.
fn ensure_pending(request: &Request) -> Result<(), DomainError> {
    match request.status {
        RequestStatus::Pending => Ok(()),
        RequestStatus::Fulfilled => Err(DomainError::AlreadyFulfilled(request.id)),
        status => Err(DomainError::InvalidState {
            request_id: request.id,
            status,
        }),
    }
}

pub struct FulfillmentEngine<S: CatalogStore> {
    store: S,
}

impl<S: CatalogStore> FulfillmentEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fulfills a pending request on behalf of a staff member and returns the
    /// updated request.
    ///
    /// Calling this again for the same request fails with
    /// [`DomainError::AlreadyFulfilled`] and never debits twice, so a caller
    /// may retry blindly after a [`DomainError::TransientStore`].
    #[tracing::instrument(skip(self))]
    pub async fn fulfill(
        &self,
        request_id: RequestId,
        staff_id: StaffId,
    ) -> Result<Request, DomainError> {
        let start = Instant::now();
        let result = self.try_fulfill(request_id, staff_id).await;
        metrics::histogram!("fulfillment_duration_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(request) => {
                metrics::counter!("fulfillments_total").increment(1);
                tracing::info!(
                    need = %request.need,
                    quantity = request.quantity,
                    "request fulfilled"
                );
            }
            Err(err) => {
                metrics::counter!("fulfillments_rejected_total", "reason" => err.kind())
                    .increment(1);
                tracing::warn!(reason = err.kind(), "fulfillment rejected");
            }
        }
        result
    }

    async fn try_fulfill(
        &self,
        request_id: RequestId,
        staff_id: StaffId,
    ) -> Result<Request, DomainError> {
        if self.store.get_staff(staff_id).await?.is_none() {
            return Err(DomainError::not_found("Staff", staff_id));
        }
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Request", request_id))?;
        ensure_pending(&request)?;

        let mut tx = self.store.begin().await?;

        // Another fulfillment may have committed since the read above.
        let locked = tx
            .lock_request(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Request", request_id))?;
        ensure_pending(&locked)?;

        tx.debit(&locked.need, locked.quantity).await?;

        let fulfilled = tx
            .mark_fulfilled(request_id, staff_id, Utc::now())
            .await?
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "request {request_id} was locked as Pending but its status update matched no row"
                ))
            })?;

        tx.commit().await?;
        Ok(fulfilled)
    }
}
