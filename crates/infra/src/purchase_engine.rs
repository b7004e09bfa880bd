//! Purchase transaction engine.
//!
//! Sells slices against the shared inventory store under optimistic
//! concurrency control. There is no in-process lock: every coordination
//! decision is made by the store's conditional commit.
//!
//! ## Execution flow
//!
//! ```text
//! purchase(pie, form)
//!   ↓
//! 1. Catalog lookup (NotFound)
//!   ↓
//! 2. Validate form, per-request quota, price (no store access)
//!   ↓
//! 3. Up to MAX_PURCHASE_ATTEMPTS times:
//!      watch keys → read remaining / purchased → plan_purchase
//!        rejected  → unwatch, return (never retried)
//!        empty     → unwatch, return receipt (zero slices)
//!        planned   → commit batch
//!          Committed → return receipt
//!          Conflict  → next attempt
//!      store error → remember, next attempt
//!        (a connection error also drops the connection;
//!         the next attempt checks out a fresh one)
//!   ↓
//! 4. Exhausted: last store error, or PurchaseFailed
//! ```
//!
//! Attempts follow each other immediately.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use piestand_core::{Cents, PieId, Username};
use piestand_inventory::{
    PurchaseForm, PurchasePlan, PurchaseRejection, PurchaseRequest, StockSnapshot, check_price,
    check_request_size, plan_purchase,
};

use crate::catalog::Catalog;
use crate::store::keys::{self, PurchaseKeys};
use crate::store::{CommitOutcome, InventoryStore, StoreConnection, StoreError, WriteBatch};

/// Upper bound on optimistic attempts per purchase.
pub const MAX_PURCHASE_ATTEMPTS: usize = 5;

/// Why a purchase did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("pie not found")]
    NotFound,

    #[error("invalid purchase request: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Gluttony is discouraged.")]
    Gluttony,

    #[error("You did math wrong.")]
    PriceMismatch { expected: Cents, claimed: Cents },

    #[error("{0}")]
    Gone(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not perform purchase")]
    PurchaseFailed,
}

impl From<PurchaseRejection> for PurchaseError {
    fn from(value: PurchaseRejection) -> Self {
        match value {
            PurchaseRejection::Gluttony => PurchaseError::Gluttony,
            PurchaseRejection::PriceMismatch { expected, claimed } => {
                PurchaseError::PriceMismatch { expected, claimed }
            }
            gone @ (PurchaseRejection::SoldOut | PurchaseRejection::NotEnoughSlices { .. }) => {
                PurchaseError::Gone(gone.to_string())
            }
        }
    }
}

/// A committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub pie_id: PieId,
    pub username: Username,
    pub slices: u32,
    /// Remaining slices of the pie right after this purchase.
    pub remaining_slices: i64,
    /// Total slices of the pie this buyer now owns.
    pub purchased_slices: i64,
    /// Attempt number that committed (1-based).
    pub attempts: usize,
}

enum AttemptError {
    Rejected(PurchaseRejection),
    Store(StoreError),
}

impl From<StoreError> for AttemptError {
    fn from(value: StoreError) -> Self {
        AttemptError::Store(value)
    }
}

enum AttemptOutcome {
    Committed(PurchasePlan),
    Conflict,
}

/// Purchase engine over any inventory store.
///
/// Cheap to share: clone the store handle (typically an `Arc`) and the catalog.
#[derive(Debug, Clone)]
pub struct PurchaseEngine<S> {
    store: S,
    catalog: Arc<Catalog>,
}

impl<S> PurchaseEngine<S> {
    pub fn new(store: S, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> PurchaseEngine<S>
where
    S: InventoryStore,
{
    /// Buy slices of a pie.
    ///
    /// Validation, quota and price failures are detected before the store is
    /// touched and returned as-is. Only commit conflicts and store errors are
    /// retried, for at most `MAX_PURCHASE_ATTEMPTS` attempts in total.
    #[instrument(skip(self, form), fields(pie_id = %pie_id))]
    pub fn purchase(&self, pie_id: PieId, form: &PurchaseForm) -> Result<PurchaseReceipt, PurchaseError> {
        let pie = self.catalog.get(pie_id).ok_or(PurchaseError::NotFound)?;
        let request = form.validate().map_err(PurchaseError::Validation)?;

        if let Err(rejection) = check_request_size(request.slices) {
            debug!(wanted = request.slices, "gluttony");
            return Err(rejection.into());
        }

        if let Err(rejection) = check_price(pie.price_per_slice, request.slices, request.claimed_amount) {
            debug!(
                amount = %request.claimed_amount,
                price_per_slice = %pie.price_per_slice,
                wanted = request.slices,
                "wrong math"
            );
            return Err(rejection.into());
        }

        let keys = PurchaseKeys::new(pie_id, &request.username);
        let mut idle: Option<S::Connection> = None;
        let mut last_store_error: Option<StoreError> = None;

        // TODO: add jittered backoff between attempts once contention on hot pies is measured.
        for attempt in 1..=MAX_PURCHASE_ATTEMPTS {
            let mut conn = match idle.take() {
                Some(conn) => conn,
                None => match self.store.connection() {
                    Ok(conn) => conn,
                    Err(err) if !err.is_transient() => return Err(err.into()),
                    Err(err) => {
                        warn!(attempt, error = %err, "could not acquire store connection");
                        last_store_error = Some(err);
                        continue;
                    }
                },
            };

            match attempt_purchase(&mut conn, pie_id, &keys, &request) {
                Ok(AttemptOutcome::Committed(plan)) => {
                    debug!(
                        user = %request.username,
                        wanted = plan.slices,
                        remaining = plan.remaining_after + i64::from(plan.slices),
                        new_remaining = plan.remaining_after,
                        attempt,
                        "purchase committed"
                    );
                    return Ok(PurchaseReceipt {
                        pie_id,
                        username: request.username,
                        slices: plan.slices,
                        remaining_slices: plan.remaining_after,
                        purchased_slices: plan.purchased_after,
                        attempts: attempt,
                    });
                }
                Ok(AttemptOutcome::Conflict) => {
                    debug!(attempt, "watched inventory changed; retrying purchase");
                }
                Err(AttemptError::Rejected(rejection)) => {
                    debug!(attempt, reason = %rejection, "purchase rejected");
                    return Err(rejection.into());
                }
                Err(AttemptError::Store(err)) if !err.is_transient() => {
                    warn!(attempt, error = %err, "unreadable inventory value");
                    return Err(err.into());
                }
                Err(AttemptError::Store(err @ StoreError::Connection(_))) => {
                    // The socket is suspect: drop it and check out a fresh one.
                    warn!(attempt, error = %err, "store connection lost during purchase attempt");
                    last_store_error = Some(err);
                    continue;
                }
                Err(AttemptError::Store(err)) => {
                    warn!(attempt, error = %err, "store error during purchase attempt");
                    if let Err(unwatch_err) = conn.unwatch() {
                        debug!(error = %unwatch_err, "unwatch after store error failed");
                    }
                    last_store_error = Some(err);
                }
            }

            idle = Some(conn);
        }

        match last_store_error {
            Some(err) => Err(PurchaseError::Store(err)),
            None => Err(PurchaseError::PurchaseFailed),
        }
    }
}

/// One optimistic attempt: watch, read, decide, commit.
fn attempt_purchase<C: StoreConnection>(
    conn: &mut C,
    pie_id: PieId,
    keys: &PurchaseKeys,
    request: &PurchaseRequest,
) -> Result<AttemptOutcome, AttemptError> {
    conn.watch(&keys.watched())?;

    let snapshot = StockSnapshot {
        remaining: conn.get_int(&keys.slices)?.unwrap_or(0),
        purchased: conn.get_int(&keys.purchase)?.unwrap_or(0),
    };

    let plan = match plan_purchase(snapshot, request.slices) {
        Ok(plan) => plan,
        Err(rejection) => {
            conn.unwatch()?;
            return Err(AttemptError::Rejected(rejection));
        }
    };

    if plan.is_empty() {
        // Nothing to write: release the watch and report the current stock.
        conn.unwatch()?;
        return Ok(AttemptOutcome::Committed(plan));
    }

    let batch = purchase_batch(pie_id, keys, request.username.as_str(), &plan);
    match conn.commit(batch)? {
        CommitOutcome::Committed => Ok(AttemptOutcome::Committed(plan)),
        CommitOutcome::Conflict => Ok(AttemptOutcome::Conflict),
    }
}

/// The all-or-nothing writes for a planned purchase.
///
/// The availability removal is queued before the per-user difference so the
/// cached available set never contains a pie this batch just sold out.
fn purchase_batch(pie_id: PieId, keys: &PurchaseKeys, username: &str, plan: &PurchasePlan) -> WriteBatch {
    let slices = i64::from(plan.slices);
    let member = pie_id.to_string();

    let mut batch = WriteBatch::new();
    batch
        .decr_by(keys.slices.clone(), slices)
        .incr_by(keys.purchase.clone(), slices)
        .set_add(keys.purchasers.clone(), username);

    if plan.sells_out {
        batch.set_remove(keys::PIES_AVAILABLE, member.clone());
    }

    if plan.reaches_quota {
        batch
            .set_add(keys.user_unavailable.clone(), member)
            .diff_store(
                keys.user_available.clone(),
                keys::PIES_AVAILABLE,
                keys.user_unavailable.clone(),
            );
    }

    batch
}
