//! Read-only inventory views.
//!
//! Join the immutable catalog with the live counters for listing pages.
//! Views never watch or write, so a view may observe a purchase half way
//! through another request's retries but never a partially applied batch.

use serde::Serialize;
use thiserror::Error;

use piestand_core::PieId;
use piestand_inventory::Pie;

use crate::catalog::Catalog;
use crate::store::keys;
use crate::store::{StoreConnection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("pie not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSummary {
    #[serde(flatten)]
    pub pie: Pie,
    pub remaining_slices: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLine {
    pub username: String,
    pub slices: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieDetails {
    #[serde(flatten)]
    pub pie: Pie,
    pub remaining_slices: i64,
    /// One line per purchaser, ordered by username.
    pub purchases: Vec<PurchaseLine>,
}

/// Every catalog pie with its remaining slices, in catalog order.
pub fn list_pies<C: StoreConnection>(conn: &mut C, catalog: &Catalog) -> Result<Vec<PieSummary>, ViewError> {
    let mut listing = Vec::with_capacity(catalog.len());
    for pie in catalog.pies() {
        listing.push(PieSummary {
            pie: pie.clone(),
            remaining_slices: conn.get_int(&keys::pie_slices(pie.id))?.unwrap_or(0),
        });
    }
    Ok(listing)
}

pub fn pie_details<C: StoreConnection>(
    conn: &mut C,
    catalog: &Catalog,
    id: PieId,
) -> Result<PieDetails, ViewError> {
    let pie = catalog.get(id).ok_or(ViewError::NotFound)?;
    let remaining_slices = conn.get_int(&keys::pie_slices(id))?.unwrap_or(0);

    let mut purchasers = conn.members(&keys::pie_purchasers(id))?;
    purchasers.sort();

    let mut purchases = Vec::with_capacity(purchasers.len());
    for username in purchasers {
        let slices = conn.get_int(&keys::purchase(id, &username))?.unwrap_or(0);
        purchases.push(PurchaseLine { username, slices });
    }

    Ok(PieDetails {
        pie: pie.clone(),
        remaining_slices,
        purchases,
    })
}
