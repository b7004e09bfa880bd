//! Pie inventory domain module.
//!
//! This crate contains the business rules for selling pie slices, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage): the
//! catalog model, purchase request validation, the per-attempt purchase
//! decision, and budget ordering for recommendations.

pub mod pie;
pub mod purchase;
pub mod recommend;

pub use pie::{Pie, SLICE_QUOTA};
pub use purchase::{
    NOT_ENOUGH_MESSAGE, PurchaseForm, PurchasePlan, PurchaseRejection, PurchaseRequest,
    SOLD_OUT_MESSAGE, StockSnapshot, check_price, check_request_size, plan_purchase,
};
pub use recommend::{Budget, pick_recommendation};
