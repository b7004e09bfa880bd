//! Purchase rules: request validation, price check, and the per-attempt
//! decision taken against a fresh stock snapshot.
//!
//! Everything here is pure. The transaction engine reads a `StockSnapshot`
//! inside its optimistic window, asks `plan_purchase` what to write, and turns
//! the resulting `PurchasePlan` into one atomic store batch.

use serde::Deserialize;
use thiserror::Error;

use piestand_core::{Cents, Username};

use crate::pie::SLICE_QUOTA;

/// Message returned when a pie has no slices left at all.
pub const SOLD_OUT_MESSAGE: &str = "No more of that pie. Try something else.";

/// Message returned when a pie has some, but too few, slices left.
pub const NOT_ENOUGH_MESSAGE: &str = "not enough remaining slices";

/// Raw purchase input as supplied by the caller (e.g. query parameters).
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PurchaseForm {
    pub username: Option<String>,
    pub amount: Option<String>,
    pub slices: Option<String>,
}

/// A validated purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub username: Username,
    pub claimed_amount: Cents,
    pub slices: u32,
}

impl PurchaseForm {
    pub fn new(
        username: impl Into<String>,
        amount: impl Into<String>,
        slices: Option<&str>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            amount: Some(amount.into()),
            slices: slices.map(str::to_string),
        }
    }

    /// Validate every field, reporting all failures together.
    pub fn validate(&self) -> Result<PurchaseRequest, Vec<String>> {
        let mut errors = Vec::new();

        let username = match non_empty(&self.username) {
            Some(name) => Username::parse(name).map_err(|e| errors.push(e.to_string())).ok(),
            None => {
                errors.push("missing username".to_string());
                None
            }
        };

        let claimed_amount = match non_empty(&self.amount) {
            Some(amount) => match Cents::parse_decimal(amount) {
                Ok(cents) => Some(cents),
                Err(_) => {
                    errors.push("amount is not a decimal".to_string());
                    None
                }
            },
            None => {
                errors.push("missing amount".to_string());
                None
            }
        };

        let slices = match non_empty(&self.slices) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push("slices is not a non-negative integer".to_string());
                    None
                }
            },
            None => Some(1),
        };

        match (username, claimed_amount, slices) {
            (Some(username), Some(claimed_amount), Some(slices)) if errors.is_empty() => {
                Ok(PurchaseRequest {
                    username,
                    claimed_amount,
                    slices,
                })
            }
            _ => Err(errors),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Business-rule rejection of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseRejection {
    /// The request alone, or together with earlier purchases, exceeds the quota.
    #[error("Gluttony is discouraged.")]
    Gluttony,

    #[error("You did math wrong.")]
    PriceMismatch { expected: Cents, claimed: Cents },

    #[error("{}", SOLD_OUT_MESSAGE)]
    SoldOut,

    #[error("{}", NOT_ENOUGH_MESSAGE)]
    NotEnoughSlices { remaining: i64, requested: u32 },
}

/// Flat per-request quota check (before touching the store).
pub fn check_request_size(slices: u32) -> Result<(), PurchaseRejection> {
    if slices > SLICE_QUOTA {
        return Err(PurchaseRejection::Gluttony);
    }
    Ok(())
}

/// Compare the computed price with the claimed amount, in whole cents.
pub fn check_price(
    price_per_slice: Cents,
    slices: u32,
    claimed_amount: Cents,
) -> Result<(), PurchaseRejection> {
    let expected = price_per_slice
        .checked_mul(slices)
        .ok_or(PurchaseRejection::PriceMismatch {
            expected: Cents::ZERO,
            claimed: claimed_amount,
        })?;

    if expected != claimed_amount {
        return Err(PurchaseRejection::PriceMismatch {
            expected,
            claimed: claimed_amount,
        });
    }
    Ok(())
}

/// Stock state read inside one optimistic attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockSnapshot {
    /// Remaining slices of the pie.
    pub remaining: i64,
    /// Slices of the pie the buyer already owns (0 when never purchased).
    pub purchased: i64,
}

/// What a successful attempt writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PurchasePlan {
    pub slices: u32,
    pub remaining_after: i64,
    pub purchased_after: i64,
    /// The pie leaves the global availability set.
    pub sells_out: bool,
    /// The buyer reaches the quota on this pie.
    pub reaches_quota: bool,
}

/// Decide a purchase attempt against a snapshot.
///
/// The quota is checked before stock, so a buyer at the quota is told about
/// gluttony even when the pie is also gone.
pub fn plan_purchase(
    snapshot: StockSnapshot,
    requested: u32,
) -> Result<PurchasePlan, PurchaseRejection> {
    let requested_slices = i64::from(requested);
    let quota = i64::from(SLICE_QUOTA);

    if snapshot.purchased + requested_slices > quota {
        return Err(PurchaseRejection::Gluttony);
    }

    if snapshot.remaining <= 0 {
        return Err(PurchaseRejection::SoldOut);
    }
    if snapshot.remaining < requested_slices {
        return Err(PurchaseRejection::NotEnoughSlices {
            remaining: snapshot.remaining,
            requested,
        });
    }

    let remaining_after = snapshot.remaining - requested_slices;
    let purchased_after = snapshot.purchased + requested_slices;
    let buys = requested > 0;

    Ok(PurchasePlan {
        slices: requested,
        remaining_after,
        purchased_after,
        sells_out: buys && remaining_after == 0,
        reaches_quota: buys && purchased_after == quota,
    })
}

impl PurchasePlan {
    /// A zero-slice plan writes nothing.
    pub fn is_empty(&self) -> bool {
        self.slices == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(remaining: i64, purchased: i64) -> StockSnapshot {
        StockSnapshot {
            remaining,
            purchased,
        }
    }

    #[test]
    fn slices_default_to_one() {
        let req = PurchaseForm::new("alice", "1.25", None).validate().unwrap();
        assert_eq!(req.slices, 1);
        assert_eq!(req.claimed_amount, Cents::new(125));

        let req = PurchaseForm::new("alice", "1.25", Some("")).validate().unwrap();
        assert_eq!(req.slices, 1);
    }

    #[test]
    fn validation_reports_every_failing_field() {
        let form = PurchaseForm {
            username: None,
            amount: Some("lots".to_string()),
            slices: Some("two".to_string()),
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "missing username".to_string(),
                "amount is not a decimal".to_string(),
                "slices is not a non-negative integer".to_string(),
            ]
        );
    }

    #[test]
    fn validation_reports_missing_fields_together() {
        let errors = PurchaseForm::default().validate().unwrap_err();
        assert_eq!(errors, vec!["missing username", "missing amount"]);
    }

    #[test]
    fn negative_slices_are_invalid() {
        let errors = PurchaseForm::new("bob", "1.00", Some("-1")).validate().unwrap_err();
        assert_eq!(errors, vec!["slices is not a non-negative integer"]);
    }

    #[test]
    fn more_than_quota_in_one_request_is_gluttony() {
        assert_eq!(check_request_size(4), Err(PurchaseRejection::Gluttony));
        assert_eq!(check_request_size(3), Ok(()));
    }

    #[test]
    fn price_check_compares_whole_cents() {
        let price = Cents::new(125);
        assert_eq!(check_price(price, 2, Cents::parse_decimal("2.50").unwrap()), Ok(()));
        assert_eq!(check_price(price, 2, Cents::parse_decimal("2.5").unwrap()), Ok(()));
        assert_eq!(check_price(price, 2, Cents::parse_decimal("25e-1").unwrap()), Ok(()));

        for claimed in ["2.49", "2.51"] {
            let claimed = Cents::parse_decimal(claimed).unwrap();
            assert_eq!(
                check_price(price, 2, claimed),
                Err(PurchaseRejection::PriceMismatch {
                    expected: Cents::new(250),
                    claimed,
                })
            );
        }
    }

    #[test]
    fn cumulative_quota_is_enforced() {
        assert_eq!(plan_purchase(snapshot(10, 2), 2), Err(PurchaseRejection::Gluttony));
        assert!(plan_purchase(snapshot(10, 2), 1).unwrap().reaches_quota);
    }

    #[test]
    fn quota_is_checked_before_stock() {
        assert_eq!(plan_purchase(snapshot(0, 3), 1), Err(PurchaseRejection::Gluttony));
    }

    #[test]
    fn gone_messages_distinguish_sold_out_from_short_stock() {
        let sold_out = plan_purchase(snapshot(0, 0), 1).unwrap_err();
        assert_eq!(sold_out, PurchaseRejection::SoldOut);
        assert_eq!(sold_out.to_string(), SOLD_OUT_MESSAGE);

        let short = plan_purchase(snapshot(1, 0), 2).unwrap_err();
        assert_eq!(
            short,
            PurchaseRejection::NotEnoughSlices {
                remaining: 1,
                requested: 2
            }
        );
        assert_eq!(short.to_string(), NOT_ENOUGH_MESSAGE);
    }

    #[test]
    fn last_slice_sells_out_the_pie() {
        let plan = plan_purchase(snapshot(1, 0), 1).unwrap();
        assert_eq!(plan.remaining_after, 0);
        assert!(plan.sells_out);
        assert!(!plan.reaches_quota);
    }

    #[test]
    fn zero_slices_plan_is_empty_and_sets_no_flags() {
        let plan = plan_purchase(snapshot(3, 3), 0).unwrap();
        assert!(plan.is_empty());
        assert_eq!((plan.remaining_after, plan.purchased_after), (3, 3));
        assert!(!plan.sells_out);
        assert!(!plan.reaches_quota);
    }

    #[test]
    fn zero_slices_of_a_sold_out_pie_is_sold_out() {
        assert_eq!(plan_purchase(snapshot(0, 0), 0), Err(PurchaseRejection::SoldOut));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: an accepted plan never drives stock negative and never
        /// pushes a buyer past the quota.
        #[test]
        fn accepted_plans_preserve_invariants(
            remaining in 0i64..20,
            purchased in 0i64..=3,
            requested in 0u32..=3
        ) {
            match plan_purchase(snapshot(remaining, purchased), requested) {
                Ok(plan) => {
                    prop_assert!(plan.remaining_after >= 0);
                    prop_assert!(plan.purchased_after <= i64::from(SLICE_QUOTA));
                    prop_assert_eq!(
                        plan.remaining_after + plan.purchased_after,
                        remaining + purchased
                    );
                    prop_assert_eq!(plan.sells_out, plan.remaining_after == 0);
                }
                Err(PurchaseRejection::Gluttony) => {
                    prop_assert!(purchased + i64::from(requested) > 3);
                }
                Err(_) => {
                    prop_assert!(remaining == 0 || remaining < i64::from(requested));
                }
            }
        }
    }
}
