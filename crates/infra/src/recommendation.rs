//! Recommendation query.
//!
//! Intersects the globally available pies with the user's cached available
//! set (when present) and the requested label sets, then picks the cheapest
//! or most expensive candidate. Read-only: it never watches or writes.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use piestand_core::{Cents, PieId, Username};
use piestand_inventory::{Budget, pick_recommendation};

use crate::catalog::Catalog;
use crate::store::keys;
use crate::store::{InventoryStore, StoreConnection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("Sorry we don't have what you're looking for. Come back early tomorrow before the crowds come from the best pie selection.")]
    NoRecommendation,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub pie_id: PieId,
    pub price_per_slice: Cents,
}

#[derive(Debug, Clone)]
pub struct Recommender<S> {
    store: S,
    catalog: Arc<Catalog>,
}

impl<S> Recommender<S> {
    pub fn new(store: S, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }
}

impl<S> Recommender<S>
where
    S: InventoryStore,
{
    #[instrument(skip(self, labels), fields(user = %username, labels = labels.len()))]
    pub fn recommend(
        &self,
        username: &Username,
        budget: Budget,
        labels: &[String],
    ) -> Result<Recommendation, RecommendError> {
        let mut conn = self.store.connection()?;

        let mut sets = vec![keys::PIES_AVAILABLE.to_string()];
        let user_available = keys::user_available(username.as_str());
        // A user who never reached a quota has no cached set and is unrestricted.
        if conn.exists(&user_available)? {
            sets.push(user_available);
        }
        sets.extend(labels.iter().map(|label| keys::label(label)));

        let ids = conn.intersect(&sets)?;
        debug!(candidates = ids.len(), "recommendation candidates");

        let mut candidates = Vec::with_capacity(ids.len());
        for raw in ids {
            let id: PieId = raw
                .parse()
                .map_err(|_| StoreError::corrupt(keys::PIES_AVAILABLE, format!("'{raw}' is not a pie id")))?;
            let pie = self.catalog.get(id).ok_or_else(|| {
                StoreError::corrupt(keys::PIES_AVAILABLE, format!("pie {id} is not in the catalog"))
            })?;
            candidates.push((id, pie.price_per_slice));
        }

        let (pie_id, price_per_slice) =
            pick_recommendation(budget, candidates).ok_or(RecommendError::NoRecommendation)?;

        Ok(Recommendation {
            pie_id,
            price_per_slice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use piestand_inventory::{Pie, PurchaseForm};

    use crate::catalog::stock_pie;
    use crate::purchase_engine::PurchaseEngine;
    use crate::store::{InMemoryInventoryStore, WriteBatch};

    fn pie(id: u64, price: i64, labels: &[&str]) -> Pie {
        Pie {
            id: PieId::new(id),
            name: format!("pie {id}"),
            image_url: String::new(),
            price_per_slice: Cents::new(price),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn setup(stock: &[(Pie, u32)]) -> (InMemoryInventoryStore, Arc<Catalog>) {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();
        for (pie, slices) in stock {
            stock_pie(&mut conn, pie, *slices).unwrap();
        }
        let catalog = Catalog::new(stock.iter().map(|(p, _)| p.clone()).collect()).unwrap();
        (store, Arc::new(catalog))
    }

    fn user(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn budget_and_labels_select_the_pie() {
        let (store, catalog) = setup(&[(pie(1, 100, &["fruit"]), 5), (pie(2, 200, &["cream"]), 5)]);
        let recommender = Recommender::new(store, catalog);

        let cheap = recommender
            .recommend(&user("ann"), Budget::Cheap, &labels(&["fruit"]))
            .unwrap();
        assert_eq!(cheap.pie_id, PieId::new(1));
        assert_eq!(cheap.price_per_slice, Cents::new(100));

        let premium = recommender.recommend(&user("ann"), Budget::Premium, &[]).unwrap();
        assert_eq!(premium.pie_id, PieId::new(2));
        assert_eq!(premium.price_per_slice, Cents::new(200));

        let unspecified = recommender.recommend(&user("ann"), Budget::Unspecified, &[]).unwrap();
        assert_eq!(unspecified.pie_id, PieId::new(2));
    }

    #[test]
    fn unmatched_labels_yield_no_recommendation() {
        let (store, catalog) = setup(&[(pie(1, 100, &["fruit"]), 5)]);
        let recommender = Recommender::new(store, catalog);

        let err = recommender
            .recommend(&user("ann"), Budget::Cheap, &labels(&["fruit", "savory"]))
            .unwrap_err();
        assert_eq!(err, RecommendError::NoRecommendation);
    }

    #[test]
    fn sold_out_pies_are_never_recommended() {
        let (store, catalog) = setup(&[(pie(1, 100, &[]), 5), (pie(2, 900, &[]), 0)]);
        let recommender = Recommender::new(store, catalog);

        let rec = recommender.recommend(&user("ann"), Budget::Premium, &[]).unwrap();
        assert_eq!(rec.pie_id, PieId::new(1));
    }

    #[test]
    fn pies_at_quota_are_excluded_for_that_user_only() {
        let (store, catalog) = setup(&[(pie(1, 100, &[]), 10), (pie(2, 200, &[]), 10)]);
        let engine = PurchaseEngine::new(store.clone(), catalog.clone());
        engine
            .purchase(PieId::new(2), &PurchaseForm::new("ann", "6.00", Some("3")))
            .unwrap();

        let recommender = Recommender::new(store, catalog);
        let for_ann = recommender.recommend(&user("ann"), Budget::Premium, &[]).unwrap();
        assert_eq!(for_ann.pie_id, PieId::new(1));

        let for_bob = recommender.recommend(&user("bob"), Budget::Premium, &[]).unwrap();
        assert_eq!(for_bob.pie_id, PieId::new(2));
    }

    #[test]
    fn unknown_candidate_is_a_corrupt_store() {
        let (store, catalog) = setup(&[(pie(1, 100, &[]), 5)]);
        let mut conn = store.connection().unwrap();
        let mut batch = WriteBatch::new();
        batch.set_add(keys::PIES_AVAILABLE, "77");
        conn.commit(batch).unwrap();

        let err = Recommender::new(store, catalog)
            .recommend(&user("ann"), Budget::Cheap, &[])
            .unwrap_err();
        assert!(matches!(err, RecommendError::Store(StoreError::Corrupt { .. })));
    }
}
