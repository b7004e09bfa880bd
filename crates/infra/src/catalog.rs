//! Immutable in-process pie catalog.
//!
//! Pie catalog fields never change after loading, so request handlers look
//! them up here instead of round-tripping to the store. Only the mutable
//! inventory (counters and sets) is read from the store per request.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use piestand_core::{Entity, PieId};
use piestand_inventory::Pie;

use crate::store::keys;
use crate::store::{StoreConnection, StoreError, WriteBatch};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("catalog document could not be decoded: {0}")]
    Decode(String),

    #[error("catalog document could not be encoded: {0}")]
    Encode(String),

    #[error("pie {0} appears more than once in the catalog")]
    DuplicatePie(PieId),
}

/// Catalog of pies, in load order, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pies: Vec<Pie>,
    index: HashMap<PieId, usize>,
}

impl Catalog {
    pub fn new(pies: Vec<Pie>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(pies.len());
        for (position, pie) in pies.iter().enumerate() {
            let id = *pie.id();
            if index.insert(id, position).is_some() {
                return Err(CatalogError::DuplicatePie(id));
            }
        }
        Ok(Self { pies, index })
    }

    /// Load the catalog from the `pies:json` document.
    ///
    /// A store without a catalog document yields an empty catalog.
    pub fn load<C: StoreConnection>(conn: &mut C) -> Result<Self, CatalogError> {
        let Some(document) = conn.get_string(keys::PIES_JSON)? else {
            warn!(key = keys::PIES_JSON, "no catalog document in store; starting with an empty catalog");
            return Ok(Self::default());
        };

        let pies: Vec<Pie> =
            serde_json::from_str(&document).map_err(|e| CatalogError::Decode(e.to_string()))?;
        let catalog = Self::new(pies)?;
        info!(pies = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: PieId) -> Option<&Pie> {
        self.index.get(&id).map(|&position| &self.pies[position])
    }

    pub fn contains(&self, id: PieId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn pies(&self) -> &[Pie] {
        &self.pies
    }

    pub fn len(&self) -> usize {
        self.pies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pies.is_empty()
    }
}

/// Write one pie's inventory entries: its JSON document, the remaining-slices
/// counter, global availability (when `slices > 0`), and label memberships.
///
/// Used by fixtures and by external loaders; the purchase engine never calls it.
pub fn stock_pie<C: StoreConnection>(conn: &mut C, pie: &Pie, slices: u32) -> Result<(), CatalogError> {
    let document = serde_json::to_string(pie).map_err(|e| CatalogError::Encode(e.to_string()))?;
    let id = pie.id.to_string();

    let mut batch = WriteBatch::new();
    batch
        .set(keys::pie(pie.id), document)
        .set(keys::pie_slices(pie.id), slices.to_string());
    if slices > 0 {
        batch.set_add(keys::PIES_AVAILABLE, id.clone());
    }
    for label in &pie.labels {
        batch.set_add(keys::label(label), id.clone());
    }

    conn.commit(batch)?;
    info!(pie_id = %pie.id, slices, "pie stocked");
    Ok(())
}

/// Write the `pies:json` document so other processes can `Catalog::load` it.
pub fn publish_catalog<C: StoreConnection>(conn: &mut C, catalog: &Catalog) -> Result<(), CatalogError> {
    let document =
        serde_json::to_string(catalog.pies()).map_err(|e| CatalogError::Encode(e.to_string()))?;

    let mut batch = WriteBatch::new();
    batch.set(keys::PIES_JSON, document);
    conn.commit(batch)?;
    Ok(())
}

/// One entry of a stock file: a pie plus its initial slice count.
#[derive(Debug, Clone, Deserialize)]
pub struct StockEntry {
    #[serde(flatten)]
    pub pie: Pie,
    pub slices: u32,
}

/// Stock every pie of a JSON stock file and publish the resulting catalog.
pub fn seed_from_json<C: StoreConnection>(conn: &mut C, document: &str) -> Result<Catalog, CatalogError> {
    let entries: Vec<StockEntry> =
        serde_json::from_str(document).map_err(|e| CatalogError::Decode(e.to_string()))?;
    let catalog = Catalog::new(entries.iter().map(|entry| entry.pie.clone()).collect())?;

    for entry in &entries {
        stock_pie(conn, &entry.pie, entry.slices)?;
    }
    publish_catalog(conn, &catalog)?;
    info!(pies = catalog.len(), "inventory seeded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use piestand_core::Cents;

    use crate::store::{InMemoryInventoryStore, InventoryStore};

    fn pie(id: u64, price: i64, labels: &[&str]) -> Pie {
        Pie {
            id: PieId::new(id),
            name: format!("pie {id}"),
            image_url: format!("http://img/{id}.png"),
            price_per_slice: Cents::new(price),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![pie(1, 100, &[]), pie(1, 200, &[])]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePie(id) if id == PieId::new(1)));
    }

    #[test]
    fn preserves_load_order() {
        let catalog = Catalog::new(vec![pie(9, 100, &[]), pie(2, 200, &[])]).unwrap();
        let ids: Vec<u64> = catalog.pies().iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![9, 2]);
        assert_eq!(catalog.get(PieId::new(2)).unwrap().price_per_slice, Cents::new(200));
        assert!(catalog.get(PieId::new(3)).is_none());
    }

    #[test]
    fn missing_document_loads_empty_catalog() {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();
        assert!(Catalog::load(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn published_catalog_loads_back() {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();
        let catalog = Catalog::new(vec![pie(1, 125, &["fruit"]), pie(2, 300, &[])]).unwrap();

        publish_catalog(&mut conn, &catalog).unwrap();
        let loaded = Catalog::load(&mut conn).unwrap();

        assert_eq!(loaded.pies(), catalog.pies());
    }

    #[test]
    fn corrupt_document_is_a_decode_error() {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();
        let mut batch = WriteBatch::new();
        batch.set(keys::PIES_JSON, "{not json");
        conn.commit(batch).unwrap();

        assert!(matches!(Catalog::load(&mut conn), Err(CatalogError::Decode(_))));
    }

    #[test]
    fn stocking_seeds_counters_and_sets() {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();

        stock_pie(&mut conn, &pie(4, 100, &["fruit", "warm"]), 6).unwrap();
        stock_pie(&mut conn, &pie(5, 100, &["fruit"]), 0).unwrap();

        assert_eq!(conn.get_int(&keys::pie_slices(PieId::new(4))).unwrap(), Some(6));
        assert!(conn.is_member(keys::PIES_AVAILABLE, "4").unwrap());
        assert!(!conn.is_member(keys::PIES_AVAILABLE, "5").unwrap());
        assert!(conn.is_member(&keys::label("warm"), "4").unwrap());
        assert!(conn.is_member(&keys::label("fruit"), "5").unwrap());
        assert!(conn.exists(&keys::pie(PieId::new(4))).unwrap());
    }

    #[test]
    fn seeding_stocks_and_publishes() {
        let store = InMemoryInventoryStore::new();
        let mut conn = store.connection().unwrap();
        let document = r#"[
            {"id": 1, "name": "Apple", "image_url": "", "price_per_slice": 1.5, "labels": ["fruit"], "slices": 4},
            {"id": 2, "name": "Pecan", "image_url": "", "price_per_slice": 2.25, "slices": 0}
        ]"#;

        let seeded = seed_from_json(&mut conn, document).unwrap();

        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded.get(PieId::new(2)).unwrap().price_per_slice, Cents::new(225));
        assert_eq!(conn.get_int(&keys::pie_slices(PieId::new(1))).unwrap(), Some(4));
        assert_eq!(conn.members(keys::PIES_AVAILABLE).unwrap(), vec!["1".to_string()]);
        assert_eq!(Catalog::load(&mut conn).unwrap().pies(), seeded.pies());
    }
}
