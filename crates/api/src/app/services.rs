//! Store wiring: one engine/recommender pair per configured backend.
//!
//! Every method here performs blocking store I/O; handlers call them from
//! `spawn_blocking`.

use std::sync::Arc;

use thiserror::Error;

use piestand_core::{PieId, Username};
use piestand_infra::{
    AppConfig, Catalog, CatalogError, PieDetails, PieSummary, PurchaseEngine, PurchaseError,
    PurchaseReceipt, Recommendation, RecommendError, Recommender, StoreBackend, ViewError,
    inventory_view, seed_from_json,
    store::{InMemoryInventoryStore, InventoryStore, RedisInventoryStore, StoreError},
};
use piestand_inventory::{Budget, PurchaseForm};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("could not read seed file {path}: {source}")]
    Seed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a request handler needs for one store backend.
#[derive(Debug, Clone)]
pub struct Services<S> {
    store: S,
    catalog: Arc<Catalog>,
    engine: PurchaseEngine<S>,
    recommender: Recommender<S>,
}

impl<S> Services<S>
where
    S: InventoryStore + Clone,
{
    pub fn new(store: S, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            engine: PurchaseEngine::new(store.clone(), catalog.clone()),
            recommender: Recommender::new(store.clone(), catalog.clone()),
            store,
            catalog,
        }
    }

    fn list_pies(&self) -> Result<Vec<PieSummary>, ViewError> {
        let mut conn = self.store.connection()?;
        inventory_view::list_pies(&mut conn, &self.catalog)
    }

    fn pie_details(&self, id: PieId) -> Result<PieDetails, ViewError> {
        let mut conn = self.store.connection()?;
        inventory_view::pie_details(&mut conn, &self.catalog, id)
    }
}

#[derive(Debug, Clone)]
pub enum AppServices {
    InMemory(Services<InMemoryInventoryStore>),
    Redis(Services<RedisInventoryStore>),
}

macro_rules! with_services {
    ($self:expr, $services:ident => $body:expr) => {
        match $self {
            AppServices::InMemory($services) => $body,
            AppServices::Redis($services) => $body,
        }
    };
}

impl AppServices {
    pub fn in_memory(store: InMemoryInventoryStore, catalog: Catalog) -> Self {
        AppServices::InMemory(Services::new(store, catalog))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            AppServices::InMemory(_) => "in-memory",
            AppServices::Redis(_) => "redis",
        }
    }

    pub fn purchase(&self, pie_id: PieId, form: &PurchaseForm) -> Result<PurchaseReceipt, PurchaseError> {
        with_services!(self, s => s.engine.purchase(pie_id, form))
    }

    pub fn recommend(
        &self,
        username: &Username,
        budget: Budget,
        labels: &[String],
    ) -> Result<Recommendation, RecommendError> {
        with_services!(self, s => s.recommender.recommend(username, budget, labels))
    }

    pub fn list_pies(&self) -> Result<Vec<PieSummary>, ViewError> {
        with_services!(self, s => s.list_pies())
    }

    pub fn pie_details(&self, id: PieId) -> Result<PieDetails, ViewError> {
        with_services!(self, s => s.pie_details(id))
    }
}

/// Build the services selected by `config`.
///
/// The in-memory backend starts empty unless a seed file is configured. The
/// Redis backend loads its catalog from the store's catalog document.
pub fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    match &config.store {
        StoreBackend::InMemory => {
            let store = InMemoryInventoryStore::new();
            let mut conn = store.connection()?;
            let catalog = match &config.seed_path {
                Some(path) => {
                    let document = std::fs::read_to_string(path).map_err(|source| StartupError::Seed {
                        path: path.display().to_string(),
                        source,
                    })?;
                    seed_from_json(&mut conn, &document)?
                }
                None => Catalog::load(&mut conn)?,
            };
            tracing::info!(backend = "in-memory", pies = catalog.len(), "services ready");
            Ok(AppServices::InMemory(Services::new(store, catalog)))
        }
        StoreBackend::Redis { url } => {
            let store = RedisInventoryStore::new(url)?;
            let mut conn = store.connection()?;
            let catalog = Catalog::load(&mut conn)?;
            tracing::info!(backend = "redis", pies = catalog.len(), "services ready");
            Ok(AppServices::Redis(Services::new(store, catalog)))
        }
    }
}
