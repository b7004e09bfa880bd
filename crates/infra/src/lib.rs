//! Infrastructure layer: inventory store, purchase engine, recommendations, config.

pub mod catalog;
pub mod config;
pub mod inventory_view;
pub mod purchase_engine;
pub mod recommendation;
pub mod store;


pub use catalog::{Catalog, CatalogError, StockEntry, publish_catalog, seed_from_json, stock_pie};
pub use config::{AppConfig, ConfigError, StoreBackend};
pub use inventory_view::{PieDetails, PieSummary, PurchaseLine, ViewError, list_pies, pie_details};
pub use purchase_engine::{MAX_PURCHASE_ATTEMPTS, PurchaseEngine, PurchaseError, PurchaseReceipt};
pub use recommendation::{Recommendation, RecommendError, Recommender};
