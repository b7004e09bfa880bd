//! Inventory store key layout.
//!
//! Every key is namespaced by pie id and/or username:
//!
//! | key | kind | meaning |
//! |---|---|---|
//! | `pies:available` | set | pie ids with remaining slices > 0 |
//! | `pies:json` | string | JSON array of every catalog pie |
//! | `pie:{id}` | string | JSON document of one pie |
//! | `pie:{id}:slices` | counter | remaining slices |
//! | `pie:{id}:purchasers` | set | usernames that bought at least one slice |
//! | `pie:{id}:user:{username}` | counter | slices bought by one user |
//! | `label:{label}` | set | pie ids carrying a label |
//! | `user:{username}:unavailable` | set | pie ids where the user hit the quota |
//! | `user:{username}:available` | set | cached `pies:available \ unavailable` |

use piestand_core::{PieId, Username};

pub const PIES_AVAILABLE: &str = "pies:available";

pub const PIES_JSON: &str = "pies:json";

pub fn pie(id: PieId) -> String {
    format!("pie:{id}")
}

pub fn pie_slices(id: PieId) -> String {
    format!("pie:{id}:slices")
}

pub fn pie_purchasers(id: PieId) -> String {
    format!("pie:{id}:purchasers")
}

pub fn purchase(id: PieId, username: &str) -> String {
    format!("pie:{id}:user:{username}")
}

pub fn label(label: &str) -> String {
    format!("label:{label}")
}

pub fn user_available(username: &str) -> String {
    format!("user:{username}:available")
}

pub fn user_unavailable(username: &str) -> String {
    format!("user:{username}:unavailable")
}

/// Keys touched by one buyer's purchase of one pie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseKeys {
    pub slices: String,
    pub purchasers: String,
    pub purchase: String,
    pub user_available: String,
    pub user_unavailable: String,
}

impl PurchaseKeys {
    pub fn new(pie_id: PieId, username: &Username) -> Self {
        let username = username.as_str();
        Self {
            slices: pie_slices(pie_id),
            purchasers: pie_purchasers(pie_id),
            purchase: purchase(pie_id, username),
            user_available: user_available(username),
            user_unavailable: user_unavailable(username),
        }
    }

    /// Keys whose change must invalidate an in-flight purchase attempt.
    pub fn watched(&self) -> Vec<String> {
        vec![
            self.slices.clone(),
            self.purchasers.clone(),
            self.purchase.clone(),
            self.user_available.clone(),
            PIES_AVAILABLE.to_string(),
        ]
    }
}
