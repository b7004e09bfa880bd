use serde::{Deserialize, Serialize};

use piestand_core::{Cents, Entity, PieId};

/// Maximum number of slices a single buyer may own of a single pie.
pub const SLICE_QUOTA: u32 = 3;

/// Catalog entry: a pie with a fixed per-slice price.
///
/// Catalog fields are immutable once loaded. The remaining slice count is not
/// part of the catalog; it lives in the inventory store as a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pie {
    pub id: PieId,
    pub name: String,
    pub image_url: String,
    pub price_per_slice: Cents,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Pie {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Entity for Pie {
    type Id = PieId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_catalog_documents_and_ignores_inventory_fields() {
        let json = r#"{
            "id": 3,
            "name": "Apple",
            "image_url": "http://img/apple.png",
            "price_per_slice": 4.35,
            "slices": 8,
            "labels": ["fruit", "classic"]
        }"#;

        let pie: Pie = serde_json::from_str(json).unwrap();
        assert_eq!(pie.id, PieId::new(3));
        assert_eq!(pie.price_per_slice, Cents::new(435));
        assert!(pie.has_label("fruit"));
        assert!(!pie.has_label("cream"));
    }

    #[test]
    fn labels_default_to_empty() {
        let json = r#"{"id": 1, "name": "Plain", "image_url": "", "price_per_slice": 1}"#;
        let pie: Pie = serde_json::from_str(json).unwrap();
        assert!(pie.labels.is_empty());
        assert_eq!(pie.price_per_slice, Cents::new(100));
    }
}
