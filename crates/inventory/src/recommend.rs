use serde::{Deserialize, Serialize};

use piestand_core::{Cents, PieId};

/// How a buyer wants recommendations ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    /// Cheapest first.
    Cheap,
    /// Most expensive first.
    Premium,
    /// No (or an unknown) preference; ordered like `Premium`.
    #[default]
    Unspecified,
}

impl Budget {
    /// Lenient parse: anything other than `cheap` / `premium` is unspecified.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("cheap") => Budget::Cheap,
            Some("premium") => Budget::Premium,
            _ => Budget::Unspecified,
        }
    }

    pub fn ascending(&self) -> bool {
        matches!(self, Budget::Cheap)
    }
}

/// Pick the first candidate by price for the given budget, with its price.
///
/// Candidates with equal prices keep the order they were given in (the stable
/// sort never reorders them), so ties follow whatever order the store's set
/// intersection produced. That order is not part of the contract.
pub fn pick_recommendation(
    budget: Budget,
    mut candidates: Vec<(PieId, Cents)>,
) -> Option<(PieId, Cents)> {
    if budget.ascending() {
        candidates.sort_by(|a, b| a.1.cmp(&b.1));
    } else {
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
    }
    candidates.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<(PieId, Cents)> {
        vec![
            (PieId::new(1), Cents::new(200)),
            (PieId::new(2), Cents::new(100)),
            (PieId::new(3), Cents::new(350)),
        ]
    }

    #[test]
    fn cheap_picks_lowest_price() {
        assert_eq!(
            pick_recommendation(Budget::Cheap, candidates()),
            Some((PieId::new(2), Cents::new(100)))
        );
    }

    #[test]
    fn premium_and_unspecified_pick_highest_price() {
        let expected = Some((PieId::new(3), Cents::new(350)));
        assert_eq!(pick_recommendation(Budget::Premium, candidates()), expected);
        assert_eq!(pick_recommendation(Budget::Unspecified, candidates()), expected);
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        assert_eq!(pick_recommendation(Budget::Cheap, vec![]), None);
    }

    #[test]
    fn unknown_budgets_are_unspecified() {
        assert_eq!(Budget::parse(Some("cheap")), Budget::Cheap);
        assert_eq!(Budget::parse(Some("premium")), Budget::Premium);
        assert_eq!(Budget::parse(Some("fancy")), Budget::Unspecified);
        assert_eq!(Budget::parse(None), Budget::Unspecified);
    }

    #[test]
    fn ties_resolve_to_one_of_the_tied_candidates() {
        let tied = vec![
            (PieId::new(5), Cents::new(100)),
            (PieId::new(6), Cents::new(100)),
        ];
        let (picked, price) = pick_recommendation(Budget::Cheap, tied).unwrap();
        assert!(picked == PieId::new(5) || picked == PieId::new(6));
        assert_eq!(price, Cents::new(100));
    }
}
