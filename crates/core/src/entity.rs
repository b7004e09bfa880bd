//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog entries (pies) are entities: two pies with the same identifier are
/// the same pie, whatever their display fields say.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
