//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Child entities (invoice lines, payments) are owned by their aggregate root
/// and refer back to it by identifier only.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
