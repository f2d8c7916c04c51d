//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Entities owned by an aggregate (lessons inside a course) keep their id
/// across edits so other aggregates can reference them.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
