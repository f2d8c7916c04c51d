//! Aggregate root trait for versioned, document-shaped domain models.

/// Aggregate root marker + minimal interface.
///
/// An aggregate guarantees the consistency of everything it owns (a course
/// owns its lessons, a user owns its enrollments). Storage never writes part
/// of an aggregate; it replaces the whole document.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;
}

/// Optimistic concurrency expectation for a stored document.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
