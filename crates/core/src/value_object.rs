//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values, e.g. a
/// course rating `{ average: 4.5, count: 120 }`. To "modify" one, build a new
/// value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
