//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Observations and forecast points are defined entirely by their attribute
/// values: two points with the same timestamp and quantity are the same point.
/// They are immutable once built; "modifying" one means constructing a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
