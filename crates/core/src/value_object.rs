//! Value object trait: equality by value, not identity.

/// Marker for immutable values compared by their attributes (`Money`, contact
/// details, stock levels). Entities are compared by id instead.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
