//! Value object trait: equality by value, not identity.
//!
//! Money amounts, commission rates, budget ranges and report months are
//! value objects. Two instances with the same attributes are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one,
/// build a new instance.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
