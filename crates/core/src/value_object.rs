//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are never mutated in place: an operation
/// on one produces a new value. [`Money`](crate::Money) is the canonical
/// example in this workspace.
///
/// ```ignore
/// let a = Money::from(dec!(10.00));
/// let b = Money::from(dec!(10));
/// assert_eq!(a, b); // equal by value
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
