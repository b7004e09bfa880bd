//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. Money amounts
/// (`Cents`) are the canonical example here: two amounts of 250 cents are the
/// same amount, wherever they came from.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: value objects are compared by their attribute values
/// - **Debug**: value objects show up in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
