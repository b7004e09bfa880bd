//! `piestand-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, the domain error model, and optimistic version checks.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{PieId, Username};
pub use money::Cents;
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
