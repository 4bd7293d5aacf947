//! Per-unit attributes
//!
//! An [`Attribute`] is a pure function of a unit-local [`crate::ScanIndex`]
//! that declares the tags it reads; an [`AttributeSet`] names and orders
//! them.

mod attribute;
mod builtin;
mod set;

pub use attribute::Attribute;
pub use set::{AttributeSet, AttributeValues};
