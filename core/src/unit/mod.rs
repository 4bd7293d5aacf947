//! Partitioning of a scan into units
//!
//! A unit is a subset of files treated as one logical entity (a series, an
//! acquisition within a series, ...). Attributes are evaluated once per unit.

mod unit;
mod unitizer;

pub use unit::{Unit, UnitKey};
pub use unitizer::{Hierarchy, Unitizer, Units};
