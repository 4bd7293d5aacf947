//! Core value types
//!
//! This module provides the fundamental types used throughout the ucdm library:
//! - [`Tag`]: Identifier of one metadata field (group, element)
//! - [`ScanValue`]: Three-state value of one (file, tag) pair in a scan
//! - [`AttributeValue`]: Result of evaluating an attribute on a unit
//! - [`TagConfig`]: Named tag aliases used to resolve user tag tokens
//! - [`Position`] / [`Orientation`]: Slice geometry parsed from DS strings

mod config;
mod geometry;
mod tag;
mod value;

pub use config::{expand_tag_lists, TagConfig};
pub use geometry::{distance_along, parse_decimals, Orientation, Position};
pub use tag::Tag;
pub use value::{AttributeValue, ScanValue};
