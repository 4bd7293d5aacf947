//! Tag scanning and the scan-result index
//!
//! A [`TagScanner`] reads a set of tags from a set of files in one pass;
//! [`ScanIndex`] holds the result as an immutable file × tag table with
//! cached per-tag group-bys.

mod dicom;
mod index;
mod memory;
mod scanner;
mod table;

pub use dicom::{get_string_value, DicomScanner};
pub use index::{FileSet, Grouping, ScanIndex, ScanRow};
pub use memory::MemoryScanner;
pub use scanner::{FileFailure, RawScan, TagScanner, UnreadablePolicy};

#[cfg(test)]
pub(crate) use dicom::tests::write_dicom;
#[cfg(test)]
pub(crate) use index::tests::{index_ab, paths, A, B};
