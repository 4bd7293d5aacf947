//! Tag-indexed DICOM metadata extraction
//!
//! Files are scanned once for every tag a job needs ([`ScanIndex`]), split
//! into units by a [`Unitizer`], and each unit is reduced to a row of
//! [`Attribute`] values. [`SubseriesResolver`] detects series that hold
//! several volumes.

pub mod attribute;
pub mod batch;
pub mod cli;
pub mod error;
pub mod files;
pub mod output;
pub mod pipeline;
pub mod scan;
pub mod subseries;
pub mod tags;
pub mod types;
pub mod unit;

pub use attribute::{Attribute, AttributeSet, AttributeValues};
pub use batch::{
    partition_by_directory, run_partitions, BatchReport, FailurePolicy, Partition,
    PartitionOutcome,
};
pub use error::{Result, UcdmError};
pub use files::{collect_dicom_files, is_dicom_file};
pub use output::ResultTable;
pub use pipeline::{Extraction, ExtractionOptions, ExtractionPipeline};
pub use scan::{
    DicomScanner, FileFailure, FileSet, Grouping, MemoryScanner, RawScan, ScanIndex, ScanRow,
    TagScanner, UnreadablePolicy,
};
pub use subseries::{
    series_ids, IppSorter, SeriesLoader, SpatialSorter, Subseries, SubseriesResolver,
    VolumeLoader,
};
pub use types::*;
pub use unit::{Unit, UnitKey, Unitizer};
