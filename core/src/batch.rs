//! Parallel extraction over independent partitions of a file set
//!
//! Each partition gets its own scan and its own [`ScanIndex`]; nothing is
//! shared between partitions but the read-only pipeline and scanner. A
//! failed partition leaves the others untouched.
//!
//! [`ScanIndex`]: crate::ScanIndex

use crate::error::{Result, UcdmError};
use crate::output::ResultTable;
use crate::pipeline::ExtractionPipeline;
use crate::scan::TagScanner;
use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Name given to files directly under the partition root
pub const ROOT_PARTITION: &str = ".";

/// A named subset of the input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub files: Vec<PathBuf>,
}

impl Partition {
    pub fn new(name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }
}

/// Result of one partition's extraction
#[derive(Debug)]
pub struct PartitionOutcome {
    pub name: String,
    pub files: usize,
    pub result: Result<ResultTable>,
}

/// Whether a failed partition fails the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The first failed partition (by name) is returned as the error
    #[default]
    Abort,
    /// Failed partitions are logged and left out of the table
    Skip,
}

/// Outcomes of all partitions, ordered by partition name
#[derive(Debug)]
pub struct BatchReport {
    key_columns: Vec<String>,
    attribute_columns: Vec<String>,
    outcomes: Vec<PartitionOutcome>,
}

impl BatchReport {
    pub fn outcomes(&self) -> &[PartitionOutcome] {
        &self.outcomes
    }

    /// Names and errors of the failed partitions
    pub fn failures(&self) -> impl Iterator<Item = (&str, &UcdmError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Concatenates the partition tables
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], returns the error of the first
    /// failed partition
    pub fn into_table(self, policy: FailurePolicy) -> Result<ResultTable> {
        let mut table = ResultTable::new(self.key_columns, self.attribute_columns);
        for outcome in self.outcomes {
            match outcome.result {
                Ok(part) => table.append(part)?,
                Err(e) => match policy {
                    FailurePolicy::Abort => {
                        error!("Partition {} failed: {}", outcome.name, e);
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping partition {}: {}", outcome.name, e);
                    }
                },
            }
        }
        Ok(table)
    }
}

/// Runs `pipeline` on every partition in parallel
///
/// Each partition is scanned and evaluated independently.
pub fn run_partitions<S: TagScanner + Sync + ?Sized>(
    pipeline: &ExtractionPipeline,
    scanner: &S,
    partitions: Vec<Partition>,
) -> BatchReport {
    info!("Running {} partitions", partitions.len());

    let mut outcomes: Vec<PartitionOutcome> = partitions
        .into_par_iter()
        .map(|partition| {
            let result = pipeline
                .extract(scanner, &partition.files)
                .and_then(|extraction| extraction.into_table());
            if let Err(e) = &result {
                warn!("Partition {} failed: {}", partition.name, e);
            }
            PartitionOutcome {
                name: partition.name,
                files: partition.files.len(),
                result,
            }
        })
        .collect();
    outcomes.sort_by(|a, b| a.name.cmp(&b.name));

    BatchReport {
        key_columns: pipeline.unitizer().key_names(),
        attribute_columns: pipeline.attributes().names().map(str::to_string).collect(),
        outcomes,
    }
}

/// Groups files by their first path component below `root`
///
/// Files directly under `root`, or outside it, form the
/// [`ROOT_PARTITION`].
pub fn partition_by_directory(root: &Path, files: &[PathBuf]) -> Vec<Partition> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        let name = file
            .strip_prefix(root)
            .ok()
            .and_then(|relative| {
                let mut components = relative.components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(dir)), Some(_)) => {
                        Some(dir.to_string_lossy().into_owned())
                    }
                    _ => None,
                }
            })
            .unwrap_or_else(|| ROOT_PARTITION.to_string());
        groups.entry(name).or_default().push(file.clone());
    }

    groups
        .into_iter()
        .map(|(name, files)| Partition::new(name, files))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeSet};
    use crate::scan::MemoryScanner;
    use crate::tags::{MODALITY, SERIES_INSTANCE_UID};
    use crate::unit::Unitizer;

    fn scanner() -> MemoryScanner {
        MemoryScanner::new()
            .with_file("root/p1/a", [(SERIES_INSTANCE_UID, "S1"), (MODALITY, "MR")])
            .with_file("root/p1/b", [(SERIES_INSTANCE_UID, "S1"), (MODALITY, "MR")])
            .with_file("root/p2/a", [(SERIES_INSTANCE_UID, "S2"), (MODALITY, "CT")])
            .with_file("root/p2/b", [(SERIES_INSTANCE_UID, "S2"), (MODALITY, "MR")])
            .with_file("root/p3/x/a", [(SERIES_INSTANCE_UID, "S3"), (MODALITY, "US")])
            .with_file("root/top", [(SERIES_INSTANCE_UID, "S4"), (MODALITY, "OT")])
    }

    fn pipeline() -> ExtractionPipeline {
        ExtractionPipeline::new(
            Unitizer::by_series(),
            AttributeSet::from_attributes([Attribute::lookup_tag(MODALITY)]).unwrap(),
        )
    }

    #[test]
    fn test_partition_by_directory() {
        let scanner = scanner();
        let partitions = partition_by_directory(Path::new("root"), &scanner.files());
        let names: Vec<&str> = partitions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![".", "p1", "p2", "p3"]);
        assert_eq!(partitions[3].files, vec![PathBuf::from("root/p3/x/a")]);

        let outside = partition_by_directory(Path::new("elsewhere"), &scanner.files());
        assert_eq!(outside.len(), 1);
        assert_eq!(outside[0].name, ROOT_PARTITION);
    }

    #[test]
    fn test_failures_are_isolated() {
        let scanner = scanner();
        let partitions = partition_by_directory(Path::new("root"), &scanner.files());
        let report = run_partitions(&pipeline(), &scanner, partitions);

        assert_eq!(report.outcomes().len(), 4);
        assert_eq!(report.succeeded(), 3);
        let failed: Vec<&str> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["p2"]);

        let table = report.into_table(FailurePolicy::Skip).unwrap();
        let keys: Vec<String> = table.rows().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["S4", "S1", "S3"]);
    }

    #[test]
    fn test_abort_policy() {
        let scanner = scanner();
        let partitions = partition_by_directory(Path::new("root"), &scanner.files());
        let report = run_partitions(&pipeline(), &scanner, partitions);
        assert!(matches!(
            report.into_table(FailurePolicy::Abort),
            Err(UcdmError::InconsistentMetadata { .. })
        ));
    }

    #[test]
    fn test_scan_failure_stays_in_its_partition() {
        let scanner = scanner().with_unreadable("root/p1/broken");
        let partitions = vec![
            Partition::new("p1", vec![PathBuf::from("root/p1/a"), PathBuf::from("root/p1/broken")]),
            Partition::new("p3", vec![PathBuf::from("root/p3/x/a")]),
        ];
        let report = run_partitions(&pipeline(), &scanner, partitions);
        assert!(matches!(
            report.outcomes()[0].result,
            Err(UcdmError::ScanFailure(_))
        ));
        assert_eq!(report.outcomes()[1].result.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_batch_keeps_columns() {
        let table = run_partitions(&pipeline(), &scanner(), vec![])
            .into_table(FailurePolicy::Abort)
            .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["SeriesInstanceUID", "Modality"]);
    }
}
