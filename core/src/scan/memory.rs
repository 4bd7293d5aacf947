use super::index::ScanIndex;
use super::scanner::{FileFailure, RawScan, TagScanner};
use crate::error::Result;
use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// In-memory [`TagScanner`] over a fixed table
///
/// Files listed as unreadable, or not known at all, are reported as
/// per-file failures.
///
/// # Example
///
/// ```
/// use ucdm_core::{MemoryScanner, ScanIndex, Tag, UnreadablePolicy};
/// use std::collections::BTreeSet;
/// use std::path::PathBuf;
///
/// let series = Tag::new(0x0020, 0x000E);
/// let scanner = MemoryScanner::new()
///     .with_file("a.dcm", [(series, "1.2.3")])
///     .with_file("b.dcm", [(series, "1.2.3")]);
///
/// let files = vec![PathBuf::from("a.dcm"), PathBuf::from("b.dcm")];
/// let index = ScanIndex::scan(&scanner, &files, &BTreeSet::from([series]), UnreadablePolicy::Fail).unwrap();
/// assert_eq!(index.values_of(series).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryScanner {
    table: BTreeMap<PathBuf, BTreeMap<Tag, String>>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a file with its tag values
    pub fn with_file<V: Into<String>>(
        mut self,
        file: impl Into<PathBuf>,
        values: impl IntoIterator<Item = (Tag, V)>,
    ) -> Self {
        self.table.insert(
            file.into(),
            values.into_iter().map(|(t, v)| (t, v.into())).collect(),
        );
        self
    }

    /// Builder: add a file the scanner will fail to read
    pub fn with_unreadable(mut self, file: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(file.into());
        self
    }

    /// Builds a scanner answering from the present values of an index
    pub fn from_index(index: &ScanIndex) -> Self {
        let mut scanner = Self::new();
        for file in index.files() {
            let values: BTreeMap<Tag, String> = index
                .row(file)
                .map(|row| row.present().map(|(t, v)| (t, v.to_string())).collect())
                .unwrap_or_default();
            scanner.table.insert(file.to_path_buf(), values);
        }
        scanner
    }

    /// Files known to this scanner
    pub fn files(&self) -> Vec<PathBuf> {
        self.table.keys().cloned().collect()
    }
}

impl TagScanner for MemoryScanner {
    fn scan(&self, files: &[PathBuf], tags: &BTreeSet<Tag>) -> Result<RawScan> {
        let mut raw = RawScan::default();
        for file in files {
            if raw.values.contains_key(file) {
                continue;
            }
            if self.unreadable.contains(file) {
                raw.failures.push(FileFailure::new(file, "unreadable"));
                continue;
            }
            match self.table.get(file) {
                Some(values) => {
                    let row = tags.iter().map(|t| (*t, values.get(t).cloned())).collect();
                    raw.values.insert(file.clone(), row);
                }
                None => raw.failures.push(FileFailure::new(file, "no such file")),
            }
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::UnreadablePolicy;

    const A: Tag = Tag::new(0x0011, 0x0001);
    const B: Tag = Tag::new(0x0011, 0x0002);

    #[test]
    fn test_scan_reports_absent_and_failures() {
        let scanner = MemoryScanner::new()
            .with_file("f1", [(A, "x")])
            .with_unreadable("bad");
        let files = vec![
            PathBuf::from("f1"),
            PathBuf::from("bad"),
            PathBuf::from("missing"),
        ];
        let raw = scanner.scan(&files, &BTreeSet::from([A, B])).unwrap();

        assert_eq!(raw.values[&PathBuf::from("f1")][&A], Some("x".to_string()));
        assert_eq!(raw.values[&PathBuf::from("f1")][&B], None);
        assert_eq!(raw.failures.len(), 2);
    }

    #[test]
    fn test_from_index_round_trip() {
        let scanner = MemoryScanner::new()
            .with_file("f1", [(A, "x"), (B, "")])
            .with_file("f2", [(B, "y")]);
        let tags = BTreeSet::from([A, B]);
        let index =
            ScanIndex::scan(&scanner, &scanner.files(), &tags, UnreadablePolicy::Fail).unwrap();

        let again = MemoryScanner::from_index(&index);
        let rebuilt =
            ScanIndex::scan(&again, &again.files(), &tags, UnreadablePolicy::Fail).unwrap();
        assert_eq!(rebuilt, index);
    }
}
