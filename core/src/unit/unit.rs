use crate::error::Result;
use crate::scan::{FileSet, ScanIndex};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Key of a unit: one value per unitizing tag, in tag order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct UnitKey(Vec<String>);

impl UnitKey {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// A key with one component
    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends the components of `other`
    pub fn concat(mut self, other: UnitKey) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("|"))
    }
}

/// A named, immutable subset of the scanned files
///
/// Units share their file set with the index cache that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    files: FileSet,
}

impl Unit {
    pub fn new(files: FileSet) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The unit-local view of `index`
    pub fn scan_index(&self, index: &ScanIndex) -> Result<ScanIndex> {
        index.filter(&self.files)
    }
}

impl From<BTreeSet<PathBuf>> for Unit {
    fn from(files: BTreeSet<PathBuf>) -> Self {
        Self::new(FileSet::new(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{index_ab, paths};

    #[test]
    fn test_key_concat_and_display() {
        let key = UnitKey::single("1.2.3").concat(UnitKey::new(vec!["4".into(), "M".into()]));
        assert_eq!(key.len(), 3);
        assert_eq!(key.to_string(), "1.2.3|4|M");
    }

    #[test]
    fn test_unit_scan_index() {
        let index = index_ab(&[("f1", Some("x"), None), ("f2", Some("y"), None)]);
        let unit = Unit::from(paths(&["f2"]));
        let local = unit.scan_index(&index).unwrap();
        assert_eq!(local.file_set(), paths(&["f2"]));

        let stranger = Unit::from(paths(&["f9"]));
        assert!(stranger.scan_index(&index).is_err());
    }
}
