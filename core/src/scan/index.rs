use super::scanner::{TagScanner, UnreadablePolicy};
use crate::error::{Result, UcdmError};
use crate::types::{ScanValue, Tag};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Shared set of file identifiers
pub type FileSet = Arc<BTreeSet<PathBuf>>;

/// Group-by result for one tag: value → files carrying that value,
/// ordered by value
pub type Grouping = Arc<BTreeMap<String, FileSet>>;

type Row = BTreeMap<Tag, Option<String>>;

/// Immutable file × tag → value table
///
/// For a fixed file set F and tag set T, every (f, t) pair has a value,
/// present (possibly empty) or absent. Querying a file outside F or a tag
/// outside T is an error.
///
/// Group-by results are computed lazily, once per tag, and cached in the
/// instance. The cache is the only interior state and is safe to read from
/// several threads.
///
/// # Example
///
/// ```
/// use ucdm_core::{ScanIndex, ScanValue, Tag};
/// use std::collections::{BTreeMap, BTreeSet};
/// use std::path::{Path, PathBuf};
///
/// let a = Tag::new(0x0020, 0x000E);
/// let mut rows = BTreeMap::new();
/// rows.insert(PathBuf::from("f1"), BTreeMap::from([(a, Some("x".to_string()))]));
/// rows.insert(PathBuf::from("f2"), BTreeMap::from([(a, None)]));
///
/// let index = ScanIndex::from_rows(BTreeSet::from([a]), rows).unwrap();
/// assert_eq!(index.get(Path::new("f2"), a).unwrap(), ScanValue::Absent);
///
/// let buckets = index.partition_by(a).unwrap();
/// assert_eq!(buckets.len(), 1);
/// assert!(buckets["x"].contains(&PathBuf::from("f1")));
/// ```
#[derive(Debug, Clone)]
pub struct ScanIndex {
    tags: BTreeSet<Tag>,
    rows: BTreeMap<PathBuf, Row>,
    groupings: BTreeMap<Tag, OnceLock<Grouping>>,
}

impl ScanIndex {
    /// Builds an index from complete rows
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::ScanFailure`] if a row lacks a value for one of
    /// `tags` or carries a tag outside `tags`
    pub fn from_rows(tags: BTreeSet<Tag>, rows: BTreeMap<PathBuf, Row>) -> Result<Self> {
        for (file, row) in &rows {
            if let Some(missing) = tags.iter().find(|t| !row.contains_key(t)) {
                return Err(UcdmError::ScanFailure(format!(
                    "no value reported for tag {} in {}",
                    missing,
                    file.display()
                )));
            }
            if let Some(extra) = row.keys().find(|t| !tags.contains(t)) {
                return Err(UcdmError::ScanFailure(format!(
                    "unrequested tag {} reported for {}",
                    extra,
                    file.display()
                )));
            }
        }

        Ok(Self::from_parts(tags, rows))
    }

    /// An index over no files
    pub fn empty(tags: BTreeSet<Tag>) -> Self {
        Self::from_parts(tags, BTreeMap::new())
    }

    fn from_parts(tags: BTreeSet<Tag>, rows: BTreeMap<PathBuf, Row>) -> Self {
        let groupings = tags.iter().map(|t| (*t, OnceLock::new())).collect();
        Self {
            tags,
            rows,
            groupings,
        }
    }

    /// Scans `files` for `tags` in a single pass and indexes the result
    ///
    /// # Errors
    ///
    /// - [`UcdmError::ScanFailure`] if the scanner fails, if it omits a
    ///   requested (file, tag) pair, or if a file is unreadable under
    ///   [`UnreadablePolicy::Fail`]
    pub fn scan<S: TagScanner + ?Sized>(
        scanner: &S,
        files: &[PathBuf],
        tags: &BTreeSet<Tag>,
        policy: UnreadablePolicy,
    ) -> Result<Self> {
        info!("Scanning {} files for {} tags", files.len(), tags.len());
        let mut raw = scanner.scan(files, tags)?;

        if !raw.failures.is_empty() {
            match policy {
                UnreadablePolicy::Fail => {
                    let first = &raw.failures[0];
                    return Err(UcdmError::ScanFailure(format!(
                        "{} file(s) could not be read, first: {}: {}",
                        raw.failures.len(),
                        first.file.display(),
                        first.reason
                    )));
                }
                UnreadablePolicy::Skip => {
                    for failure in &raw.failures {
                        warn!("Skipping {}: {}", failure.file.display(), failure.reason);
                    }
                }
            }
        }

        let failed: BTreeSet<&PathBuf> = raw.failures.iter().map(|f| &f.file).collect();
        let mut rows = BTreeMap::new();
        for file in files {
            if failed.contains(file) || rows.contains_key(file) {
                continue;
            }
            let row = raw.values.remove(file).ok_or_else(|| {
                UcdmError::ScanFailure(format!(
                    "scanner reported nothing for {}",
                    file.display()
                ))
            })?;
            rows.insert(file.clone(), row);
        }

        let index = Self::from_rows(tags.clone(), rows)?;
        debug!("Indexed {} files", index.len());
        Ok(index)
    }

    /// Number of files in the index
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The scanned files, in sorted order
    pub fn files(&self) -> impl ExactSizeIterator<Item = &Path> + '_ {
        self.rows.keys().map(PathBuf::as_path)
    }

    /// The file set as an owned set
    pub fn file_set(&self) -> BTreeSet<PathBuf> {
        self.rows.keys().cloned().collect()
    }

    /// The scanned tag set
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    pub fn contains_file(&self, file: &Path) -> bool {
        self.rows.contains_key(file)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    fn require_tag(&self, tag: Tag) -> Result<()> {
        if self.tags.contains(&tag) {
            Ok(())
        } else {
            Err(UcdmError::TagNotRequested(tag))
        }
    }

    fn require_row(&self, file: &Path) -> Result<&Row> {
        self.rows
            .get(file)
            .ok_or_else(|| UcdmError::UnknownFile(file.to_path_buf()))
    }

    /// The value of `tag` in `file`
    ///
    /// # Errors
    ///
    /// Returns an error if `file` is not in the index or `tag` was not scanned
    pub fn get(&self, file: &Path, tag: Tag) -> Result<ScanValue> {
        let row = self.require_row(file)?;
        self.require_tag(tag)?;
        Ok(ScanValue::from_option(
            row.get(&tag).and_then(|v| v.as_deref()),
        ))
    }

    /// All values of one file
    pub fn row(&self, file: &Path) -> Result<ScanRow<'_>> {
        let values = self.require_row(file)?;
        Ok(ScanRow {
            tags: &self.tags,
            values,
        })
    }

    /// All (file, value) pairs of one tag, in file order
    pub fn column(&self, tag: Tag) -> Result<Vec<(&Path, ScanValue)>> {
        self.require_tag(tag)?;
        Ok(self
            .rows
            .iter()
            .map(|(file, row)| {
                (
                    file.as_path(),
                    ScanValue::from_option(row.get(&tag).and_then(|v| v.as_deref())),
                )
            })
            .collect())
    }

    /// Every (file, tag, value) triple
    pub fn iter(&self) -> impl Iterator<Item = (&Path, Tag, ScanValue)> + '_ {
        self.rows.iter().flat_map(|(file, row)| {
            row.iter().map(move |(tag, value)| {
                (
                    file.as_path(),
                    *tag,
                    ScanValue::from_option(value.as_deref()),
                )
            })
        })
    }

    /// Partitions the files by the present values of `tag`
    ///
    /// Files lacking the tag appear in no bucket. Buckets are ordered by
    /// value; the result is cached per tag.
    pub fn partition_by(&self, tag: Tag) -> Result<Grouping> {
        let cell = self
            .groupings
            .get(&tag)
            .ok_or(UcdmError::TagNotRequested(tag))?;
        Ok(Arc::clone(cell.get_or_init(|| self.group_by(tag))))
    }

    fn group_by(&self, tag: Tag) -> Grouping {
        let mut groups: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
        for (file, row) in &self.rows {
            if let Some(Some(value)) = row.get(&tag) {
                groups
                    .entry(value.clone())
                    .or_default()
                    .insert(file.clone());
            }
        }
        Arc::new(groups.into_iter().map(|(v, f)| (v, Arc::new(f))).collect())
    }

    /// The distinct present values of `tag`
    pub fn values_of(&self, tag: Tag) -> Result<BTreeSet<String>> {
        Ok(self.partition_by(tag)?.keys().cloned().collect())
    }

    /// The files whose `tag` equals `value` (possibly none)
    pub fn files_with(&self, tag: Tag, value: &str) -> Result<FileSet> {
        Ok(self
            .partition_by(tag)?
            .get(value)
            .cloned()
            .unwrap_or_default())
    }

    /// Restricts the index to `subset`, keeping the tag set
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::UnknownFile`] if `subset` is not a subset of the
    /// indexed files
    pub fn filter(&self, subset: &BTreeSet<PathBuf>) -> Result<ScanIndex> {
        if let Some(unknown) = subset.iter().find(|f| !self.rows.contains_key(*f)) {
            return Err(UcdmError::UnknownFile(unknown.clone()));
        }
        Ok(self.restrict(subset))
    }

    /// Restricts to the intersection of `subset` with the indexed files
    pub(crate) fn restrict(&self, subset: &BTreeSet<PathBuf>) -> ScanIndex {
        if subset.len() == self.rows.len() && self.rows.keys().all(|f| subset.contains(f)) {
            // Same file set: share the group-by cache
            return self.clone();
        }

        let rows = subset
            .iter()
            .filter_map(|f| self.rows.get(f).map(|row| (f.clone(), row.clone())))
            .collect();
        Self::from_parts(self.tags.clone(), rows)
    }

    /// Restricts the index to the files whose `tag` equals `value`
    pub fn filter_tag(&self, tag: Tag, value: &str) -> Result<ScanIndex> {
        let files = self.files_with(tag, value)?;
        Ok(self.restrict(&files))
    }

    /// Union of two indexes over disjoint file sets and identical tag sets
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::MergeConflict`] if the tag sets differ or the
    /// file sets overlap
    pub fn merge(&self, other: &ScanIndex) -> Result<ScanIndex> {
        if self.tags != other.tags {
            let differing: Vec<String> = self
                .tags
                .symmetric_difference(&other.tags)
                .map(|t| t.to_string())
                .collect();
            return Err(UcdmError::MergeConflict(format!(
                "tag sets differ on {}",
                differing.join(", ")
            )));
        }

        let overlap: Vec<&PathBuf> = other
            .rows
            .keys()
            .filter(|f| self.rows.contains_key(*f))
            .collect();
        if !overlap.is_empty() {
            return Err(UcdmError::MergeConflict(format!(
                "{} file(s) present in both, first: {}",
                overlap.len(),
                overlap[0].display()
            )));
        }

        let mut rows = self.rows.clone();
        rows.extend(other.rows.iter().map(|(f, r)| (f.clone(), r.clone())));
        Ok(Self::from_parts(self.tags.clone(), rows))
    }
}

impl PartialEq for ScanIndex {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags && self.rows == other.rows
    }
}

/// Borrowed view of one file's values
#[derive(Debug, Clone, Copy)]
pub struct ScanRow<'a> {
    tags: &'a BTreeSet<Tag>,
    values: &'a Row,
}

impl<'a> ScanRow<'a> {
    /// The value of `tag`; [`ScanValue::NotRequested`] for tags outside the scan
    pub fn value(&self, tag: Tag) -> ScanValue {
        if !self.tags.contains(&tag) {
            return ScanValue::NotRequested;
        }
        ScanValue::from_option(self.values.get(&tag).and_then(|v| v.as_deref()))
    }

    /// Present (tag, value) pairs
    pub fn present(&self) -> impl Iterator<Item = (Tag, &'a str)> + 'a {
        self.values
            .iter()
            .filter_map(|(tag, value)| value.as_deref().map(|v| (*tag, v)))
    }
}
