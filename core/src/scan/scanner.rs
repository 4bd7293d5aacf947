use crate::error::Result;
use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Raw table returned by a [`TagScanner`]
///
/// `values` holds, for every file the scanner could read, one entry per
/// requested tag (`None` when the file lacks the tag). Files that could not
/// be read are listed in `failures` instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScan {
    pub values: BTreeMap<PathBuf, BTreeMap<Tag, Option<String>>>,
    pub failures: Vec<FileFailure>,
}

/// A file the scanner could not open or parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub reason: String,
}

impl FileFailure {
    pub fn new(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Service reading a set of tags from a set of files
///
/// Per-file read failures belong in [`RawScan::failures`]; an `Err` return
/// means the scanner itself failed and is fatal to the whole call.
pub trait TagScanner {
    fn scan(&self, files: &[PathBuf], tags: &BTreeSet<Tag>) -> Result<RawScan>;
}

impl<T: TagScanner + ?Sized> TagScanner for &T {
    fn scan(&self, files: &[PathBuf], tags: &BTreeSet<Tag>) -> Result<RawScan> {
        (**self).scan(files, tags)
    }
}

/// What to do with files the scanner reports as unreadable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnreadablePolicy {
    /// Any unreadable file fails the whole scan
    #[default]
    Fail,
    /// Unreadable files are dropped from the index with a warning
    Skip,
}
