use super::scanner::{FileFailure, RawScan, TagScanner};
use crate::error::Result;
use crate::types::Tag;
use dicom_dictionary_std::tags::PIXEL_DATA;
use dicom_object::{InMemDicomObject, OpenFileOptions};
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// [`TagScanner`] reading DICOM files with `dicom-object`
///
/// Each file is parsed up to the pixel data. Values are trimmed of padding
/// (spaces and NULs); multi-valued elements are joined with `\`. Elements
/// that have no textual form (sequences) are reported present with an
/// empty value. Files are read in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomScanner;

impl DicomScanner {
    pub fn new() -> Self {
        Self
    }

    fn scan_file(path: &Path, tags: &BTreeSet<Tag>) -> Result<BTreeMap<Tag, Option<String>>> {
        let obj = OpenFileOptions::new()
            .read_until(PIXEL_DATA)
            .open_file(path)?;

        Ok(tags.iter().map(|t| (*t, get_string_value(&obj, *t))).collect())
    }
}

/// Helper to get the trimmed string value of a tag
///
/// Returns `None` if the tag is not present
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag.into()).ok().map(|elem| {
        elem.to_str()
            .map(|s| s.trim_matches(|c| c == ' ' || c == '\0').to_string())
            .unwrap_or_default()
    })
}

impl TagScanner for DicomScanner {
    fn scan(&self, files: &[PathBuf], tags: &BTreeSet<Tag>) -> Result<RawScan> {
        let unique: BTreeSet<&PathBuf> = files.iter().collect();
        let results: Vec<(PathBuf, Result<_>)> = unique
            .into_par_iter()
            .map(|path| (path.clone(), Self::scan_file(path, tags)))
            .collect();

        let mut raw = RawScan::default();
        for (path, result) in results {
            match result {
                Ok(row) => {
                    raw.values.insert(path, row);
                }
                Err(e) => {
                    debug!("Failed to read {}: {}", path.display(), e);
                    raw.failures.push(FileFailure::new(path, e.to_string()));
                }
            }
        }
        Ok(raw)
    }
}
