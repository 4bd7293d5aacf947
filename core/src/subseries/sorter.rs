use super::loader::SpatialSorter;
use crate::error::{Result, UcdmError};
use crate::scan::{ScanIndex, TagScanner, UnreadablePolicy};
use crate::tags::{IMAGE_ORIENTATION_PATIENT, IMAGE_POSITION_PATIENT};
use crate::types::{distance_along, Orientation, Position};
use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const ORIENTATION_TOLERANCE: f64 = 1e-4;
const POSITION_TOLERANCE: f64 = 1e-6;

/// Orders slices by ImagePositionPatient along the slice normal
///
/// Geometry is read through any [`TagScanner`]. Missing or unparseable
/// geometry, differing orientations and coincident positions are all
/// [`UcdmError::SortFailure`].
#[derive(Debug, Clone)]
pub struct IppSorter<S> {
    scanner: S,
}

impl<S: TagScanner> IppSorter<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }

    fn geometry(index: &ScanIndex, file: &Path) -> Result<(Orientation, Position)> {
        let row = index.row(file)?;
        let read = |tag, name: &str| {
            row.value(tag).as_str().map(str::to_string).ok_or_else(|| {
                UcdmError::SortFailure(format!("{} lacks {}", file.display(), name))
            })
        };

        let orientation = Orientation::parse(&read(IMAGE_ORIENTATION_PATIENT, "ImageOrientationPatient")?)
            .map_err(|e| UcdmError::SortFailure(format!("{}: {}", file.display(), e)))?;
        let position = Position::parse(&read(IMAGE_POSITION_PATIENT, "ImagePositionPatient")?)
            .map_err(|e| UcdmError::SortFailure(format!("{}: {}", file.display(), e)))?;
        Ok((orientation, position))
    }
}

impl<S: TagScanner> SpatialSorter for IppSorter<S> {
    fn sort(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let tags = BTreeSet::from([IMAGE_ORIENTATION_PATIENT, IMAGE_POSITION_PATIENT]);
        let index = ScanIndex::scan(&self.scanner, files, &tags, UnreadablePolicy::Fail)?;

        let mut reference: Option<Orientation> = None;
        let mut slices = Vec::with_capacity(index.len());
        for file in index.files() {
            let (orientation, position) = Self::geometry(&index, file)?;
            let expected = *reference.get_or_insert(orientation);
            if !orientation.approx_eq(&expected, ORIENTATION_TOLERANCE) {
                return Err(UcdmError::SortFailure(format!(
                    "{} has a different orientation than the other slices",
                    file.display()
                )));
            }
            slices.push((distance_along(&expected.normal(), &position), file.to_path_buf()));
        }

        slices.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(pair) = slices
            .windows(2)
            .find(|w| (w[1].0 - w[0].0).abs() < POSITION_TOLERANCE)
        {
            return Err(UcdmError::SortFailure(format!(
                "{} and {} share slice position {}",
                pair[0].1.display(),
                pair[1].1.display(),
                pair[0].0
            )));
        }

        debug!("Sorted {} slices", slices.len());
        Ok(slices.into_iter().map(|(_, file)| file).collect())
    }
}
