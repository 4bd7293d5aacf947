use super::resolver::Subseries;
use crate::error::{Result, UcdmError};
use crate::scan::Grouping;
use crate::types::Tag;
use log::info;
use std::path::PathBuf;

/// Orders the files of one volume along the slice axis
///
/// Failing to order is an error; implementations never fall back to the
/// input order.
pub trait SpatialSorter {
    fn sort(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

/// Builds a volume from spatially ordered files
pub trait VolumeLoader {
    type Volume;

    fn load(&self, ordered: &[PathBuf]) -> Result<Self::Volume>;
}

/// Loads a resolved series, whole or per subseries
///
/// # Example
///
/// ```
/// use ucdm_core::{
///     MemoryScanner, ScanIndex, SeriesLoader, SpatialSorter, SubseriesResolver, UnreadablePolicy,
///     VolumeLoader, Result, Tag,
/// };
/// use std::path::PathBuf;
///
/// struct ByName;
/// impl SpatialSorter for ByName {
///     fn sort(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
///         let mut out = files.to_vec();
///         out.sort();
///         Ok(out)
///     }
/// }
///
/// struct CountSlices;
/// impl VolumeLoader for CountSlices {
///     type Volume = usize;
///     fn load(&self, ordered: &[PathBuf]) -> Result<usize> {
///         Ok(ordered.len())
///     }
/// }
///
/// let series = Tag::new(0x0020, 0x000E);
/// let scanner = MemoryScanner::new()
///     .with_file("a", [(series, "S1")])
///     .with_file("b", [(series, "S1")]);
/// let resolver = SubseriesResolver::default();
/// let index = ScanIndex::scan(&scanner, &scanner.files(), &resolver.required_tags(), UnreadablePolicy::Fail).unwrap();
/// let subseries = resolver.resolve(&index).unwrap();
///
/// let loader = SeriesLoader::new(ByName, CountSlices);
/// assert_eq!(loader.load_series(&subseries).unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SeriesLoader<S, L> {
    sorter: S,
    loader: L,
}

impl<S: SpatialSorter, L: VolumeLoader> SeriesLoader<S, L> {
    pub fn new(sorter: S, loader: L) -> Self {
        Self { sorter, loader }
    }

    fn load_files(&self, files: impl IntoIterator<Item = PathBuf>) -> Result<L::Volume> {
        let files: Vec<PathBuf> = files.into_iter().collect();
        let ordered = self.sorter.sort(&files)?;
        self.loader.load(&ordered)
    }

    /// Loads the whole series as one volume
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if the series has subseries
    pub fn load_series(&self, subseries: &Subseries) -> Result<L::Volume> {
        if subseries.has_subseries() {
            let axes: Vec<String> = subseries.axis_tags().map(|t| t.display_name()).collect();
            return Err(UcdmError::Configuration(format!(
                "series {} has subseries along {}; load them one by one",
                subseries.series_id(),
                axes.join(", ")
            )));
        }
        info!(
            "Loading series {} ({} files)",
            subseries.series_id(),
            subseries.len()
        );
        self.load_files(subseries.files())
    }

    /// Loads one volume per value of a subseries axis, in value order
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if `tag` is not an axis of the
    /// series
    pub fn load_subseries(&self, subseries: &Subseries, tag: Tag) -> Result<Vec<(String, L::Volume)>> {
        let grouping = Self::axis(subseries, tag)?;
        info!(
            "Loading {} subseries of {} along {}",
            grouping.len(),
            subseries.series_id(),
            tag.display_name()
        );
        grouping
            .iter()
            .map(|(value, files)| Ok((value.clone(), self.load_files(files.iter().cloned())?)))
            .collect()
    }

    /// Loads the subseries with `tag` equal to `value`
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if `tag` is not an axis, or
    /// [`UcdmError::InvalidValue`] if no file has that value
    pub fn load_subseries_value(
        &self,
        subseries: &Subseries,
        tag: Tag,
        value: &str,
    ) -> Result<L::Volume> {
        let files = Self::axis(subseries, tag)?.get(value).ok_or_else(|| {
            UcdmError::InvalidValue(format!(
                "no {} = '{}' in series {}",
                tag.display_name(),
                value,
                subseries.series_id()
            ))
        })?;
        self.load_files(files.iter().cloned())
    }

    fn axis(subseries: &Subseries, tag: Tag) -> Result<&Grouping> {
        subseries.axis(tag).ok_or_else(|| {
            UcdmError::Configuration(format!(
                "{} is not a subseries axis of series {}",
                tag.display_name(),
                subseries.series_id()
            ))
        })
    }
}
