use crate::error::{Result, UcdmError};
use crate::scan::{Grouping, ScanIndex};
use crate::tags::{MULTI_VOLUME_ALIAS, MULTI_VOLUME_TAGS, SERIES_INSTANCE_UID};
use crate::types::{Tag, TagConfig};
use crate::unit::{Unit, UnitKey, Unitizer};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Detects hidden volumes inside one series
///
/// Every indicator tag is checked on its own: a tag with more than one
/// present value inside the series becomes a subseries axis. Axes are not
/// intersected; see [`Subseries::joint_partition`] for that.
///
/// # Example
///
/// ```
/// use ucdm_core::{MemoryScanner, ScanIndex, SubseriesResolver, Tag, UnreadablePolicy};
///
/// let resolver = SubseriesResolver::default();
/// let series = Tag::new(0x0020, 0x000E);
/// let acq = Tag::new(0x0020, 0x0012);
/// let scanner = MemoryScanner::new()
///     .with_file("a", [(series, "S1"), (acq, "1")])
///     .with_file("b", [(series, "S1"), (acq, "2")]);
/// let index = ScanIndex::scan(&scanner, &scanner.files(), &resolver.required_tags(), UnreadablePolicy::Fail).unwrap();
///
/// let subseries = resolver.resolve(&index).unwrap();
/// assert!(subseries.has_subseries());
/// assert_eq!(subseries.axis_tags().collect::<Vec<_>>(), vec![acq]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubseriesResolver {
    indicator_tags: BTreeSet<Tag>,
    series_tag: Tag,
}

impl Default for SubseriesResolver {
    fn default() -> Self {
        Self::new(MULTI_VOLUME_TAGS, SERIES_INSTANCE_UID)
    }
}

impl SubseriesResolver {
    pub fn new(indicator_tags: impl IntoIterator<Item = Tag>, series_tag: Tag) -> Self {
        Self {
            indicator_tags: indicator_tags.into_iter().collect(),
            series_tag,
        }
    }

    /// Indicator tags taken from the multi-volume alias of `config`
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if the alias is not registered
    pub fn from_config(config: &TagConfig) -> Result<Self> {
        let tags = config.alias(MULTI_VOLUME_ALIAS).ok_or_else(|| {
            UcdmError::Configuration(format!("tag alias '{}' is not defined", MULTI_VOLUME_ALIAS))
        })?;
        Ok(Self::new(tags.iter().copied(), SERIES_INSTANCE_UID))
    }

    pub fn indicator_tags(&self) -> &BTreeSet<Tag> {
        &self.indicator_tags
    }

    /// Primary grouping tag
    pub fn series_tag(&self) -> Tag {
        self.series_tag
    }

    /// Indicator tags plus the series tag
    pub fn required_tags(&self) -> BTreeSet<Tag> {
        let mut tags = self.indicator_tags.clone();
        tags.insert(self.series_tag);
        tags
    }

    fn validate(&self, index: &ScanIndex) -> Result<()> {
        match self.required_tags().into_iter().find(|t| !index.has_tag(*t)) {
            Some(missing) => Err(UcdmError::Configuration(format!(
                "subseries tag {} ({}) is not part of the scan",
                missing,
                missing.display_name()
            ))),
            None => Ok(()),
        }
    }

    /// Distinct series in `index`, sorted
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::InvalidValue`] if no file carries the series tag
    pub fn series_ids(&self, index: &ScanIndex) -> Result<Vec<String>> {
        let ids: Vec<String> = index.values_of(self.series_tag)?.into_iter().collect();
        if ids.is_empty() {
            return Err(UcdmError::InvalidValue(format!(
                "no {} found in {} file(s)",
                self.series_tag.display_name(),
                index.len()
            )));
        }
        Ok(ids)
    }

    /// Detects subseries axes of a single-series index
    ///
    /// # Errors
    ///
    /// - [`UcdmError::Configuration`] if a required tag was not scanned
    /// - [`UcdmError::InconsistentMetadata`] if the index does not hold
    ///   exactly one series
    pub fn resolve(&self, index: &ScanIndex) -> Result<Subseries> {
        self.validate(index)?;

        let series = index.partition_by(self.series_tag)?;
        let series_id = match series.keys().next() {
            Some(id) if series.len() == 1 => id.clone(),
            _ => {
                return Err(UcdmError::InconsistentMetadata {
                    unit: None,
                    tag: self.series_tag,
                    distinct: series.len(),
                    files: index.file_set().into_iter().collect(),
                })
            }
        };

        let mut axes = BTreeMap::new();
        for tag in &self.indicator_tags {
            let grouping = index.partition_by(*tag)?;
            if grouping.len() > 1 {
                debug!(
                    "Series {}: {} takes {} values",
                    series_id,
                    tag.display_name(),
                    grouping.len()
                );
                axes.insert(*tag, grouping);
            }
        }

        Ok(Subseries {
            series_id,
            index: index.clone(),
            axes,
        })
    }

    /// Restricts a multi-series index to `series_id` and resolves it
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::InvalidValue`] if no file belongs to the series
    pub fn resolve_series(&self, index: &ScanIndex, series_id: &str) -> Result<Subseries> {
        self.validate(index)?;
        let series = index.filter_tag(self.series_tag, series_id)?;
        if series.is_empty() {
            return Err(UcdmError::InvalidValue(format!(
                "no files for series '{}'",
                series_id
            )));
        }
        self.resolve(&series)
    }
}

/// Distinct SeriesInstanceUIDs in `index`
///
/// # Errors
///
/// Returns an error if the tag was not scanned or no file carries it
pub fn series_ids(index: &ScanIndex) -> Result<Vec<String>> {
    SubseriesResolver::default().series_ids(index)
}

/// Subseries axes detected in one series
#[derive(Debug, Clone)]
pub struct Subseries {
    series_id: String,
    index: ScanIndex,
    axes: BTreeMap<Tag, Grouping>,
}

impl Subseries {
    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    /// The series' files
    pub fn files(&self) -> BTreeSet<PathBuf> {
        self.index.file_set()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The series-local index
    pub fn index(&self) -> &ScanIndex {
        &self.index
    }

    /// True iff at least one indicator tag varies
    pub fn has_subseries(&self) -> bool {
        !self.axes.is_empty()
    }

    /// Tags along which the series splits
    pub fn axis_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.axes.keys().copied()
    }

    /// Value → files buckets of one axis
    pub fn axis(&self, tag: Tag) -> Option<&Grouping> {
        self.axes.get(&tag)
    }

    pub fn axes(&self) -> &BTreeMap<Tag, Grouping> {
        &self.axes
    }

    /// Joint partition of the series over several tags
    ///
    /// Nests the tags left to right; files lacking any of them fall out.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or repeated tag list, or
    /// a tag outside the scan
    pub fn joint_partition(&self, tags: &[Tag]) -> Result<Vec<(UnitKey, Unit)>> {
        let unitizer = Unitizer::hierarchical(tags.iter().copied())?;
        let units = unitizer.items(&self.index)?.collect();
        Ok(units)
    }
}
