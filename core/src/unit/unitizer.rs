use super::unit::{Unit, UnitKey};
use crate::error::{Result, UcdmError};
use crate::scan::ScanIndex;
use crate::tags::SERIES_INSTANCE_UID;
use crate::types::Tag;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Lazy sequence of (key, unit) pairs
pub type Units<'a> = Box<dyn Iterator<Item = (UnitKey, Unit)> + 'a>;

/// Strategy partitioning a scan into units
///
/// Units from one [`Unitizer::items`] call are pairwise disjoint. Files
/// lacking a unitizing tag belong to no unit.
///
/// # Example
///
/// ```
/// use ucdm_core::{MemoryScanner, ScanIndex, Tag, Unitizer, UnreadablePolicy};
/// use std::path::PathBuf;
///
/// let series = Tag::new(0x0020, 0x000E);
/// let acq = Tag::new(0x0020, 0x0012);
/// let scanner = MemoryScanner::new()
///     .with_file("a", [(series, "S1"), (acq, "1")])
///     .with_file("b", [(series, "S1"), (acq, "2")])
///     .with_file("c", [(series, "S2"), (acq, "1")]);
///
/// let unitizer = Unitizer::hierarchical([series, acq]).unwrap();
/// let index = ScanIndex::scan(&scanner, &scanner.files(), &unitizer.required_tags(), UnreadablePolicy::Fail).unwrap();
///
/// let keys: Vec<String> = unitizer.items(&index).unwrap().map(|(k, _)| k.to_string()).collect();
/// assert_eq!(keys, vec!["S1|1", "S1|2", "S2|1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unitizer {
    /// One unit per present value of the tag
    SingleTag(Tag),
    /// Nested partitioning by each tag in turn
    Hierarchical(Hierarchy),
    /// Units of the second unitizer within each unit of the first;
    /// keys are concatenated
    Merge(Box<Unitizer>, Box<Unitizer>),
}

/// Tag list of a hierarchical unitizer and its composed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    tags: Vec<Tag>,
    composed: Box<Unitizer>,
}

impl Hierarchy {
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

impl Unitizer {
    /// Units by one tag
    pub fn single(tag: Tag) -> Self {
        Unitizer::SingleTag(tag)
    }

    /// Units by SeriesInstanceUID
    pub fn by_series() -> Self {
        Unitizer::SingleTag(SERIES_INSTANCE_UID)
    }

    /// Nested units by `tags`, left to right
    ///
    /// Built as the right fold `Merge(t1, Merge(t2, ... tn))`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `tags` is empty or repeats a tag
    pub fn hierarchical(tags: impl IntoIterator<Item = Tag>) -> Result<Self> {
        let tags: Vec<Tag> = tags.into_iter().collect();
        let distinct: BTreeSet<&Tag> = tags.iter().collect();
        if distinct.len() != tags.len() {
            return Err(UcdmError::Configuration(
                "hierarchical unitizer repeats a tag".to_string(),
            ));
        }

        let mut rev = tags.iter().rev().map(|t| Unitizer::SingleTag(*t));
        let innermost = rev.next().ok_or_else(|| {
            UcdmError::Configuration("hierarchical unitizer needs at least one tag".to_string())
        })?;
        let composed = rev.fold(innermost, |inner, outer| {
            Unitizer::Merge(Box::new(outer), Box::new(inner))
        });

        Ok(Unitizer::Hierarchical(Hierarchy {
            tags,
            composed: Box::new(composed),
        }))
    }

    /// Units of `inner` within each unit of `outer`
    pub fn merge(outer: Unitizer, inner: Unitizer) -> Self {
        Unitizer::Merge(Box::new(outer), Box::new(inner))
    }

    /// Tags the unitizer reads
    pub fn required_tags(&self) -> BTreeSet<Tag> {
        match self {
            Unitizer::SingleTag(tag) => BTreeSet::from([*tag]),
            Unitizer::Hierarchical(h) => h.tags.iter().copied().collect(),
            Unitizer::Merge(a, b) => {
                let mut tags = a.required_tags();
                tags.extend(b.required_tags());
                tags
            }
        }
    }

    /// Column names of the key components (keyword or tag string)
    pub fn key_names(&self) -> Vec<String> {
        match self {
            Unitizer::SingleTag(tag) => vec![tag.display_name()],
            Unitizer::Hierarchical(h) => h.composed.key_names(),
            Unitizer::Merge(a, b) => {
                let mut names = a.key_names();
                names.extend(b.key_names());
                names
            }
        }
    }

    /// Checks that every required tag was scanned
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] naming the first missing tag
    pub fn validate(&self, index: &ScanIndex) -> Result<()> {
        match self.required_tags().into_iter().find(|t| !index.has_tag(*t)) {
            Some(missing) => Err(UcdmError::Configuration(format!(
                "unitizer tag {} ({}) is not part of the scan",
                missing,
                missing.display_name()
            ))),
            None => Ok(()),
        }
    }

    /// Partitions `index` into keyed units, ordered by key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a unitizing tag was not scanned
    pub fn items<'a>(&'a self, index: &'a ScanIndex) -> Result<Units<'a>> {
        self.validate(index)?;
        Ok(self.iter_units(index))
    }

    // Tags are validated by `items`
    fn iter_units<'a>(&'a self, index: &'a ScanIndex) -> Units<'a> {
        match self {
            Unitizer::SingleTag(tag) => {
                let grouping = index.partition_by(*tag).unwrap_or_default();
                let units: Vec<(UnitKey, Unit)> = grouping
                    .iter()
                    .map(|(value, files)| (UnitKey::single(value.clone()), Unit::new(Arc::clone(files))))
                    .collect();
                Box::new(units.into_iter())
            }
            Unitizer::Hierarchical(h) => h.composed.iter_units(index),
            Unitizer::Merge(outer, inner) => {
                Box::new(outer.iter_units(index).flat_map(move |(outer_key, outer_unit)| {
                    let sub = index.restrict(outer_unit.files());
                    inner
                        .iter_units(&sub)
                        .map(|(inner_key, unit)| (outer_key.clone().concat(inner_key), unit))
                        .collect::<Vec<_>>()
                }))
            }
        }
    }
}
