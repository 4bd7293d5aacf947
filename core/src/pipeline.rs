//! Scan-once, evaluate-per-unit extraction

use crate::attribute::{AttributeSet, AttributeValues};
use crate::error::{Result, UcdmError};
use crate::output::ResultTable;
use crate::scan::{ScanIndex, TagScanner, UnreadablePolicy};
use crate::types::Tag;
use crate::unit::{UnitKey, Unitizer, Units};
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Options for one extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// What to do with files the scanner cannot read
    pub unreadable: UnreadablePolicy,
}

impl ExtractionOptions {
    /// Builder: set the unreadable-file policy
    pub fn with_unreadable(mut self, policy: UnreadablePolicy) -> Self {
        self.unreadable = policy;
        self
    }
}

/// A unitizer and the attributes to evaluate on each of its units
///
/// # Example
///
/// ```
/// use ucdm_core::{Attribute, AttributeSet, ExtractionPipeline, MemoryScanner, Tag, Unitizer};
///
/// let series = Tag::new(0x0020, 0x000E);
/// let modality = Tag::new(0x0008, 0x0060);
/// let scanner = MemoryScanner::new()
///     .with_file("a", [(series, "S1"), (modality, "MR")])
///     .with_file("b", [(series, "S1"), (modality, "MR")])
///     .with_file("c", [(series, "S2"), (modality, "CT")]);
///
/// let attributes = AttributeSet::from_attributes([
///     Attribute::lookup_tag(modality),
///     Attribute::number_of_slices(),
/// ]).unwrap();
/// let pipeline = ExtractionPipeline::new(Unitizer::by_series(), attributes);
///
/// let extraction = pipeline.extract(&scanner, &scanner.files()).unwrap();
/// let table = extraction.into_table().unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.columns().collect::<Vec<_>>(), vec!["SeriesInstanceUID", "Modality", "number_of_slices"]);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    unitizer: Unitizer,
    attributes: AttributeSet,
    options: ExtractionOptions,
}

impl ExtractionPipeline {
    pub fn new(unitizer: Unitizer, attributes: AttributeSet) -> Self {
        Self {
            unitizer,
            attributes,
            options: ExtractionOptions::default(),
        }
    }

    /// Builder: set the extraction options
    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn unitizer(&self) -> &Unitizer {
        &self.unitizer
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn options(&self) -> ExtractionOptions {
        self.options
    }

    /// Union of the unitizer's and the attributes' tags
    pub fn required_tags(&self) -> BTreeSet<Tag> {
        let mut tags = self.unitizer.required_tags();
        tags.extend(self.attributes.required_tags());
        tags
    }

    /// Scans `files` once for all required tags
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::ScanFailure`] if the scan fails as a whole, or
    /// if a file is unreadable and the policy is [`UnreadablePolicy::Fail`]
    pub fn extract<S: TagScanner + ?Sized>(
        &self,
        scanner: &S,
        files: &[PathBuf],
    ) -> Result<Extraction<'_>> {
        let tags = self.required_tags();
        let index = ScanIndex::scan(scanner, files, &tags, self.options.unreadable)?;
        self.extract_from_index(index)
    }

    /// Uses an existing index instead of scanning
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::Configuration`] if the index lacks a required tag
    pub fn extract_from_index(&self, index: ScanIndex) -> Result<Extraction<'_>> {
        let missing: Vec<String> = self
            .required_tags()
            .into_iter()
            .filter(|t| !index.has_tag(*t))
            .map(|t| format!("{} ({})", t, t.display_name()))
            .collect();
        if !missing.is_empty() {
            return Err(UcdmError::Configuration(format!(
                "scan does not cover required tags: {}",
                missing.join(", ")
            )));
        }

        info!(
            "Extracting {} attributes from {} files",
            self.attributes.len(),
            index.len()
        );
        Ok(Extraction {
            pipeline: self,
            index,
        })
    }
}

/// A scanned index bound to the pipeline that requested it
///
/// Unit iteration is lazy and may be repeated; scanning is not.
#[derive(Debug)]
pub struct Extraction<'p> {
    pipeline: &'p ExtractionPipeline,
    index: ScanIndex,
}

impl<'p> Extraction<'p> {
    pub fn index(&self) -> &ScanIndex {
        &self.index
    }

    /// Releases the scanned index
    pub fn into_index(self) -> ScanIndex {
        self.index
    }

    /// The (key, unit) pairs of the scan
    pub fn units(&self) -> Result<Units<'_>> {
        self.pipeline.unitizer.items(&self.index)
    }

    /// Lazily evaluates the attribute set on each unit
    ///
    /// Each unit sees only its own files. An attribute error carries the
    /// unit key and ends nothing but that item.
    pub fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<(UnitKey, AttributeValues)>> + '_> {
        let attributes = &self.pipeline.attributes;
        let index = &self.index;
        Ok(self.units()?.map(move |(key, unit)| {
            debug!("Evaluating unit {} ({} files)", key, unit.len());
            let evaluated = unit
                .scan_index(index)
                .and_then(|local| attributes.evaluate(&local));
            match evaluated {
                Ok(values) => Ok((key, values)),
                Err(e) => Err(e.with_unit(&key)),
            }
        }))
    }

    /// Evaluates every unit, stopping at the first error
    pub fn collect_records(&self) -> Result<Vec<(UnitKey, AttributeValues)>> {
        self.records()?.collect()
    }

    /// Evaluates every unit into a table
    pub fn into_table(self) -> Result<ResultTable> {
        let mut table = ResultTable::new(
            self.pipeline.unitizer.key_names(),
            self.pipeline.attributes.names().map(str::to_string).collect(),
        );
        for record in self.records()? {
            let (key, values) = record?;
            table.push(key, values)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::scan::MemoryScanner;
    use crate::tags::{ACQUISITION_NUMBER, MODALITY, SERIES_INSTANCE_UID};
    use crate::types::AttributeValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn scanner() -> MemoryScanner {
        MemoryScanner::new()
            .with_file("s1/1", [(SERIES_INSTANCE_UID, "S1"), (ACQUISITION_NUMBER, "1"), (MODALITY, "MR")])
            .with_file("s1/2", [(SERIES_INSTANCE_UID, "S1"), (ACQUISITION_NUMBER, "2"), (MODALITY, "MR")])
            .with_file("s2/1", [(SERIES_INSTANCE_UID, "S2"), (ACQUISITION_NUMBER, "1"), (MODALITY, "CT")])
            .with_file("s2/2", [(SERIES_INSTANCE_UID, "S2"), (ACQUISITION_NUMBER, "2"), (MODALITY, "MR")])
            .with_file("loose", [(MODALITY, "OT")])
    }

    fn attributes() -> AttributeSet {
        AttributeSet::from_attributes([Attribute::lookup_tag(MODALITY), Attribute::number_of_slices()])
            .unwrap()
    }

    /// Counts how often the scanner is invoked
    struct CountingScanner {
        inner: MemoryScanner,
        calls: AtomicUsize,
    }

    impl TagScanner for CountingScanner {
        fn scan(&self, files: &[PathBuf], tags: &BTreeSet<Tag>) -> Result<crate::scan::RawScan> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.scan(files, tags)
        }
    }

    #[test]
    fn test_required_tags_are_union() {
        let pipeline = ExtractionPipeline::new(
            Unitizer::hierarchical([SERIES_INSTANCE_UID, ACQUISITION_NUMBER]).unwrap(),
            attributes(),
        );
        assert_eq!(
            pipeline.required_tags(),
            BTreeSet::from([SERIES_INSTANCE_UID, ACQUISITION_NUMBER, MODALITY])
        );
    }

    #[test]
    fn test_scans_once_and_is_restartable() {
        let counting = CountingScanner {
            inner: scanner(),
            calls: AtomicUsize::new(0),
        };
        let pipeline = ExtractionPipeline::new(
            Unitizer::hierarchical([SERIES_INSTANCE_UID, ACQUISITION_NUMBER]).unwrap(),
            attributes(),
        );
        let extraction = pipeline.extract(&counting, &counting.inner.files()).unwrap();

        let first = extraction.collect_records().unwrap();
        let second = extraction.collect_records().unwrap();
        assert_eq!(first, second);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        let keys: Vec<String> = first.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["S1|1", "S1|2", "S2|1", "S2|2"]);
        assert_eq!(first[2].1.get("Modality"), Some(&AttributeValue::from("CT")));
        assert_eq!(first[3].1.get("number_of_slices"), Some(&AttributeValue::Integer(1)));
    }

    #[test]
    fn test_inconsistent_unit_carries_key() {
        let pipeline = ExtractionPipeline::new(Unitizer::by_series(), attributes());
        let scanner = scanner();
        let extraction = pipeline.extract(&scanner, &scanner.files()).unwrap();

        let records: Vec<_> = extraction.records().unwrap().collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        match &records[1] {
            Err(UcdmError::InconsistentMetadata {
                unit, tag, files, ..
            }) => {
                assert_eq!(unit.as_deref(), Some("S2"));
                assert_eq!(*tag, MODALITY);
                assert_eq!(files.len(), 2);
            }
            other => panic!("expected inconsistent metadata, got {:?}", other),
        }
        assert!(extraction.into_table().is_err());
    }

    #[test]
    fn test_units_see_only_their_files() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let attribute = Attribute::new([SERIES_INSTANCE_UID], move |index| {
            counter.fetch_add(index.len(), Ordering::SeqCst);
            Ok(AttributeValue::Integer(index.values_of(SERIES_INSTANCE_UID)?.len() as i64))
        });
        let attributes = AttributeSet::new().with("series_count", attribute).unwrap();
        let pipeline = ExtractionPipeline::new(Unitizer::by_series(), attributes);
        let scanner = scanner();

        let table = pipeline
            .extract(&scanner, &scanner.files())
            .unwrap()
            .into_table()
            .unwrap();
        for (_, values) in table.rows() {
            assert_eq!(values.get("series_count"), Some(&AttributeValue::Integer(1)));
        }
        // "loose" has no series and is never evaluated
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_extract_from_index_validates_tags() {
        let scanner = scanner();
        let index = ScanIndex::scan(
            &scanner,
            &scanner.files(),
            &BTreeSet::from([SERIES_INSTANCE_UID]),
            UnreadablePolicy::Fail,
        )
        .unwrap();
        let pipeline = ExtractionPipeline::new(Unitizer::by_series(), attributes());
        assert!(matches!(
            pipeline.extract_from_index(index),
            Err(UcdmError::Configuration(_))
        ));
    }

    #[test]
    fn test_unreadable_policy() {
        let scanner = scanner().with_unreadable("broken");
        let mut files = scanner.files();
        files.push(PathBuf::from("broken"));
        let pipeline = ExtractionPipeline::new(
            Unitizer::single(MODALITY),
            AttributeSet::from_attributes([Attribute::number_of_slices()]).unwrap(),
        );

        assert!(matches!(
            pipeline.extract(&scanner, &files),
            Err(UcdmError::ScanFailure(_))
        ));

        let lenient = pipeline.with_options(ExtractionOptions::default().with_unreadable(UnreadablePolicy::Skip));
        let table = lenient.extract(&scanner, &files).unwrap().into_table().unwrap();
        assert_eq!(table.len(), 3);
    }
}
