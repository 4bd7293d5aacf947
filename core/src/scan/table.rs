//! CSV round-trip for [`ScanIndex`]
//!
//! Layout: a `file` column, then one column per tag named by its keyword
//! (or `gggg|eeee` when it has none). Absent values are written as empty
//! cells and empty cells are read back as absent, so a present empty
//! string does not survive the round-trip.

use super::index::ScanIndex;
use crate::error::{Result, UcdmError};
use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const FILE_COLUMN: &str = "file";

impl ScanIndex {
    /// Writes the index as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header = vec![FILE_COLUMN.to_string()];
        header.extend(self.tags().iter().map(Tag::display_name));
        out.write_record(&header)?;

        for file in self.files() {
            let row = self.row(file)?;
            let mut record = vec![file.display().to_string()];
            record.extend(
                self.tags()
                    .iter()
                    .map(|t| row.value(*t).as_str().unwrap_or_default().to_string()),
            );
            out.write_record(&record)?;
        }

        out.flush()?;
        Ok(())
    }

    /// Reads an index previously written by [`ScanIndex::write_csv`]
    ///
    /// Column headers may be keywords or tag strings.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut input = csv::Reader::from_reader(reader);

        let headers = input.headers()?.clone();
        if headers.get(0) != Some(FILE_COLUMN) {
            return Err(UcdmError::InvalidValue(format!(
                "first CSV column must be '{}'",
                FILE_COLUMN
            )));
        }
        let columns = headers
            .iter()
            .skip(1)
            .map(|h| h.parse::<Tag>())
            .collect::<Result<Vec<_>>>()?;
        let tags: BTreeSet<Tag> = columns.iter().copied().collect();
        if tags.len() != columns.len() {
            return Err(UcdmError::InvalidValue(
                "duplicate tag columns in CSV header".to_string(),
            ));
        }

        let mut rows = BTreeMap::new();
        for record in input.records() {
            let record = record?;
            let file = PathBuf::from(record.get(0).unwrap_or_default());
            let row = columns
                .iter()
                .enumerate()
                .map(|(i, tag)| {
                    let cell = record.get(i + 1).unwrap_or_default();
                    (*tag, (!cell.is_empty()).then(|| cell.to_string()))
                })
                .collect();
            if rows.insert(file.clone(), row).is_some() {
                return Err(UcdmError::InvalidValue(format!(
                    "file listed twice in CSV: {}",
                    file.display()
                )));
            }
        }

        ScanIndex::from_rows(tags, rows)
    }

    /// Writes the index to a CSV file
    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    /// Reads an index from a CSV file
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Self::read_csv(File::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{ACQUISITION_NUMBER, SERIES_INSTANCE_UID};
    use crate::types::ScanValue;

    fn sample() -> ScanIndex {
        let private = Tag::new(0x0029, 0x1010);
        let tags = BTreeSet::from([SERIES_INSTANCE_UID, ACQUISITION_NUMBER, private]);
        let rows = BTreeMap::from([
            (
                PathBuf::from("dir/a.dcm"),
                BTreeMap::from([
                    (SERIES_INSTANCE_UID, Some("1.2".to_string())),
                    (ACQUISITION_NUMBER, Some("1".to_string())),
                    (private, None),
                ]),
            ),
            (
                PathBuf::from("dir/b.dcm"),
                BTreeMap::from([
                    (SERIES_INSTANCE_UID, Some("1.2".to_string())),
                    (ACQUISITION_NUMBER, None),
                    (private, Some("v,with comma".to_string())),
                ]),
            ),
        ]);
        ScanIndex::from_rows(tags, rows).unwrap()
    }

    #[test]
    fn test_csv_header_uses_keywords() {
        let mut buf = Vec::new();
        sample().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "file,SeriesInstanceUID,AcquisitionNumber,0029|1010"
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let index = sample();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.csv");
        index.to_csv_path(&path).unwrap();

        let back = ScanIndex::from_csv_path(&path).unwrap();
        assert_eq!(back, index);
        assert_eq!(
            back.get(Path::new("dir/b.dcm"), ACQUISITION_NUMBER).unwrap(),
            ScanValue::Absent
        );
    }

    #[test]
    fn test_csv_round_trip_keeps_range_tags() {
        let overlay = Tag::new(0x6002, 0x0010);
        let creator = Tag::new(0x0029, 0x0010);
        let rows = BTreeMap::from([(
            PathBuf::from("a"),
            BTreeMap::from([
                (overlay, Some("512".to_string())),
                (creator, Some("ACME 1.0".to_string())),
            ]),
        )]);
        let index = ScanIndex::from_rows(BTreeSet::from([overlay, creator]), rows).unwrap();

        let mut buf = Vec::new();
        index.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().next().unwrap(), "file,0029|0010,6002|0010");

        let back = ScanIndex::read_csv(text.as_bytes()).unwrap();
        assert_eq!(back, index);
        assert_eq!(back.tags(), &BTreeSet::from([overlay, creator]));
    }

    #[test]
    fn test_read_csv_rejects_bad_header() {
        let input = "path,SeriesInstanceUID\na,1\n";
        assert!(ScanIndex::read_csv(input.as_bytes()).is_err());

        let input = "file,SeriesInstanceUID,0020|000e\na,1,1\n";
        assert!(ScanIndex::read_csv(input.as_bytes()).is_err());
    }
}
