//! Tabular form of extraction results
//!
//! One row per unit: the unit-key columns first, then the attribute
//! columns in attribute-set order.

use crate::attribute::AttributeValues;
use crate::error::{Result, UcdmError};
use crate::unit::UnitKey;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Extraction results as rows of (unit key, attribute values)
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ResultTable {
    key_columns: Vec<String>,
    attribute_columns: Vec<String>,
    rows: Vec<(UnitKey, AttributeValues)>,
}

impl ResultTable {
    pub fn new(key_columns: Vec<String>, attribute_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            attribute_columns,
            rows: Vec::new(),
        }
    }

    /// Appends one unit's row
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::InvalidValue`] if the key length or the value
    /// names do not match the table's columns
    pub fn push(&mut self, key: UnitKey, values: AttributeValues) -> Result<()> {
        if key.len() != self.key_columns.len() {
            return Err(UcdmError::InvalidValue(format!(
                "unit key '{}' has {} components, table has {} key columns",
                key,
                key.len(),
                self.key_columns.len()
            )));
        }
        if !values.names().eq(self.attribute_columns.iter().map(String::as_str)) {
            return Err(UcdmError::InvalidValue(format!(
                "values for unit '{}' do not match the attribute columns",
                key
            )));
        }
        self.rows.push((key, values));
        Ok(())
    }

    /// Appends the rows of `other`
    ///
    /// # Errors
    ///
    /// Returns [`UcdmError::MergeConflict`] if the column sets differ
    pub fn append(&mut self, other: ResultTable) -> Result<()> {
        if self.key_columns != other.key_columns || self.attribute_columns != other.attribute_columns
        {
            return Err(UcdmError::MergeConflict(
                "result tables have different columns".to_string(),
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    /// All column names: key columns, then attribute columns
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.key_columns
            .iter()
            .chain(self.attribute_columns.iter())
            .map(String::as_str)
    }

    pub fn rows(&self) -> &[(UnitKey, AttributeValues)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the table as CSV
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.columns())?;
        for (key, values) in &self.rows {
            let record: Vec<String> = key
                .values()
                .iter()
                .cloned()
                .chain(values.iter().map(|(_, v)| v.to_string()))
                .collect();
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Writes the table to a CSV file
    pub fn to_csv_path(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeSet};
    use crate::scan::{index_ab, A};

    fn values(a: &str) -> AttributeValues {
        let index = index_ab(&[("f1", Some(a), None)]);
        AttributeSet::new()
            .with("a", Attribute::lookup_tag(A))
            .unwrap()
            .with("n", Attribute::number_of_slices())
            .unwrap()
            .evaluate(&index)
            .unwrap()
    }

    fn table() -> ResultTable {
        ResultTable::new(
            vec!["SeriesInstanceUID".to_string()],
            vec!["a".to_string(), "n".to_string()],
        )
    }

    #[test]
    fn test_push_checks_columns() {
        let mut t = table();
        t.push(UnitKey::single("1.2"), values("x")).unwrap();
        assert!(t
            .push(UnitKey::new(vec!["1".into(), "2".into()]), values("y"))
            .is_err());
        let mut other = ResultTable::new(vec!["k".to_string()], vec!["n".to_string()]);
        assert!(other.push(UnitKey::single("1"), values("z")).is_err());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_write_csv() {
        let mut t = table();
        t.push(UnitKey::single("1.2"), values("x")).unwrap();
        t.push(UnitKey::single("1.3"), values("y,z")).unwrap();

        let mut buf = Vec::new();
        t.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["SeriesInstanceUID,a,n", "1.2,x,1", "1.3,\"y,z\",1"]);
    }

    #[test]
    fn test_append() {
        let mut t = table();
        t.push(UnitKey::single("1.2"), values("x")).unwrap();
        let mut u = table();
        u.push(UnitKey::single("1.3"), values("y")).unwrap();
        t.append(u).unwrap();
        assert_eq!(t.len(), 2);

        assert!(t.append(ResultTable::default()).is_err());
    }
}
