use crate::subseries::Subseries;
use std::fmt;

/// Text report of the subseries found in each series
pub struct TextReport<'a> {
    series: &'a [Subseries],
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(series: &'a [Subseries]) -> Self {
        Self { series }
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subseries Report")?;
        writeln!(f, "================")?;

        for subseries in self.series {
            writeln!(f)?;
            writeln!(
                f,
                "Series {} ({} files)",
                subseries.series_id(),
                subseries.len()
            )?;
            if !subseries.has_subseries() {
                writeln!(f, "  single volume")?;
                continue;
            }
            for (tag, grouping) in subseries.axes() {
                writeln!(
                    f,
                    "  {} {}: {} values",
                    tag,
                    tag.display_name(),
                    grouping.len()
                )?;
                for (value, files) in grouping.iter() {
                    writeln!(f, "    {:<24} {} files", value, files.len())?;
                }
            }
        }

        let split = self.series.iter().filter(|s| s.has_subseries()).count();
        writeln!(f)?;
        writeln!(
            f,
            "{} of {} series have subseries",
            split,
            self.series.len()
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{MemoryScanner, ScanIndex, UnreadablePolicy};
    use crate::subseries::SubseriesResolver;
    use crate::tags::{ACQUISITION_NUMBER, SERIES_INSTANCE_UID};

    #[test]
    fn test_text_report_format() {
        let scanner = MemoryScanner::new()
            .with_file("a", [(SERIES_INSTANCE_UID, "1.2.1"), (ACQUISITION_NUMBER, "1")])
            .with_file("b", [(SERIES_INSTANCE_UID, "1.2.1"), (ACQUISITION_NUMBER, "2")])
            .with_file("c", [(SERIES_INSTANCE_UID, "1.2.2"), (ACQUISITION_NUMBER, "1")]);
        let resolver = SubseriesResolver::default();
        let index = ScanIndex::scan(
            &scanner,
            &scanner.files(),
            &resolver.required_tags(),
            UnreadablePolicy::Fail,
        )
        .unwrap();
        let series: Vec<Subseries> = resolver
            .series_ids(&index)
            .unwrap()
            .iter()
            .map(|id| resolver.resolve_series(&index, id).unwrap())
            .collect();

        let output = format!("{}", TextReport::new(&series));

        assert!(output.contains("Subseries Report"));
        assert!(output.contains("Series 1.2.1 (2 files)"));
        assert!(output.contains("  (0020,0012) AcquisitionNumber: 2 values"));
        assert!(output.contains("Series 1.2.2 (1 files)\n  single volume"));
        assert!(output.contains("1 of 2 series have subseries"));
    }
}
