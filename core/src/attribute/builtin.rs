use super::attribute::Attribute;
use crate::error::UcdmError;
use crate::subseries::SubseriesResolver;
use crate::types::{AttributeValue, Tag};

impl Attribute {
    /// The sole value of `tag` in the unit
    ///
    /// Named after the tag's keyword (or tag string).
    ///
    /// # Errors
    ///
    /// Evaluation returns [`UcdmError::InconsistentMetadata`] unless the
    /// unit carries exactly one distinct present value. Files lacking the
    /// tag do not count as a value.
    pub fn lookup_tag(tag: Tag) -> Attribute {
        Attribute::new([tag], move |index| {
            let values = index.partition_by(tag)?;
            let mut keys = values.keys();
            match (keys.next(), keys.next()) {
                (Some(value), None) => Ok(AttributeValue::Text(value.clone())),
                _ => Err(UcdmError::InconsistentMetadata {
                    unit: None,
                    tag,
                    distinct: values.len(),
                    files: index.file_set().into_iter().collect(),
                }),
            }
        })
        .named(tag.display_name())
    }

    /// Number of files in the unit
    pub fn number_of_slices() -> Attribute {
        Attribute::new([], |index| Ok(AttributeValue::Integer(index.len() as i64)))
            .named("number_of_slices")
    }

    /// Whether any indicator tag varies within the unit's series
    pub fn has_subseries(resolver: &SubseriesResolver) -> Attribute {
        let resolver = resolver.clone();
        Attribute::new(resolver.required_tags(), move |index| {
            Ok(AttributeValue::Bool(resolver.resolve(index)?.has_subseries()))
        })
        .named("has_subseries")
    }

    /// Keywords of the detected subseries axes, joined by `|`
    ///
    /// Empty text when the series is one coherent volume.
    pub fn subseries_axes(resolver: &SubseriesResolver) -> Attribute {
        let resolver = resolver.clone();
        Attribute::new(resolver.required_tags(), move |index| {
            let axes: Vec<String> = resolver
                .resolve(index)?
                .axis_tags()
                .map(|tag| tag.display_name())
                .collect();
            Ok(AttributeValue::Text(axes.join("|")))
        })
        .named("subseries_axes")
    }
}
