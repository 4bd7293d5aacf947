use crate::error::Result;
use crate::scan::ScanIndex;
use crate::types::{AttributeValue, Tag};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

type AttributeFn = dyn Fn(&ScanIndex) -> Result<AttributeValue> + Send + Sync;

/// Pure per-unit computation with declared tag dependencies
///
/// An attribute is evaluated on the unit-local [`ScanIndex`] and may only
/// read the tags it declares. Cloning is cheap; the function is shared.
///
/// # Example
///
/// ```
/// use ucdm_core::{Attribute, AttributeValue, MemoryScanner, ScanIndex, Tag, UnreadablePolicy};
///
/// let modality = Tag::new(0x0008, 0x0060);
/// let scanner = MemoryScanner::new()
///     .with_file("a", [(modality, "CT")])
///     .with_file("b", [(modality, "CT")]);
/// let index = ScanIndex::scan(&scanner, &scanner.files(), &[modality].into(), UnreadablePolicy::Fail).unwrap();
///
/// let is_ct = Attribute::lookup_tag(modality)
///     .map(|v| Ok(AttributeValue::Bool(v.as_text() == Some("CT"))))
///     .renamed("IsCT");
/// assert_eq!(is_ct.default_name(), Some("IsCT"));
/// assert_eq!(is_ct.evaluate(&index).unwrap(), AttributeValue::Bool(true));
/// ```
#[derive(Clone)]
pub struct Attribute {
    tags: BTreeSet<Tag>,
    default_name: Option<String>,
    function: Arc<AttributeFn>,
}

impl Attribute {
    /// Creates an attribute reading `tags`
    pub fn new<F>(tags: impl IntoIterator<Item = Tag>, function: F) -> Self
    where
        F: Fn(&ScanIndex) -> Result<AttributeValue> + Send + Sync + 'static,
    {
        Self {
            tags: tags.into_iter().collect(),
            default_name: None,
            function: Arc::new(function),
        }
    }

    /// Builder: set the default column name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Tags the attribute reads
    pub fn required_tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    /// Evaluates the attribute on a unit-local index
    pub fn evaluate(&self, unit_index: &ScanIndex) -> Result<AttributeValue> {
        (self.function)(unit_index)
    }

    /// Wraps the attribute in a post-processing step
    ///
    /// The new attribute reads the union of the original tags and
    /// `extra_tags`; the post-processor sees the original value and the
    /// same unit-local index. Without `rename` the default name is kept.
    pub fn modify<P>(
        &self,
        post_process: P,
        extra_tags: impl IntoIterator<Item = Tag>,
        rename: Option<&str>,
    ) -> Attribute
    where
        P: Fn(AttributeValue, &ScanIndex) -> Result<AttributeValue> + Send + Sync + 'static,
    {
        let mut tags = self.tags.clone();
        tags.extend(extra_tags);

        let inner = Arc::clone(&self.function);
        Attribute {
            tags,
            default_name: rename
                .map(str::to_string)
                .or_else(|| self.default_name.clone()),
            function: Arc::new(move |index| post_process(inner(index)?, index)),
        }
    }

    /// Post-processes the value alone
    pub fn map<P>(&self, post_process: P) -> Attribute
    where
        P: Fn(AttributeValue) -> Result<AttributeValue> + Send + Sync + 'static,
    {
        self.modify(move |value, _| post_process(value), [], None)
    }

    /// Declares additional tag dependencies
    pub fn with_tags(&self, extra_tags: impl IntoIterator<Item = Tag>) -> Attribute {
        let mut out = self.clone();
        out.tags.extend(extra_tags);
        out
    }

    /// Same computation under another default name
    pub fn renamed(&self, name: impl Into<String>) -> Attribute {
        self.clone().named(name)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("tags", &self.tags)
            .field("default_name", &self.default_name)
            .finish_non_exhaustive()
    }
}
