use crate::error::{Result, UcdmError};
use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom_dictionary_std::StandardDataDictionary;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static DICTIONARY: StandardDataDictionary = StandardDataDictionary;

/// Identifier of one metadata field: a (group, element) pair
///
/// Tags are totally ordered by group, then element.
///
/// # Example
///
/// ```
/// use ucdm_core::Tag;
///
/// let series: Tag = "0020|000e".parse().unwrap();
/// assert_eq!(series, Tag::new(0x0020, 0x000E));
/// assert_eq!(series.keyword(), Some("SeriesInstanceUID"));
/// assert_eq!("SeriesInstanceUID".parse::<Tag>().unwrap(), series);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub group: u16,
    pub element: u16,
}

impl Tag {
    /// Creates a new Tag
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Private tags live in odd groups, past the private creator block
    pub fn is_private(&self) -> bool {
        self.element >= 0x10 && self.group % 2 == 1
    }

    /// Renders the tag as `gggg|eeee` (lowercase hex)
    pub fn tag_string(&self) -> String {
        format!("{:04x}|{:04x}", self.group, self.element)
    }

    /// Looks up the standard dictionary keyword, if there is one
    ///
    /// Only keywords that name this exact tag are returned. Range entries
    /// such as `OverlayRows` (60xx,0010) or `PrivateCreator` would parse
    /// back to a different tag, so those fall back to `None`.
    pub fn keyword(&self) -> Option<&'static str> {
        let tag = dicom_core::Tag::from(*self);
        DICTIONARY
            .by_tag(tag)
            .map(|entry| entry.alias())
            .filter(|alias| !alias.is_empty() && DICTIONARY.parse_tag(alias) == Some(tag))
    }

    /// Keyword when known, positional tag string otherwise
    pub fn display_name(&self) -> String {
        self.keyword()
            .map(str::to_string)
            .unwrap_or_else(|| self.tag_string())
    }

    /// Parses a dictionary keyword (e.g. `SeriesInstanceUID`)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.is_empty() || Tag::from_tag_string(keyword).is_some() {
            return None;
        }
        DICTIONARY.parse_tag(keyword).map(Tag::from)
    }

    /// Parses a positional tag string
    ///
    /// Accepts formats like:
    /// - "0020|000e"
    /// - "(0020,000E)"
    /// - "0020,000e"
    /// - "0020000E"
    pub fn from_tag_string(s: &str) -> Option<Self> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"^\(?\s*([0-9A-Fa-f]{4})\s*[|,]?\s*([0-9A-Fa-f]{4})\s*\)?$")
                .expect("Failed to compile regex")
        });

        let caps = re.captures(s.trim())?;
        let group = u16::from_str_radix(&caps[1], 16).ok()?;
        let element = u16::from_str_radix(&caps[2], 16).ok()?;
        Some(Tag::new(group, element))
    }
}

impl FromStr for Tag {
    type Err = UcdmError;

    /// Parses a tag string first, then falls back to a dictionary keyword
    fn from_str(s: &str) -> Result<Self> {
        Tag::from_tag_string(s)
            .or_else(|| Tag::from_keyword(s.trim()))
            .ok_or_else(|| {
                UcdmError::InvalidValue(format!(
                    "'{}' is neither a tag string nor a known DICOM keyword",
                    s
                ))
            })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.group, self.element)
    }
}

impl From<dicom_core::Tag> for Tag {
    fn from(tag: dicom_core::Tag) -> Self {
        Tag::new(tag.group(), tag.element())
    }
}

impl From<Tag> for dicom_core::Tag {
    fn from(tag: Tag) -> Self {
        dicom_core::Tag(tag.group, tag.element)
    }
}

impl From<(u16, u16)> for Tag {
    fn from((group, element): (u16, u16)) -> Self {
        Tag::new(group, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("0020|000e")]
    #[case("0020|000E")]
    #[case("(0020,000E)")]
    #[case("0020,000e")]
    #[case("0020000E")]
    #[case(" ( 0020 , 000e ) ")]
    fn test_parse_tag_string(#[case] input: &str) {
        assert_eq!(Tag::from_tag_string(input), Some(Tag::new(0x0020, 0x000E)));
    }

    #[rstest]
    #[case("")]
    #[case("0020|00")]
    #[case("zzzz|000e")]
    #[case("0020|000e|0001")]
    fn test_parse_tag_string_invalid(#[case] input: &str) {
        assert_eq!(Tag::from_tag_string(input), None);
    }

    #[test]
    fn test_from_str_keyword_fallback() {
        let tag: Tag = "ImageOrientationPatient".parse().unwrap();
        assert_eq!(tag, Tag::new(0x0020, 0x0037));
        assert!("NotARealKeyword".parse::<Tag>().is_err());
    }

    #[test]
    fn test_is_private() {
        assert!(Tag::new(0x0029, 0x1010).is_private());
        assert!(Tag::new(0x0029, 0x0010).is_private());
        assert!(!Tag::new(0x0029, 0x000F).is_private());
        assert!(!Tag::new(0x0020, 0x1010).is_private());
    }

    #[test]
    fn test_ordering_group_then_element() {
        let mut tags = vec![
            Tag::new(0x0020, 0x0037),
            Tag::new(0x0008, 0x0008),
            Tag::new(0x0020, 0x000E),
        ];
        tags.sort();
        assert_eq!(
            tags,
            vec![
                Tag::new(0x0008, 0x0008),
                Tag::new(0x0020, 0x000E),
                Tag::new(0x0020, 0x0037),
            ]
        );
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let set: HashSet<Tag> = [
            Tag::new(0x0020, 0x000E),
            Tag::from((0x0020, 0x000E)),
            Tag::from(dicom_core::Tag(0x0020, 0x000E)),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_names() {
        let series = Tag::new(0x0020, 0x000E);
        assert_eq!(series.tag_string(), "0020|000e");
        assert_eq!(series.to_string(), "(0020,000E)");
        assert_eq!(series.display_name(), "SeriesInstanceUID");

        let private = Tag::new(0x0029, 0x1010);
        assert_eq!(private.keyword(), None);
        assert_eq!(private.display_name(), "0029|1010");
    }

    #[rstest]
    #[case::overlay_rows(Tag::new(0x6002, 0x0010), "6002|0010")]
    #[case::private_creator(Tag::new(0x0029, 0x0010), "0029|0010")]
    fn test_range_entries_use_tag_string(#[case] tag: Tag, #[case] name: &str) {
        assert_eq!(tag.keyword(), None);
        assert_eq!(tag.display_name(), name);
        assert_eq!(name.parse::<Tag>().unwrap(), tag);
    }
}
