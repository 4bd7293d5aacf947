use crate::error::{Result, UcdmError};
use crate::tags::{MULTI_VOLUME_ALIAS, MULTI_VOLUME_TAGS};
use crate::types::Tag;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Named tag aliases used to resolve user-supplied tag tokens
///
/// A token is resolved, in order, as an alias, a positional tag string,
/// or a dictionary keyword. The default configuration registers
/// `":multivol:"` for the multi-volume indicator tags.
///
/// # Example
///
/// ```
/// use ucdm_core::{Tag, TagConfig};
///
/// let config = TagConfig::default();
/// let resolved = config.resolve("0020|000e").unwrap();
/// assert_eq!(resolved, vec![(Tag::new(0x0020, 0x000E), "SeriesInstanceUID".to_string())]);
///
/// assert_eq!(config.resolve(":multivol:").unwrap().len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TagConfig {
    aliases: BTreeMap<String, BTreeSet<Tag>>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self::empty().with_alias(MULTI_VOLUME_ALIAS, MULTI_VOLUME_TAGS)
    }
}

impl TagConfig {
    /// Creates a configuration without any alias
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Builder: register an alias, replacing any previous definition
    pub fn with_alias(
        mut self,
        name: impl Into<String>,
        tags: impl IntoIterator<Item = Tag>,
    ) -> Self {
        self.aliases
            .insert(name.into(), tags.into_iter().collect());
        self
    }

    /// Returns the tags registered under `name`
    pub fn alias(&self, name: &str) -> Option<&BTreeSet<Tag>> {
        self.aliases.get(name)
    }

    /// Expands a token into tags and their column names
    ///
    /// Column names are dictionary keywords. When a tag has no keyword the
    /// token itself is used, suffixed with `_<index>` if the token expanded
    /// to more than one tag. Results are ordered by tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is neither an alias, a tag string,
    /// nor a known keyword
    pub fn resolve(&self, token: &str) -> Result<Vec<(Tag, String)>> {
        let tags: Vec<Tag> = match self.aliases.get(token) {
            Some(tags) => tags.iter().copied().collect(),
            None => vec![token.parse::<Tag>()?],
        };

        let count = tags.len();
        Ok(tags
            .into_iter()
            .enumerate()
            .map(|(index, tag)| {
                let name = match tag.keyword() {
                    Some(keyword) => keyword.to_string(),
                    None if count == 1 => token.to_string(),
                    None => format!("{}_{}", token, index),
                };
                (tag, name)
            })
            .collect())
    }

    /// Resolves many tokens, merging duplicate tags (first name wins)
    pub fn resolve_all<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<(Tag, String)>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for token in tokens {
            for (tag, name) in self.resolve(token.as_ref())? {
                if seen.insert(tag) {
                    out.push((tag, name));
                }
            }
        }
        Ok(out)
    }

    /// Parses aliases from a JSON object
    ///
    /// Each entry maps an alias name to either a single token or a list of
    /// tokens (tag strings or keywords). Entries are added on top of the
    /// existing aliases.
    #[cfg(feature = "json")]
    pub fn merge_json(mut self, json: &str) -> Result<Self> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Entry {
            One(String),
            Many(Vec<String>),
        }

        let entries: BTreeMap<String, Entry> = serde_json::from_str(json)?;
        for (name, entry) in entries {
            let tokens = match entry {
                Entry::One(token) => vec![token],
                Entry::Many(tokens) => tokens,
            };
            let tags = tokens
                .iter()
                .map(|t| t.parse::<Tag>())
                .collect::<Result<BTreeSet<_>>>()?;
            self.aliases.insert(name, tags);
        }
        Ok(self)
    }

    /// Loads aliases from a JSON file on top of the defaults
    #[cfg(feature = "json")]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::default().merge_json(&text)
    }

    /// Loads aliases from a JSON file on top of the defaults
    #[cfg(not(feature = "json"))]
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Err(UcdmError::Configuration(format!(
            "cannot read {}: tag configuration files require the 'json' feature",
            path.display()
        )))
    }
}

/// Expands `*.tags` list files (one token per line) in a list of tokens
///
/// Blank lines and lines starting with `#` are skipped.
pub fn expand_tag_lists<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        if token.ends_with(".tags") {
            let text = std::fs::read_to_string(token)?;
            out.extend(
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(str::to_string),
            );
        } else {
            out.push(token.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{IMAGE_TYPE, SERIES_INSTANCE_UID};
    use std::io::Write;

    #[test]
    fn test_resolve_keyword_and_string() {
        let config = TagConfig::default();
        assert_eq!(
            config.resolve("ImageType").unwrap(),
            vec![(IMAGE_TYPE, "ImageType".to_string())]
        );
        assert_eq!(
            config.resolve("(0020,000E)").unwrap(),
            vec![(SERIES_INSTANCE_UID, "SeriesInstanceUID".to_string())]
        );
    }

    #[test]
    fn test_resolve_private_tag_uses_token() {
        let config = TagConfig::default();
        assert_eq!(
            config.resolve("0029|1010").unwrap(),
            vec![(Tag::new(0x0029, 0x1010), "0029|1010".to_string())]
        );
    }

    #[test]
    fn test_resolve_alias_positional_names() {
        let config = TagConfig::empty()
            .with_alias("vendor", [Tag::new(0x0029, 0x1010), Tag::new(0x0029, 0x1020)]);
        assert_eq!(
            config.resolve("vendor").unwrap(),
            vec![
                (Tag::new(0x0029, 0x1010), "vendor_0".to_string()),
                (Tag::new(0x0029, 0x1020), "vendor_1".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_unknown_token() {
        assert!(TagConfig::default().resolve("NoSuchThing").is_err());
    }

    #[test]
    fn test_resolve_all_dedups() {
        let config = TagConfig::default();
        let resolved = config
            .resolve_all(&["SeriesInstanceUID", ":multivol:"])
            .unwrap();
        assert_eq!(resolved.len(), 5);
        assert_eq!(resolved[0].0, SERIES_INSTANCE_UID);
    }

    #[test]
    fn test_expand_tag_lists() {
        let mut file = tempfile::Builder::new().suffix(".tags").tempfile().unwrap();
        writeln!(file, "ImageType\n\n# comment\n0020|000e").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let expanded = expand_tag_lists(&["Modality".to_string(), path]).unwrap();
        assert_eq!(expanded, vec!["Modality", "ImageType", "0020|000e"]);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_merge_json() {
        let config = TagConfig::default()
            .merge_json(r#"{"ids": ["SeriesInstanceUID", "0020|000d"], "kind": "Modality"}"#)
            .unwrap();
        assert_eq!(config.alias("ids").unwrap().len(), 2);
        assert_eq!(config.alias("kind").unwrap().len(), 1);
        assert!(config.alias(":multivol:").is_some());
    }
}
