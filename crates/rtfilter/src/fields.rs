//! Field kinds and the field registry.
//!
//! A field's kind decides how a literal compared against it is read: whether
//! `1m` means a mebibyte or a minute, whether `yes` is a boolean or a glob,
//! and whether a number is compared directly or as an age.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;

/// Maximum Levenshtein distance to consider a field name as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The field used for a bare value without a field name.
pub const DEFAULT_FIELD: &str = "name";

/// How a field's values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Text, matched with globs and regexes.
    Pattern,
    /// A plain number.
    Number,
    /// A byte count; `K`, `M`, `G`, `T` suffixes scale by powers of 1024.
    Size,
    /// A number of seconds.
    Duration,
    /// Seconds since the epoch, compared by age; zero means never.
    Timestamp,
    /// A flag.
    Bool,
    /// A whitespace-separated or list-valued set of tags.
    Tags,
    /// A list of file records, matched on their `path`.
    Files,
    /// Not registered: the comparison follows the item's value.
    #[serde(skip)]
    Inferred,
}

impl FieldKind {
    /// Returns the kind's configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Pattern => "pattern",
            FieldKind::Number => "number",
            FieldKind::Size => "size",
            FieldKind::Duration => "duration",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Bool => "bool",
            FieldKind::Tags => "tags",
            FieldKind::Files => "files",
            FieldKind::Inferred => "inferred",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in torrent item fields.
const TORRENT_FIELDS: &[(FieldKind, &[&str])] = &[
    (
        FieldKind::Pattern,
        &[
            "hash",
            "name",
            "tracker",
            "alias",
            "message",
            "directory",
            "path",
            "realpath",
            "metafile",
            "sessionfile",
            "throttle",
        ],
    ),
    (FieldKind::Size, &["size", "uploaded", "xfer", "down", "up"]),
    (FieldKind::Number, &["prio", "fno", "done", "ratio"]),
    (
        FieldKind::Bool,
        &[
            "is_private",
            "is_open",
            "is_active",
            "is_complete",
            "is_multi_file",
            "is_ignored",
            "is_ghost",
        ],
    ),
    (
        FieldKind::Timestamp,
        &["loaded", "started", "completed", "stopped"],
    ),
    (FieldKind::Duration, &["leechtime", "seedtime"]),
    (FieldKind::Tags, &["tagged", "views", "kind", "traits"]),
    (FieldKind::Files, &["files"]),
];

/// Maps field names to their kinds.
///
/// # Example
///
/// ```
/// use rtfilter_rs::{FieldKind, FieldRegistry};
///
/// let registry = FieldRegistry::torrent().with_field("label", FieldKind::Tags);
/// assert_eq!(registry.kind_of("d.size"), FieldKind::Size);
/// assert_eq!(registry.kind_of("label"), FieldKind::Tags);
/// assert_eq!(registry.kind_of("unknown"), FieldKind::Inferred);
/// ```
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldKind>,
    default_field: String,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::torrent()
    }
}

impl FieldRegistry {
    /// Creates a registry with no fields; every field is inferred.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
            default_field: DEFAULT_FIELD.to_string(),
        }
    }

    /// Creates the registry of built-in torrent item fields.
    pub fn torrent() -> Self {
        let mut registry = Self::empty();
        for (kind, names) in TORRENT_FIELDS {
            for name in names.iter() {
                registry.fields.insert((*name).to_string(), *kind);
            }
        }
        registry
    }

    /// Returns the registry with a field added or redefined.
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Returns the registry with a different default field.
    pub fn with_default_field(mut self, name: impl Into<String>) -> Self {
        self.default_field = name.into();
        self
    }

    /// Returns the field bare values are compared with.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Returns the kind of a field; a leading `d.` is ignored.
    pub fn kind_of(&self, name: &str) -> FieldKind {
        let name = name.strip_prefix("d.").unwrap_or(name);
        self.fields
            .get(name)
            .copied()
            .unwrap_or(FieldKind::Inferred)
    }

    /// Returns true if the field is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name) != FieldKind::Inferred
    }

    /// Returns all registered fields sorted by name.
    pub fn fields(&self) -> Vec<(&str, FieldKind)> {
        let mut fields: Vec<(&str, FieldKind)> = self
            .fields
            .iter()
            .map(|(name, kind)| (name.as_str(), *kind))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }

    /// Suggests a registered field close to an unknown name.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let query = name.strip_prefix("d.").unwrap_or(name).to_lowercase();

        let (best, distance) = self
            .fields
            .keys()
            .map(|candidate| (candidate.as_str(), levenshtein(&query, candidate)))
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))?;

        (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then_some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_kinds() {
        let registry = FieldRegistry::torrent();
        assert_eq!(registry.kind_of("name"), FieldKind::Pattern);
        assert_eq!(registry.kind_of("d.name"), FieldKind::Pattern);
        assert_eq!(registry.kind_of("uploaded"), FieldKind::Size);
        assert_eq!(registry.kind_of("ratio"), FieldKind::Number);
        assert_eq!(registry.kind_of("is_complete"), FieldKind::Bool);
        assert_eq!(registry.kind_of("completed"), FieldKind::Timestamp);
        assert_eq!(registry.kind_of("leechtime"), FieldKind::Duration);
        assert_eq!(registry.kind_of("views"), FieldKind::Tags);
        assert_eq!(registry.kind_of("files"), FieldKind::Files);
        assert_eq!(registry.kind_of("custom_1"), FieldKind::Inferred);
        assert_eq!(registry.default_field(), "name");
    }

    #[test]
    fn test_with_field_overrides() {
        let registry = FieldRegistry::torrent()
            .with_field("name", FieldKind::Tags)
            .with_default_field("alias");
        assert_eq!(registry.kind_of("name"), FieldKind::Tags);
        assert_eq!(registry.default_field(), "alias");
    }

    #[test]
    fn test_suggest() {
        let registry = FieldRegistry::torrent();
        assert_eq!(registry.suggest("nmae"), Some("name"));
        assert_eq!(registry.suggest("d.tagd"), Some("tagged"));
        assert_eq!(registry.suggest("name"), None);
        assert_eq!(registry.suggest("completely_unrelated"), None);
    }

    #[test]
    fn test_fields_sorted() {
        let registry = FieldRegistry::empty()
            .with_field("b", FieldKind::Number)
            .with_field("a", FieldKind::Size);
        assert_eq!(
            registry.fields(),
            vec![("a", FieldKind::Size), ("b", FieldKind::Number)]
        );
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: FieldKind,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"kind": "timestamp"}"#).unwrap();
        assert_eq!(parsed.kind, FieldKind::Timestamp);
        assert!(serde_json::from_str::<Wrapper>(r#"{"kind": "inferred"}"#).is_err());
    }
}
