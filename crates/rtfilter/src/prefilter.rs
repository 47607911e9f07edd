//! Translation of filter trees into rTorrent pre-filter conditions.
//!
//! A pre-filter is sent with a bulk item listing so the server can drop
//! obvious non-matches. It only ever narrows the candidate set: anything
//! it passes is still checked by the [`Matcher`](crate::Matcher), and it
//! must never reject an item the matcher would accept.
//!
//! Only string comparisons on a small set of pattern fields joined by
//! implicit AND are translated. Anything else yields no pre-filter at all.

use std::fmt;

use tracing::debug;

use super::ast::{Condition, Node, Operator};
use super::fields::{FieldKind, FieldRegistry};
use super::value::class_end;

/// Fields with an rTorrent command to read them.
const PREFILTER_FIELDS: &[(&str, &str)] = &[
    ("name", "d.name="),
    ("alias", "d.custom=memo_alias"),
    ("message", "d.message="),
    ("metafile", "d.tied_to_file="),
    ("path", "d.base_path="),
    ("throttle", "d.throttle_name="),
];

/// A server-side filter condition in rTorrent command syntax.
///
/// # Example
///
/// ```
/// use rtfilter_rs::Expression;
///
/// let expr = Expression::parse("name=arch").unwrap();
/// let prefilter = expr.prefilter().unwrap();
/// assert_eq!(prefilter.as_str(), r#"string.contains_i=$d.name=,"arch""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreFilter(String);

impl PreFilter {
    /// Translates a filter tree, or returns `None` if any part of it has no
    /// server-side equivalent.
    ///
    /// A field is only translated while the registry still treats it as a
    /// pattern field.
    pub fn compile(node: &Node, registry: &FieldRegistry) -> Option<Self> {
        let condition = translate(node, registry);
        match &condition {
            Some(text) => debug!(prefilter = %text, "Compiled pre-filter"),
            None => debug!(filter = %node, "No pre-filter available"),
        }
        condition.map(Self)
    }

    /// Returns the bare condition.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the condition quoted as a single RPC argument.
    pub fn quoted(&self) -> String {
        quote(&self.0)
    }
}

/// Writes the quoted form.
impl fmt::Display for PreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

fn translate(node: &Node, registry: &FieldRegistry) -> Option<String> {
    match node {
        Node::Leaf(condition) => translate_condition(condition, registry),
        Node::Group(inner) => translate(inner, registry),
        Node::And(children) => {
            let parts: Option<Vec<String>> = children
                .iter()
                .map(|child| translate(child, registry))
                .collect();
            Some(format!("and={{{}}}", parts?.join(",")))
        }
        Node::Or(_) | Node::Not(_) => None,
    }
}

fn translate_condition(condition: &Condition, registry: &FieldRegistry) -> Option<String> {
    if registry.kind_of(condition.field.name()) != FieldKind::Pattern {
        return None;
    }
    let command = PREFILTER_FIELDS
        .iter()
        .find(|(field, _)| *field == condition.field.name())
        .map(|(_, command)| *command)?;
    let text = condition.value.pattern_text()?;

    match condition.operator {
        Operator::Equal if text.is_empty() => Some(format!("not=${command}")),
        Operator::Equal => {
            let needle = longest_literal(text)?;
            Some(format!("string.contains_i=${command},{}", quote(&needle)))
        }
        Operator::NotEqual if is_plain(text) => Some(format!(
            "not=$string.equals=${command},{}",
            quote(text)
        )),
        _ => None,
    }
}

/// Returns true if the text has no glob syntax and no non-ASCII characters.
fn is_plain(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii() && !matches!(c, '*' | '?' | '['))
}

/// Longest run of ASCII characters a glob match must contain.
///
/// Wildcards, character classes and non-ASCII characters split runs; the
/// server folds case for ASCII only. So do `k` and `s`, which also match
/// the Kelvin sign and the long s locally.
fn longest_literal(glob: &str) -> Option<String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut best = String::new();
    let mut current = String::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let split = match c {
            '*' | '?' => true,
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    i = end;
                    true
                }
                None => false,
            },
            c => !c.is_ascii() || folds_beyond_ascii(c),
        };

        if split {
            if current.len() > best.len() {
                best = std::mem::take(&mut current);
            }
            current.clear();
        } else {
            current.push(c);
        }
        i += 1;
    }
    if current.len() > best.len() {
        best = current;
    }

    (!best.is_empty()).then_some(best)
}

/// Returns true for ASCII letters whose Unicode case folding includes a
/// non-ASCII character.
fn folds_beyond_ascii(c: char) -> bool {
    matches!(c, 'k' | 'K' | 's' | 'S')
}

/// Wraps text in double quotes, escaping backslashes and quotes.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AstBuilder, FilterParser};

    fn prefilter_with(input: &str, registry: &FieldRegistry) -> Option<String> {
        let syntax = FilterParser::parse(input).unwrap();
        let tree = AstBuilder::new(registry.default_field()).build(&syntax);
        PreFilter::compile(&tree, registry).map(|p| p.as_str().to_string())
    }

    fn prefilter(input: &str) -> Option<String> {
        prefilter_with(input, &FieldRegistry::torrent())
    }

    #[test]
    fn test_name_contains() {
        assert_eq!(
            prefilter("name=arch").as_deref(),
            Some(r#"string.contains_i=$d.name=,"arch""#)
        );
        assert_eq!(
            prefilter("arch").as_deref(),
            Some(r#"string.contains_i=$d.name=,"arch""#)
        );
        assert_eq!(
            prefilter("d.name==arch").as_deref(),
            Some(r#"string.contains_i=$d.name=,"arch""#)
        );
    }

    #[test]
    fn test_quoted_form() {
        let syntax = FilterParser::parse("name=arch").unwrap();
        let tree = AstBuilder::new("name").build(&syntax);
        let filter = PreFilter::compile(&tree, &FieldRegistry::torrent()).unwrap();
        assert_eq!(filter.quoted(), r#""string.contains_i=$d.name=,\"arch\"""#);
        assert_eq!(filter.to_string(), filter.quoted());
    }

    #[test]
    fn test_glob_uses_longest_segment() {
        assert_eq!(
            prefilter("name=*ubuntu*.iso").as_deref(),
            Some(r#"string.contains_i=$d.name=,"ubuntu""#)
        );
        assert_eq!(
            prefilter("name=a[0-9]bcd").as_deref(),
            Some(r#"string.contains_i=$d.name=,"bcd""#)
        );
        assert_eq!(
            prefilter("name=rtörrent").as_deref(),
            Some(r#"string.contains_i=$d.name=,"rrent""#)
        );
        assert_eq!(prefilter("name=*"), None);
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            prefilter(r#"name="The \"Thing\"""#).as_deref(),
            Some(r#"string.contains_i=$d.name=,"The \"Thing\"""#)
        );
    }

    #[test]
    fn test_empty_and_not_equal() {
        assert_eq!(prefilter(r#"message="""#).as_deref(), Some("not=$d.message="));
        assert_eq!(
            prefilter("alias!=Ubuntu").as_deref(),
            Some(r#"not=$string.equals=$d.custom=memo_alias,"Ubuntu""#)
        );
        assert_eq!(prefilter("alias!=Ubu*"), None);
    }

    #[test]
    fn test_and_requires_every_child() {
        assert_eq!(
            prefilter("name=arch* path=/data/*").as_deref(),
            Some(r#"and={string.contains_i=$d.name=,"arch",string.contains_i=$d.base_path=,"/data/"}"#)
        );
        assert_eq!(prefilter("name=arch* size>1G"), None);
        assert_eq!(
            prefilter("[ name=arch ] message=x").as_deref(),
            Some(r#"and={string.contains_i=$d.name=,"arch",string.contains_i=$d.message=,"x"}"#)
        );
    }

    #[test]
    fn test_letters_with_unicode_folds_split_runs() {
        assert_eq!(
            prefilter("name=kernel").as_deref(),
            Some(r#"string.contains_i=$d.name=,"ernel""#)
        );
        assert_eq!(
            prefilter("name=Big*Buck").as_deref(),
            Some(r#"string.contains_i=$d.name=,"Big""#)
        );
        assert_eq!(prefilter("name=ks"), None);
    }

    #[test]
    fn test_redefined_field_is_not_translated() {
        let registry = FieldRegistry::torrent().with_field("name", FieldKind::Number);
        assert_eq!(prefilter_with("name=05", &registry), None);
        assert_eq!(prefilter_with("name=05 alias=x", &registry), None);

        let registry = FieldRegistry::torrent().with_field("alias", FieldKind::Tags);
        assert_eq!(prefilter_with("alias=ubuntu", &registry), None);
        assert_eq!(
            prefilter_with("name=arch", &registry).as_deref(),
            Some(r#"string.contains_i=$d.name=,"arch""#)
        );
    }

    #[test]
    fn test_untranslatable() {
        for input in [
            "name=arch OR name=debian",
            "NOT name=arch",
            "name=/arch/",
            "size>1G",
            "tagged=foo",
            "name={{d.alias}}",
            "name>arch",
            "hash=ABC",
        ] {
            assert_eq!(prefilter(input), None, "{input}");
        }
    }
}
