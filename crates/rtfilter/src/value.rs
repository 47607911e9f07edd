//! Typed literals and pattern matching.
//!
//! Literal values are classified from their raw text once, when the tree is
//! built. Interpreting a number's unit or a word as a boolean depends on the
//! field it is compared with and happens in the matcher.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::ast::FieldRef;
use super::error::{FilterError, FilterResult};
use super::item::Item;
use super::lexer::RawValue;

/// Bytes per kibibyte.
const KIB: f64 = 1024.0;

/// Seconds per unit for duration suffixes.
const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const WEEK: f64 = 604_800.0;

/// A literal value on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A quoted string. Still a glob in pattern context; quoting only
    /// protects whitespace.
    Quoted(String),

    /// An unquoted word, matched as a shell-style glob.
    Glob(String),

    /// A `/pattern/` literal.
    Regex {
        /// The regular expression source.
        pattern: String,
        /// Set by the `i` flag.
        case_insensitive: bool,
    },

    /// A number with an optional single-letter unit suffix.
    Number {
        /// The numeric magnitude before unit scaling.
        value: f64,
        /// The unit letter as written, if any.
        unit: Option<char>,
        /// The literal as written.
        text: String,
    },

    /// One of the words `yes`, `true`, `no`, `false` (any case).
    Boolean {
        /// The truth value.
        value: bool,
        /// The literal as written.
        text: String,
    },

    /// A value containing `{{field}}` placeholders, resolved per item.
    Template(Template),
}

impl Literal {
    /// Classifies a raw lexer value into a typed literal.
    pub fn from_raw(raw: &RawValue) -> Self {
        match raw {
            RawValue::Regex { pattern, flags } => Literal::Regex {
                pattern: pattern.clone(),
                case_insensitive: flags.contains('i'),
            },
            RawValue::Quoted(text) => match Template::parse(text) {
                Some(template) => Literal::Template(template),
                None => Literal::Quoted(text.clone()),
            },
            RawValue::Word(word) => Self::from_word(word),
        }
    }

    /// Classifies an unquoted word.
    fn from_word(word: &str) -> Self {
        if word.is_empty() {
            return Literal::Quoted(String::new());
        }
        if let Some(template) = Template::parse(word) {
            return Literal::Template(template);
        }
        if let Some((value, unit)) = parse_number(word) {
            return Literal::Number {
                value,
                unit,
                text: word.to_string(),
            };
        }
        match word.to_lowercase().as_str() {
            "yes" | "true" => Literal::Boolean {
                value: true,
                text: word.to_string(),
            },
            "no" | "false" => Literal::Boolean {
                value: false,
                text: word.to_string(),
            },
            _ => Literal::Glob(word.to_string()),
        }
    }

    /// Returns the text of the literal when it is used as a string pattern.
    ///
    /// Templates and regexes have no static text.
    pub fn pattern_text(&self) -> Option<&str> {
        match self {
            Literal::Quoted(text) | Literal::Glob(text) => Some(text),
            Literal::Number { text, .. } | Literal::Boolean { text, .. } => Some(text),
            Literal::Regex { .. } | Literal::Template(_) => None,
        }
    }

    /// Returns the boolean a literal stands for, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Boolean { value, .. } => Some(*value),
            Literal::Number { value, unit: None, .. } if *value == 1.0 => Some(true),
            Literal::Number { value, unit: None, .. } if *value == 0.0 => Some(false),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Quoted(_) => "a quoted string",
            Literal::Glob(_) => "a glob pattern",
            Literal::Regex { .. } => "a regex",
            Literal::Number { .. } => "a number",
            Literal::Boolean { .. } => "a boolean",
            Literal::Template(_) => "a template",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Glob(text) if !needs_quoting(text) => write!(f, "{text}"),
            Literal::Glob(text) | Literal::Quoted(text) => write_quoted(f, text),
            Literal::Regex {
                pattern,
                case_insensitive,
            } => {
                write!(f, "/{pattern}/")?;
                if *case_insensitive {
                    write!(f, "i")?;
                }
                Ok(())
            }
            Literal::Number { text, .. } | Literal::Boolean { text, .. } => write!(f, "{text}"),
            Literal::Template(template) => write_quoted(f, template.source()),
        }
    }
}

/// Returns true if a glob cannot be written back as a bare word.
fn needs_quoting(text: &str) -> bool {
    if text.is_empty() || text.starts_with(&['/', '"', '\''][..]) {
        return true;
    }
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            c if c.is_whitespace() => return true,
            '[' => depth += 1,
            ']' if depth == 0 => return true,
            ']' => depth -= 1,
            _ => {}
        }
    }
    false
}

/// Writes text as a double-quoted string, escaping quotes and backslashes.
fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, "\"")
}

/// Parses `[+-]digits[.digits][unit]` where unit is a single letter.
fn parse_number(word: &str) -> Option<(f64, Option<char>)> {
    let last = word.chars().last()?;
    let (digits, unit) = if last.is_ascii_alphabetic() {
        (&word[..word.len() - 1], Some(last))
    } else {
        (word, None)
    };

    if let Some(unit) = unit {
        if !"kmgtshdw".contains(unit.to_ascii_lowercase()) {
            return None;
        }
    }

    let unsigned = digits.strip_prefix(&['+', '-'][..]).unwrap_or(digits);
    let valid = !unsigned.is_empty()
        && unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && unsigned.matches('.').count() <= 1;
    if !valid {
        return None;
    }

    digits.parse::<f64>().ok().map(|value| (value, unit))
}

/// Multiplier for a byte-size unit (`K`, `M`, `G`, `T`; any case).
pub fn size_multiplier(unit: Option<char>) -> Option<f64> {
    match unit.map(|u| u.to_ascii_lowercase()) {
        None => Some(1.0),
        Some('k') => Some(KIB),
        Some('m') => Some(KIB * KIB),
        Some('g') => Some(KIB * KIB * KIB),
        Some('t') => Some(KIB * KIB * KIB * KIB),
        Some(_) => None,
    }
}

/// Multiplier to seconds for a duration unit (`s`, `m`, `h`, `d`, `w`; any case).
pub fn duration_multiplier(unit: Option<char>) -> Option<f64> {
    match unit.map(|u| u.to_ascii_lowercase()) {
        None | Some('s') => Some(1.0),
        Some('m') => Some(MINUTE),
        Some('h') => Some(HOUR),
        Some('d') => Some(DAY),
        Some('w') => Some(WEEK),
        Some(_) => None,
    }
}

/// Multiplier for a field of unknown kind.
///
/// Size and duration suffixes only collide on `m`: upper case `M` means
/// mebibytes and lower case `m` means minutes.
pub fn inferred_multiplier(unit: Option<char>) -> Option<f64> {
    match unit {
        Some('M') => size_multiplier(unit),
        Some('m') => duration_multiplier(unit),
        Some(u) if "kKgGtT".contains(u) => size_multiplier(unit),
        _ => duration_multiplier(unit),
    }
}

/// Multiplier for a unitless number.
pub fn plain_multiplier(unit: Option<char>) -> Option<f64> {
    unit.is_none().then_some(1.0)
}

/// Parses text such as a resolved template as a number scaled by its unit.
pub fn parse_quantity(text: &str, multiplier: fn(Option<char>) -> Option<f64>) -> Option<f64> {
    let (value, unit) = parse_number(text.trim())?;
    Some(value * multiplier(unit)?)
}

/// Parses a boolean token: `yes`, `true`, `1` or `no`, `false`, `0` (any case).
pub fn parse_bool_word(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// A compiled string pattern: either a translated glob or a regex.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a glob into an anchored, case-insensitive pattern.
    pub fn glob(glob: &str) -> FilterResult<Self> {
        let translated = glob_to_regex(glob);
        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| FilterError::invalid_pattern(glob, e))?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    /// Compiles an unanchored regex, case-sensitive unless requested.
    pub fn regex(pattern: &str, case_insensitive: bool) -> FilterResult<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| FilterError::invalid_pattern(pattern, e))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compiles the pattern for a static literal.
    ///
    /// Regexes keep their own semantics; every other literal is a glob over
    /// its text. Returns `None` for templates.
    pub fn from_literal(literal: &Literal) -> Option<FilterResult<Self>> {
        match literal {
            Literal::Regex {
                pattern,
                case_insensitive,
            } => Some(Self::regex(pattern, *case_insensitive)),
            Literal::Template(_) => None,
            other => other.pattern_text().map(Self::glob),
        }
    }

    /// Returns true if the text matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the pattern as written.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Translates a shell glob into an anchored regular expression.
///
/// `*` matches any sequence, `?` any single character, and `[...]` or
/// `[!...]` a character class. Everything else is literal.
pub fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut j = i + 1;
                    if chars[j] == '!' {
                        out.push('^');
                        j += 1;
                    }
                    for &c in &chars[j..end] {
                        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Finds the closing `]` of a character class opened at `start`.
pub(crate) fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    // A `]` right after the opening is part of the class.
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// A literal with `{{field}}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    parts: Vec<TemplatePart>,
}

/// A piece of a template.
#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Text(String),
    /// A placeholder; `None` if its content is not a field path.
    Field(Option<FieldRef>),
}

impl Template {
    /// Parses text containing at least one `{{...}}` placeholder.
    pub fn parse(source: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let mut rest = source;
        let mut found = false;

        while let Some(open) = rest.find("{{") {
            let Some(close) = rest[open + 2..].find("}}") else {
                break;
            };
            found = true;
            if open > 0 {
                parts.push(TemplatePart::Text(rest[..open].to_string()));
            }
            let expr = rest[open + 2..open + 2 + close].trim();
            parts.push(TemplatePart::Field(FieldRef::parse(expr)));
            rest = &rest[open + 2 + close + 2..];
        }

        if !found {
            return None;
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Text(rest.to_string()));
        }
        Some(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Returns the template as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the fields referenced by placeholders.
    pub fn fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Field(field) => field.as_ref(),
            TemplatePart::Text(_) => None,
        })
    }

    /// Substitutes the item's current field values.
    ///
    /// Returns `None` if a placeholder is not a field path or names a field
    /// the item does not have.
    pub fn resolve(&self, item: &dyn Item) -> Option<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Field(field) => {
                    let value = item.get(field.as_ref()?)?;
                    out.push_str(&value.to_text()?);
                }
            }
        }
        Some(out)
    }
}
