//! Compiles filter trees into predicates over items.
//!
//! Every condition is compiled once, up front: patterns are translated and
//! the comparison is chosen from the field's kind and the literal. A
//! condition that can never be evaluated (an ordering operator on a flag,
//! say) fails compilation instead of silently never matching.
//!
//! Evaluation never fails. A missing field, a value that cannot be coerced
//! or a template that cannot be resolved makes the condition a non-match.

use std::borrow::Cow;

use chrono::Utc;
use tracing::{debug, trace, warn};

use super::ast::{Condition, FieldRef, Node, Operator};
use super::error::{FilterError, FilterResult};
use super::fields::{FieldKind, FieldRegistry};
use super::item::{Item, Value};
use super::value::{
    duration_multiplier, inferred_multiplier, parse_bool_word, parse_quantity, plain_multiplier,
    size_multiplier, Literal, Pattern, Template,
};

/// Converts a unit suffix into a multiplier.
type Multiplier = fn(Option<char>) -> Option<f64>;

/// Prefix marking a tag as hidden from membership tests.
const HIDDEN_TAG_PREFIX: char = ':';

/// Sub-field of a file record that file conditions match on.
const FILE_PATH_FIELD: &str = "path";

/// A compiled filter predicate.
///
/// A matcher is immutable and can be shared between threads.
///
/// # Example
///
/// ```
/// use rtfilter_rs::{AstBuilder, FieldRegistry, FilterParser, Matcher, Record};
///
/// let registry = FieldRegistry::torrent();
/// let syntax = FilterParser::parse("size>1G is_complete=yes").unwrap();
/// let tree = AstBuilder::new(registry.default_field()).build(&syntax);
/// let matcher = Matcher::compile(&tree, &registry).unwrap();
///
/// let item = Record::new()
///     .with("size", 2u64 * 1024 * 1024 * 1024)
///     .with("is_complete", true);
/// assert!(matcher.matches(&item));
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    root: Compiled,
}

#[derive(Debug, Clone)]
enum Compiled {
    All(Vec<Compiled>),
    Any(Vec<Compiled>),
    Not(Box<Compiled>),
    Test(FieldTest),
}

impl Matcher {
    /// Compiles a filter tree against a field registry.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::UnsupportedLiteral` when an operator can never
    /// compare a field with a literal, and `FilterError::InvalidPattern`
    /// when a regex does not compile.
    pub fn compile(node: &Node, registry: &FieldRegistry) -> FilterResult<Self> {
        let root = compile_node(node, registry)?;
        debug!(
            conditions = node.conditions().len(),
            filter = %node,
            "Compiled matcher"
        );
        Ok(Self { root })
    }

    /// Returns true if the item matches.
    pub fn matches(&self, item: &dyn Item) -> bool {
        self.matches_at(item, now_seconds())
    }

    /// Returns true if the item matches, with ages measured from `now`
    /// (seconds since the epoch).
    pub fn matches_at(&self, item: &dyn Item, now: f64) -> bool {
        self.root.evaluate(item, now)
    }

    /// Filters a slice of items, returning only those that match.
    ///
    /// All items are judged against the same clock reading.
    pub fn filter_items<'b, T: Item>(&self, items: &'b [T]) -> Vec<&'b T> {
        let now = now_seconds();
        items
            .iter()
            .filter(|item| self.matches_at(*item, now))
            .collect()
    }
}

/// Current time in seconds since the epoch.
pub(crate) fn now_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

fn compile_node(node: &Node, registry: &FieldRegistry) -> FilterResult<Compiled> {
    Ok(match node {
        Node::And(children) => Compiled::All(
            children
                .iter()
                .map(|child| compile_node(child, registry))
                .collect::<FilterResult<_>>()?,
        ),
        Node::Or(children) => Compiled::Any(
            children
                .iter()
                .map(|child| compile_node(child, registry))
                .collect::<FilterResult<_>>()?,
        ),
        Node::Not(inner) => Compiled::Not(Box::new(compile_node(inner, registry)?)),
        Node::Group(inner) => compile_node(inner, registry)?,
        Node::Leaf(condition) => Compiled::Test(FieldTest::compile(condition, registry)?),
    })
}

impl Compiled {
    fn evaluate(&self, item: &dyn Item, now: f64) -> bool {
        match self {
            Compiled::All(children) => children.iter().all(|c| c.evaluate(item, now)),
            Compiled::Any(children) => children.iter().any(|c| c.evaluate(item, now)),
            Compiled::Not(inner) => !inner.evaluate(item, now),
            Compiled::Test(test) => test.evaluate(item, now),
        }
    }
}

/// A compiled condition.
#[derive(Debug, Clone)]
struct FieldTest {
    field: FieldRef,
    operator: Operator,
    test: Test,
    source: String,
}

#[derive(Debug, Clone)]
enum Test {
    /// Text fields.
    Text(TextRhs),
    /// Any listed file path matches.
    Files(TextRhs),
    /// Any visible tag matches.
    Tags(TagRhs),
    /// Flag equality.
    Flag(bool),
    /// Plain magnitudes; durations compare equal by whole seconds.
    Number { rhs: NumberRhs, whole_seconds: bool },
    /// Time elapsed since a timestamp.
    Age { rhs: NumberRhs, granularity: f64 },
    /// Chosen per item from the value.
    Inferred(InferredTest),
}

impl FieldTest {
    fn compile(condition: &Condition, registry: &FieldRegistry) -> FilterResult<Self> {
        let kind = registry.kind_of(condition.field.path());
        if kind == FieldKind::Inferred {
            match registry.suggest(condition.field.path()) {
                Some(suggestion) => warn!(
                    field = %condition.field,
                    "Unknown field '{}', did you mean '{}'?",
                    condition.field,
                    suggestion
                ),
                None => warn!(
                    field = %condition.field,
                    "Unknown field '{}', comparing by value",
                    condition.field
                ),
            }
        }

        Ok(Self {
            field: condition.field.clone(),
            operator: condition.operator,
            test: compile_test(kind, condition)?,
            source: condition.to_string(),
        })
    }

    fn evaluate(&self, item: &dyn Item, now: f64) -> bool {
        let Some(value) = item.get(&self.field) else {
            trace!(condition = %self.source, "Field missing, no match");
            return false;
        };
        let verdict = self.check(&value, item, now).unwrap_or(false);
        trace!(condition = %self.source, verdict, "Evaluated condition");
        verdict
    }

    /// Applies the test; `None` means the value cannot be compared.
    fn check(&self, value: &Value, item: &dyn Item, now: f64) -> Option<bool> {
        match &self.test {
            Test::Text(rhs) => {
                let pattern = rhs.resolve(item)?;
                let text = value.to_text()?;
                Some(self.equality(pattern.is_match(&text)))
            }
            Test::Files(rhs) => {
                let pattern = rhs.resolve(item)?;
                let paths = file_paths(value)?;
                Some(self.equality(paths.iter().any(|path| pattern.is_match(path))))
            }
            Test::Tags(rhs) => {
                let tags = visible_tags(value)?;
                let hit = match rhs {
                    TagRhs::Hidden => false,
                    TagRhs::Empty => tags.is_empty(),
                    TagRhs::Text(text) => {
                        let pattern = text.resolve(item)?;
                        tags.iter().any(|tag| pattern.is_match(tag))
                    }
                };
                Some(self.equality(hit))
            }
            Test::Flag(expected) => Some(self.equality(flag_value(value)? == *expected)),
            Test::Number { rhs, whole_seconds } => {
                let lhs = value.as_number()?;
                let rhs = rhs.resolve(item)?;
                if *whole_seconds && !self.operator.is_ordering() {
                    compare(self.operator, lhs.round(), rhs.round())
                } else {
                    compare(self.operator, lhs, rhs)
                }
            }
            Test::Age { rhs, granularity } => {
                let stamp = value.as_number()?;
                if stamp == 0.0 {
                    return None;
                }
                let age = now - stamp;
                let rhs = rhs.resolve(item)?;
                if self.operator.is_ordering() {
                    compare(self.operator, age, rhs)
                } else {
                    Some(self.equality(age >= rhs && age < rhs + granularity))
                }
            }
            Test::Inferred(test) => test.check(self.operator, value, item),
        }
    }

    /// Applies `=` or `!=` to a match outcome.
    fn equality(&self, hit: bool) -> bool {
        equality(self.operator, hit)
    }
}

fn equality(operator: Operator, hit: bool) -> bool {
    if operator == Operator::NotEqual {
        !hit
    } else {
        hit
    }
}

fn compare(operator: Operator, lhs: f64, rhs: f64) -> Option<bool> {
    lhs.partial_cmp(&rhs).map(|ordering| operator.accepts(ordering))
}

/// Chooses the comparison for a condition.
fn compile_test(kind: FieldKind, condition: &Condition) -> FilterResult<Test> {
    let literal = &condition.value;
    let unsupported = || {
        FilterError::unsupported_literal(
            condition.field.path(),
            condition.operator.as_str(),
            literal.kind_name(),
        )
    };

    match (kind, condition.operator.is_ordering()) {
        (FieldKind::Pattern, false) => TextRhs::compile(literal).map(Test::Text),
        (FieldKind::Files, false) => TextRhs::compile(literal).map(Test::Files),
        (FieldKind::Tags, false) => TagRhs::compile(literal).map(Test::Tags),
        (FieldKind::Bool, false) => literal.as_bool().map(Test::Flag).ok_or_else(unsupported),
        (FieldKind::Pattern | FieldKind::Files | FieldKind::Tags | FieldKind::Bool, true) => {
            Err(unsupported())
        }
        (FieldKind::Number, _) => NumberRhs::compile(literal, plain_multiplier)
            .map(|rhs| Test::Number {
                rhs,
                whole_seconds: false,
            })
            .ok_or_else(unsupported),
        (FieldKind::Size, _) => NumberRhs::compile(literal, size_multiplier)
            .map(|rhs| Test::Number {
                rhs,
                whole_seconds: false,
            })
            .ok_or_else(unsupported),
        (FieldKind::Duration, _) => NumberRhs::compile(literal, duration_multiplier)
            .map(|rhs| Test::Number {
                rhs,
                whole_seconds: true,
            })
            .ok_or_else(unsupported),
        (FieldKind::Timestamp, _) => {
            let rhs = NumberRhs::compile(literal, duration_multiplier).ok_or_else(unsupported)?;
            let granularity = match literal {
                Literal::Number { unit, .. } => duration_multiplier(*unit).unwrap_or(1.0),
                _ => 1.0,
            };
            Ok(Test::Age { rhs, granularity })
        }
        (FieldKind::Inferred, ordering) => {
            InferredTest::compile(literal, ordering)?.ok_or_else(unsupported)
        }
    }
}

/// The right-hand side of a text comparison.
#[derive(Debug, Clone)]
enum TextRhs {
    Pattern(Pattern),
    Template(Template),
}

impl TextRhs {
    fn compile(literal: &Literal) -> FilterResult<Self> {
        if let Literal::Template(template) = literal {
            return Ok(TextRhs::Template(template.clone()));
        }
        Pattern::from_literal(literal)
            .transpose()?
            .map(TextRhs::Pattern)
            .ok_or_else(|| FilterError::invalid_pattern(literal.to_string(), "no pattern text"))
    }

    /// Returns the pattern for this item, resolving templates.
    fn resolve(&self, item: &dyn Item) -> Option<Cow<'_, Pattern>> {
        match self {
            TextRhs::Pattern(pattern) => Some(Cow::Borrowed(pattern)),
            TextRhs::Template(template) => {
                let text = template.resolve(item)?;
                Pattern::glob(&text).ok().map(Cow::Owned)
            }
        }
    }
}

/// The right-hand side of a tag membership test.
#[derive(Debug, Clone)]
enum TagRhs {
    /// A hidden tag, which never matches.
    Hidden,
    /// Matches when there are no visible tags.
    Empty,
    Text(TextRhs),
}

impl TagRhs {
    fn compile(literal: &Literal) -> FilterResult<Self> {
        match literal.pattern_text() {
            Some(text) if text.starts_with(HIDDEN_TAG_PREFIX) => Ok(TagRhs::Hidden),
            Some("") => Ok(TagRhs::Empty),
            _ => TextRhs::compile(literal).map(TagRhs::Text),
        }
    }
}

/// The right-hand side of a numeric comparison.
#[derive(Debug, Clone)]
enum NumberRhs {
    Fixed(f64),
    Deferred {
        template: Template,
        multiplier: Multiplier,
    },
}

impl NumberRhs {
    /// Scales a number literal by its unit; `None` if the literal is not a
    /// number or the unit does not apply.
    fn compile(literal: &Literal, multiplier: Multiplier) -> Option<Self> {
        match literal {
            Literal::Number { value, unit, .. } => {
                multiplier(*unit).map(|scale| NumberRhs::Fixed(value * scale))
            }
            Literal::Template(template) => Some(NumberRhs::Deferred {
                template: template.clone(),
                multiplier,
            }),
            _ => None,
        }
    }

    fn resolve(&self, item: &dyn Item) -> Option<f64> {
        match self {
            NumberRhs::Fixed(value) => Some(*value),
            NumberRhs::Deferred {
                template,
                multiplier,
            } => parse_quantity(&template.resolve(item)?, *multiplier),
        }
    }
}

/// A comparison on a field of unknown kind.
#[derive(Debug, Clone)]
struct InferredTest {
    text: Option<TextRhs>,
    number: Option<f64>,
    flag: Option<bool>,
    /// The literal names a hidden list element.
    hidden: bool,
}

impl InferredTest {
    /// Returns `None` for an ordering operator without a number.
    fn compile(literal: &Literal, ordering: bool) -> FilterResult<Option<Test>> {
        let number = match literal {
            Literal::Number { value, unit, .. } => inferred_multiplier(*unit).map(|m| value * m),
            _ => None,
        };

        if ordering {
            return Ok(number.map(|number| {
                Test::Inferred(Self {
                    text: None,
                    number: Some(number),
                    flag: None,
                    hidden: false,
                })
            }));
        }

        Ok(Some(Test::Inferred(Self {
            text: Some(TextRhs::compile(literal)?),
            number,
            flag: literal.as_bool(),
            hidden: literal
                .pattern_text()
                .is_some_and(|text| text.starts_with(HIDDEN_TAG_PREFIX)),
        })))
    }

    fn check(&self, operator: Operator, value: &Value, item: &dyn Item) -> Option<bool> {
        match value {
            Value::Boolean(actual) => match (self.flag, self.number) {
                (Some(expected), _) => Some(equality(operator, *actual == expected)),
                (None, Some(number)) => compare(operator, f64::from(u8::from(*actual)), number),
                (None, None) => self.text_match(operator, item, &value.to_text()?),
            },
            Value::Number(actual) => match (self.number, self.flag) {
                (Some(number), _) => compare(operator, *actual, number),
                (None, Some(expected)) => Some(equality(operator, (*actual != 0.0) == expected)),
                (None, None) => self.text_match(operator, item, &value.to_text()?),
            },
            Value::String(_) if operator.is_ordering() => {
                compare(operator, value.as_number()?, self.number?)
            }
            Value::String(text) => self.text_match(operator, item, text),
            Value::List(_) if !operator.is_ordering() => {
                if self.hidden {
                    return Some(equality(operator, false));
                }
                let pattern = self.text.as_ref()?.resolve(item)?;
                let hit = visible_tags(value)?
                    .iter()
                    .any(|element| pattern.is_match(element));
                Some(equality(operator, hit))
            }
            Value::List(_) | Value::Records(_) => None,
        }
    }

    fn text_match(&self, operator: Operator, item: &dyn Item, text: &str) -> Option<bool> {
        let pattern = self.text.as_ref()?.resolve(item)?;
        Some(equality(operator, pattern.is_match(text)))
    }
}

/// Visible tags of a tag field; a string holds whitespace-separated tags.
///
/// Also used for list values of unregistered fields.
fn visible_tags(value: &Value) -> Option<Vec<String>> {
    let tags: Vec<String> = match value {
        Value::String(text) => text.split_whitespace().map(str::to_string).collect(),
        Value::List(values) => values.iter().filter_map(Value::to_text).collect(),
        Value::Number(_) | Value::Boolean(_) => vec![value.to_text()?],
        Value::Records(_) => return None,
    };
    Some(
        tags.into_iter()
            .filter(|tag| !tag.is_empty() && !tag.starts_with(HIDDEN_TAG_PREFIX))
            .collect(),
    )
}

/// Paths of a file field: records with a `path`, or plain path strings.
fn file_paths(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Records(records) => Some(
            records
                .iter()
                .filter_map(|record| record.field(FILE_PATH_FIELD))
                .filter_map(Value::to_text)
                .collect(),
        ),
        Value::List(values) => Some(values.iter().filter_map(Value::to_text).collect()),
        Value::String(path) => Some(vec![path.clone()]),
        Value::Number(_) | Value::Boolean(_) => None,
    }
}

fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(flag) => Some(*flag),
        Value::Number(number) => Some(*number != 0.0),
        Value::String(text) => parse_bool_word(text),
        Value::List(_) | Value::Records(_) => None,
    }
}
