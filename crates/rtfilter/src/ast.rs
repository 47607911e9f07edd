//! Abstract Syntax Tree (AST) for filter expressions.

use std::cmp::Ordering;
use std::fmt;

use super::lexer::RawCondition;
use super::parser::SyntaxNode;
use super::value::Literal;

/// A comparison operator. `==` and `<>` are read as `=` and `!=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` or `==`
    Equal,
    /// `!=` or `<>`
    NotEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
}

impl Operator {
    /// Returns true for `>`, `>=`, `<` and `<=`.
    pub fn is_ordering(self) -> bool {
        !matches!(self, Operator::Equal | Operator::NotEqual)
    }

    /// Returns true if the outcome of comparing `lhs` to `rhs` satisfies the operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::Greater => ordering == Ordering::Greater,
            Operator::GreaterEqual => ordering != Ordering::Less,
            Operator::Less => ordering == Ordering::Less,
            Operator::LessEqual => ordering != Ordering::Greater,
        }
    }

    /// Returns the canonical spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted path naming an item attribute, e.g. `name` or `d.name`.
///
/// The rTorrent-style `d.` prefix is kept as written but ignored by
/// [`FieldRef::name`], which is what items and the field registry see.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef(String);

impl FieldRef {
    /// Creates a field reference from a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Parses a field path, returning `None` if it is not one.
    pub fn parse(path: &str) -> Option<Self> {
        let valid = !path.is_empty()
            && path.split('.').all(|segment| {
                let mut chars = segment.chars();
                chars
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
        valid.then(|| Self::new(path))
    }

    /// Returns the path as written.
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Returns the path without an rTorrent `d.` prefix.
    pub fn name(&self) -> &str {
        self.0.strip_prefix("d.").unwrap_or(&self.0)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field/operator/value comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// The field being compared.
    pub field: FieldRef,
    /// The comparison operator.
    pub operator: Operator,
    /// The literal compared against.
    pub value: Literal,
}

impl Condition {
    /// Creates a condition.
    pub fn new(field: FieldRef, operator: Operator, value: Literal) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.operator, self.value)
    }
}

/// Represents a parsed filter expression.
///
/// Precedence is already resolved by the shape of the tree: `Or` binds
/// loosest, juxtaposition (`And`) tighter, and `Not` applies to a single
/// condition or bracket group.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// All children must match (implicit, by juxtaposition).
    And(Vec<Node>),

    /// At least one child must match (explicit `OR`).
    Or(Vec<Node>),

    /// Logical NOT of a node.
    Not(Box<Node>),

    /// A bracketed sub-expression.
    Group(Box<Node>),

    /// A single comparison.
    Leaf(Condition),
}

impl Node {
    /// Creates a leaf from its parts.
    pub fn leaf(field: &str, operator: Operator, value: Literal) -> Self {
        Node::Leaf(Condition::new(FieldRef::new(field), operator, value))
    }

    /// Creates a NOT node.
    pub fn negate(inner: Node) -> Self {
        Node::Not(Box::new(inner))
    }

    /// Creates a bracket group.
    pub fn group(inner: Node) -> Self {
        Node::Group(Box::new(inner))
    }

    /// Returns all conditions in the tree, left to right.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Node::And(children) | Node::Or(children) => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
            Node::Not(inner) | Node::Group(inner) => inner.collect_conditions(out),
            Node::Leaf(condition) => out.push(condition),
        }
    }
}

/// Writes the canonical expression text; parsing it and writing it again
/// yields the same text.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[Node], sep: &str) -> fmt::Result {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{child}")?;
            }
            Ok(())
        }

        match self {
            Node::And(children) => join(f, children, " "),
            Node::Or(children) => join(f, children, " OR "),
            Node::Not(inner) => write!(f, "NOT {inner}"),
            Node::Group(inner) => write!(f, "[ {inner} ]"),
            Node::Leaf(condition) => write!(f, "{condition}"),
        }
    }
}

/// Builds a [`Node`] tree from a parse tree.
///
/// This is a pure transform: literals are classified, bare values are bound
/// to the default field, and nothing is validated beyond the structure.
#[derive(Debug, Clone)]
pub struct AstBuilder<'a> {
    default_field: &'a str,
}

impl<'a> AstBuilder<'a> {
    /// Creates a builder binding bare values to `default_field`.
    pub fn new(default_field: &'a str) -> Self {
        Self { default_field }
    }

    /// Transforms a parse tree into a filter tree.
    pub fn build(&self, syntax: &SyntaxNode) -> Node {
        match syntax {
            SyntaxNode::Or(children) => Node::Or(children.iter().map(|c| self.build(c)).collect()),
            SyntaxNode::And(children) => {
                Node::And(children.iter().map(|c| self.build(c)).collect())
            }
            SyntaxNode::Not(inner) => Node::negate(self.build(inner)),
            SyntaxNode::Bracket(inner) => Node::group(self.build(inner)),
            SyntaxNode::Condition(raw) => Node::Leaf(self.build_condition(raw)),
        }
    }

    fn build_condition(&self, raw: &RawCondition) -> Condition {
        let field = raw.field.as_deref().unwrap_or(self.default_field);
        Condition::new(
            FieldRef::new(field),
            raw.operator.unwrap_or(Operator::Equal),
            Literal::from_raw(&raw.value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_accepts() {
        assert!(Operator::GreaterEqual.accepts(Ordering::Equal));
        assert!(!Operator::Greater.accepts(Ordering::Equal));
        assert!(Operator::NotEqual.accepts(Ordering::Less));
        assert!(Operator::Less.is_ordering());
        assert!(!Operator::NotEqual.is_ordering());
    }

    #[test]
    fn test_field_ref_name_strips_prefix() {
        assert_eq!(FieldRef::new("d.name").name(), "name");
        assert_eq!(FieldRef::new("name").name(), "name");
        assert_eq!(FieldRef::new("d.name").path(), "d.name");
    }

    #[test]
    fn test_field_ref_parse() {
        assert!(FieldRef::parse("d.alias").is_some());
        assert!(FieldRef::parse("alias | upper").is_none());
        assert!(FieldRef::parse("").is_none());
        assert!(FieldRef::parse("a..b").is_none());
    }

    #[test]
    fn test_conditions_in_order() {
        let tree = Node::Or(vec![
            Node::leaf("a", Operator::Equal, Literal::Glob("1".to_string())),
            Node::negate(Node::group(Node::leaf(
                "b",
                Operator::Equal,
                Literal::Glob("2".to_string()),
            ))),
        ]);
        let fields: Vec<&str> = tree.conditions().iter().map(|c| c.field.path()).collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_display_canonical() {
        let tree = Node::Or(vec![
            Node::leaf("test", Operator::Equal, Literal::Glob("five".to_string())),
            Node::negate(Node::group(Node::And(vec![
                Node::leaf("name", Operator::Equal, Literal::Glob("test".to_string())),
                Node::leaf("name", Operator::NotEqual, Literal::Glob("test2".to_string())),
            ]))),
        ]);
        assert_eq!(
            tree.to_string(),
            "test=five OR NOT [ name=test name!=test2 ]"
        );
    }
}
