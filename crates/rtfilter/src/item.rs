//! The item capability that filters are evaluated against.
//!
//! Filters never assume anything about where an item's data lives. An item
//! only has to answer [`Item::get`] for a field; a `None` answer makes any
//! condition on that field a non-match.

use std::collections::BTreeMap;

use serde::Serialize;

use super::ast::FieldRef;

/// A field value exposed by an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text.
    String(String),
    /// Any numeric value: sizes in bytes, durations in seconds, timestamps
    /// in seconds since the epoch, ratios.
    Number(f64),
    /// A flag.
    Boolean(bool),
    /// A list of scalar values, e.g. tags.
    List(Vec<Value>),
    /// Nested records, e.g. the files of a download.
    Records(Vec<Record>),
}

impl Value {
    /// Returns the text form used for pattern matching and template
    /// substitution. Nested records have none.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(format_number(*number)),
            Value::Boolean(flag) => Some(flag.to_string()),
            Value::List(values) => {
                let parts: Option<Vec<String>> = values.iter().map(Value::to_text).collect();
                parts.map(|parts| parts.join(" "))
            }
            Value::Records(_) => None,
        }
    }

    /// Coerces the value to a number, if it has a numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Boolean(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::String(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::List(_) | Value::Records(_) => None,
        }
    }

    /// Converts a JSON value. `null` has no field value.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(flag) => Some(Value::Boolean(*flag)),
            serde_json::Value::Number(number) => number.as_f64().map(Value::Number),
            serde_json::Value::String(text) => Some(Value::String(text.clone())),
            serde_json::Value::Array(values) => {
                if !values.is_empty() && values.iter().all(serde_json::Value::is_object) {
                    Some(Value::Records(
                        values.iter().filter_map(Record::from_json).collect(),
                    ))
                } else {
                    Some(Value::List(values.iter().filter_map(Value::from_json).collect()))
                }
            }
            serde_json::Value::Object(_) => Record::from_json(json).map(|r| Value::Records(vec![r])),
        }
    }
}

/// Formats whole numbers without a fractional part.
fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(number as f64)
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Value::Number(number as f64)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(f64::from(number))
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Boolean(flag)
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::List(values.into_iter().map(Value::from).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<Vec<Record>> for Value {
    fn from(records: Vec<Record>) -> Self {
        Value::Records(records)
    }
}

/// Something that can be tested against a filter.
///
/// Implementations must answer consistently for the duration of one match
/// call; the filter never mutates the item.
pub trait Item {
    /// Returns the value of a field, or `None` if the item does not have it.
    fn get(&self, field: &FieldRef) -> Option<Value>;
}

impl<T: Item + ?Sized> Item for &T {
    fn get(&self, field: &FieldRef) -> Option<Value> {
        (**self).get(field)
    }
}

/// An in-memory item: an ordered map of field names to values.
///
/// # Example
///
/// ```
/// use rtfilter_rs::{Record, Value};
///
/// let item = Record::new()
///     .with("name", "ubuntu-22.04.iso")
///     .with("size", 3_600_000_000u64)
///     .with("tagged", vec!["linux", "iso"]);
/// assert_eq!(item.field("name"), Some(&Value::from("ubuntu-22.04.iso")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record with a field set.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns a field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Converts a JSON object; other JSON values are not records.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let object = json.as_object()?;
        let fields = object
            .iter()
            .filter_map(|(name, value)| Some((name.clone(), Value::from_json(value)?)))
            .collect();
        Some(Self(fields))
    }

    /// Resolves a dotted path, descending into nested records.
    ///
    /// A path through a list of records yields the list of their values.
    fn lookup(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.0.get(head)?;
        let Some(rest) = rest else {
            return Some(value.clone());
        };

        match value {
            Value::Records(records) if records.len() == 1 => records[0].lookup(rest),
            Value::Records(records) => Some(Value::List(
                records.iter().filter_map(|r| r.lookup(rest)).collect(),
            )),
            _ => None,
        }
    }
}

impl Item for Record {
    fn get(&self, field: &FieldRef) -> Option<Value> {
        self.lookup(field.name())
    }
}

impl Item for serde_json::Value {
    fn get(&self, field: &FieldRef) -> Option<Value> {
        let mut current = self;
        for segment in field.name().split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Value::from_json(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_get_strips_rtorrent_prefix() {
        let item = Record::new().with("name", "arch");
        assert_eq!(item.get(&FieldRef::new("d.name")), Some(Value::from("arch")));
        assert_eq!(item.get(&FieldRef::new("alias")), None);
    }

    #[test]
    fn test_record_nested_lookup() {
        let item = Record::new().with(
            "files",
            vec![
                Record::new().with("path", "a.mkv"),
                Record::new().with("path", "b.nfo"),
            ],
        );
        assert_eq!(
            item.get(&FieldRef::new("files.path")),
            Some(Value::from(vec!["a.mkv", "b.nfo"]))
        );
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::from(5.0).to_text(), Some("5".to_string()));
        assert_eq!(Value::from(2.5).to_text(), Some("2.5".to_string()));
        assert_eq!(
            Value::from(vec!["a", "b"]).to_text(),
            Some("a b".to_string())
        );
        assert_eq!(Value::Records(vec![]).to_text(), None);
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::from("42").as_number(), Some(42.0));
        assert_eq!(Value::from("n/a").as_number(), None);
        assert_eq!(Value::from("NaN").as_number(), None);
        assert_eq!(Value::from(true).as_number(), Some(1.0));
    }

    #[test]
    fn test_json_item() {
        let item = json!({
            "name": "ubuntu",
            "size": 1024,
            "is_complete": true,
            "tagged": ["linux", "iso"],
            "files": [{"path": "ubuntu.iso"}],
            "message": null,
            "custom": {"alias": "UBU"}
        });

        assert_eq!(Item::get(&item, &FieldRef::new("name")), Some(Value::from("ubuntu")));
        assert_eq!(Item::get(&item, &FieldRef::new("size")), Some(Value::Number(1024.0)));
        assert_eq!(Item::get(&item, &FieldRef::new("is_complete")), Some(Value::Boolean(true)));
        assert_eq!(
            Item::get(&item, &FieldRef::new("tagged")),
            Some(Value::from(vec!["linux", "iso"]))
        );
        assert!(matches!(
            Item::get(&item, &FieldRef::new("files")),
            Some(Value::Records(records)) if records.len() == 1
        ));
        assert_eq!(Item::get(&item, &FieldRef::new("message")), None);
        assert_eq!(
            Item::get(&item, &FieldRef::new("custom.alias")),
            Some(Value::from("UBU"))
        );
    }
}
