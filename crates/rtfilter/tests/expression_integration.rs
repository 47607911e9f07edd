//! Integration tests for parsing, matching and pre-filtering through the
//! public API.

use std::sync::Arc;
use std::thread;

use rtfilter_rs::{
    select, Expression, ExpressionCache, FieldKind, FieldRegistry, FilterError, ItemSource,
    PreFilter, Record,
};
use serde_json::json;

const GIB: u64 = 1024 * 1024 * 1024;

fn torrents() -> Vec<Record> {
    vec![
        Record::new()
            .with("name", "archlinux-2024.01.01-x86_64.iso")
            .with("alias", "ARCH")
            .with("size", GIB)
            .with("is_complete", true)
            .with("tagged", vec!["linux", ":seeding"]),
        Record::new()
            .with("name", "debian-12.4.0-amd64-netinst.iso")
            .with("alias", "DEBIAN")
            .with("size", 600u64 * 1024 * 1024)
            .with("is_complete", false)
            .with("tagged", vec!["linux"]),
        Record::new()
            .with("name", "Big Buck Bunny (2008) [1080p]")
            .with("size", 3 * GIB)
            .with("is_complete", true)
            .with("tagged", "video movie")
            .with(
                "files",
                vec![
                    Record::new().with("path", "Big Buck Bunny/bbb.mkv"),
                    Record::new().with("path", "Big Buck Bunny/bbb.nfo"),
                ],
            ),
    ]
}

fn names(items: &[&Record]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.field("name").and_then(|v| v.to_text()))
        .collect()
}

/// Evaluates a pre-filter the way the server would, for the conditions the
/// pre-filter compiler emits on the `name` field. The server folds ASCII
/// case only.
fn server_side_accepts(prefilter: &PreFilter, item: &Record) -> bool {
    let name = item
        .field("name")
        .and_then(|v| v.to_text())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let condition = prefilter.as_str();
    let needles: Vec<String> = condition
        .split("string.contains_i=$d.name=,\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_ascii_lowercase)
        .collect();
    needles.iter().all(|needle| name.contains(needle.as_str()))
}

/// A source that applies pre-filters like a server would.
struct FakeServer {
    items: Vec<Record>,
}

impl ItemSource for FakeServer {
    type Item = Record;
    type Error = std::convert::Infallible;

    fn list_items(
        &self,
        _view: &str,
        prefilter: Option<&PreFilter>,
    ) -> Result<Vec<Record>, Self::Error> {
        Ok(self
            .items
            .iter()
            .filter(|item| prefilter.map_or(true, |p| server_side_accepts(p, item)))
            .cloned()
            .collect())
    }
}

#[test]
fn test_filter_torrents() {
    let items = torrents();

    let expr = Expression::parse("name=arch* OR name=debian*").unwrap();
    assert_eq!(
        names(&expr.filter_items(&items)),
        vec![
            "archlinux-2024.01.01-x86_64.iso",
            "debian-12.4.0-amd64-netinst.iso"
        ]
    );

    let expr = Expression::parse("size>1G is_complete=yes").unwrap();
    assert_eq!(
        names(&expr.filter_items(&items)),
        vec!["Big Buck Bunny (2008) [1080p]"]
    );

    let expr = Expression::parse("tagged=linux NOT alias=debian").unwrap();
    assert_eq!(
        names(&expr.filter_items(&items)),
        vec!["archlinux-2024.01.01-x86_64.iso"]
    );

    let expr = Expression::parse("tagged=:seeding").unwrap();
    assert!(expr.filter_items(&items).is_empty());

    let expr = Expression::parse("files=*.nfo").unwrap();
    assert_eq!(expr.filter_items(&items).len(), 1);
}

#[test]
fn test_prefilter_matches_documented_form() {
    let expr = Expression::parse("name=arch").unwrap();
    let prefilter = expr.prefilter().unwrap();
    assert_eq!(prefilter.as_str(), r#"string.contains_i=$d.name=,"arch""#);
    assert_eq!(
        prefilter.to_string(),
        r#""string.contains_i=$d.name=,\"arch\"""#
    );
}

#[test]
fn test_untranslatable_expressions_still_match() {
    let items = torrents();
    for (input, expected) in [
        ("name=arch* OR name=debian*", 2),
        ("NOT name=arch*", 2),
        ("name=/^big/i", 1),
        ("size>1G", 1),
        ("name=big* OR is_complete=no", 2),
    ] {
        let expr = Expression::parse(input).unwrap();
        assert!(expr.prefilter().is_none(), "input: {input}");
        assert_eq!(expr.filter_items(&items).len(), expected, "input: {input}");
    }
}

#[test]
fn test_prefilter_never_drops_matches() {
    let items = torrents();
    for input in [
        "name=arch*",
        "name=*ARCH*",
        "name=*bunny*",
        "name=\"Big Buck*\"",
        "name=*.iso name=*amd64*",
        "[ name=*1080p* ] name=big*",
        "name=debian-12.?.0*",
    ] {
        let expr = Expression::parse(input).unwrap();
        let prefilter = expr.prefilter().unwrap_or_else(|| panic!("no prefilter: {input}"));

        for item in &items {
            if expr.matches(item) {
                assert!(
                    server_side_accepts(prefilter, item),
                    "prefilter {prefilter} rejected a match for {input}"
                );
            }
        }
    }
}

#[test]
fn test_prefilter_keeps_unicode_case_folds() {
    let items = vec![
        Record::new().with("name", "\u{212A}ernel-6.1.tar"),
        Record::new().with("name", "Linux-\u{17F}ources.tar"),
        Record::new().with("name", "kernel-6.1.tar"),
    ];
    for input in ["name=kernel*", "name=*SOURCES*", "name=*linux-sources.tar"] {
        let expr = Expression::parse(input).unwrap();
        let prefilter = expr.prefilter();

        for item in &items {
            if expr.matches(item) {
                assert!(
                    prefilter.map_or(true, |p| server_side_accepts(p, item)),
                    "prefilter {prefilter:?} rejected a match for {input}"
                );
            }
        }
    }

    let expr = Expression::parse("name=kernel*").unwrap();
    assert_eq!(expr.filter_items(&items).len(), 2);
}

#[test]
fn test_prefilter_follows_configured_kinds() {
    let registry = FieldRegistry::torrent().with_field("name", FieldKind::Number);
    let items = vec![Record::new().with("name", "5"), Record::new().with("name", "6")];

    let expr = Expression::parse_with("name=05", &registry).unwrap();
    assert!(expr.prefilter().is_none());
    assert_eq!(expr.filter_items(&items).len(), 1);

    let server = FakeServer { items };
    assert_eq!(select(&server, "main", &expr).unwrap().len(), 1);
}

#[test]
fn test_select_through_source() {
    let server = FakeServer { items: torrents() };

    let expr = Expression::parse("name=*.iso is_complete=no").unwrap();
    let selected = select(&server, "main", &expr).unwrap();
    assert_eq!(selected.len(), 1);

    let expr = Expression::parse("name=*linux*").unwrap();
    let selected = select(&server, "main", &expr).unwrap();
    assert_eq!(selected.len(), 1);
}

#[test]
fn test_json_documents() {
    let items = vec![
        json!({"name": "one", "size": 10, "tagged": ["a", "b"]}),
        json!({"name": "two", "size": 20, "tagged": "b c"}),
        json!({"name": "three", "tagged": null}),
    ];
    let expr = Expression::parse("tagged=b size>=10").unwrap();
    assert_eq!(expr.filter_items(&items).len(), 2);

    let expr = Expression::parse("tagged=c OR name=three").unwrap();
    assert_eq!(expr.filter_items(&items).len(), 2);
}

#[test]
fn test_errors_surface_at_parse_time() {
    assert_eq!(Expression::parse("").unwrap_err(), FilterError::EmptyExpression);
    assert!(Expression::parse("NOT").unwrap_err().is_syntax_error());
    assert!(Expression::parse("NOT OR").unwrap_err().is_syntax_error());
    assert!(Expression::parse("[ name!=name").unwrap_err().is_syntax_error());
    assert!(Expression::parse("name==name ]").unwrap_err().is_syntax_error());
    assert!(!Expression::parse("is_complete<yes")
        .unwrap_err()
        .is_syntax_error());
}

#[test]
fn test_shared_expression_across_threads() {
    let cache = Arc::new(ExpressionCache::new());
    let items = Arc::new(torrents());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let items = Arc::clone(&items);
            thread::spawn(move || {
                let expr = cache.get_or_parse("tagged=linux").unwrap();
                expr.filter_items(items.as_slice()).len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_canonical_display() {
    let expr = Expression::parse("arch*   OR [ alias==Ubuntu loaded>1w ]").unwrap();
    assert_eq!(
        expr.to_string(),
        "name=arch* OR [ alias=Ubuntu loaded>1w ]"
    );
    let again = Expression::parse(&expr.to_string()).unwrap();
    assert_eq!(again.ast(), expr.ast());
}
