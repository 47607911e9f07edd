//! The boundary to whatever lists items, typically an rTorrent client.

use std::convert::Infallible;

use tracing::debug;

use super::expression::Expression;
use super::item::Item;
use super::prefilter::PreFilter;

/// Something that can list items, optionally narrowing them server-side.
///
/// Implementations are free to ignore the pre-filter; any narrowing is an
/// optimization only, since every listed item is checked again locally.
pub trait ItemSource {
    /// The listed item type.
    type Item: Item;
    /// Error raised while listing.
    type Error;

    /// Lists the items of a view, applying `prefilter` if supported.
    fn list_items(
        &self,
        view: &str,
        prefilter: Option<&PreFilter>,
    ) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Lists a view with the expression's pre-filter hint, then keeps only the
/// items the expression matches.
///
/// # Errors
///
/// Returns the source's error if listing fails.
///
/// # Example
///
/// ```
/// use rtfilter_rs::{select, Expression, Record};
///
/// let items = vec![
///     Record::new().with("name", "arch"),
///     Record::new().with("name", "debian"),
/// ];
/// let expr = Expression::parse("name=arch").unwrap();
/// let selected = select(&items, "main", &expr).unwrap();
/// assert_eq!(selected.len(), 1);
/// ```
pub fn select<S: ItemSource>(
    source: &S,
    view: &str,
    expression: &Expression,
) -> Result<Vec<S::Item>, S::Error> {
    let prefilter = expression.prefilter();
    let candidates = source.list_items(view, prefilter)?;
    let listed = candidates.len();

    let selected: Vec<S::Item> = candidates
        .into_iter()
        .filter(|item| expression.matches(item))
        .collect();

    debug!(
        view,
        prefilter = prefilter.map(PreFilter::as_str),
        listed,
        selected = selected.len(),
        "Selected items"
    );
    Ok(selected)
}

/// An in-memory list is a source that ignores views and pre-filters.
impl<T: Item + Clone> ItemSource for Vec<T> {
    type Item = T;
    type Error = Infallible;

    fn list_items(&self, _view: &str, _prefilter: Option<&PreFilter>) -> Result<Vec<T>, Infallible> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use std::cell::RefCell;

    /// A source that records the pre-filter it was given and applies a
    /// crude version of it, like a server would.
    struct RecordingSource {
        items: Vec<Record>,
        seen: RefCell<Vec<Option<String>>>,
    }

    impl ItemSource for RecordingSource {
        type Item = Record;
        type Error = String;

        fn list_items(
            &self,
            view: &str,
            prefilter: Option<&PreFilter>,
        ) -> Result<Vec<Record>, String> {
            if view != "main" {
                return Err(format!("unknown view '{view}'"));
            }
            self.seen
                .borrow_mut()
                .push(prefilter.map(|p| p.as_str().to_string()));
            Ok(self.items.clone())
        }
    }

    fn source() -> RecordingSource {
        RecordingSource {
            items: vec![
                Record::new().with("name", "Arch Linux").with("size", 100),
                Record::new().with("name", "debian").with("size", 200),
            ],
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_select_passes_prefilter() {
        let source = source();
        let expr = Expression::parse("name=arch*").unwrap();
        let selected = select(&source, "main", &expr).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(
            source.seen.borrow().as_slice(),
            &[Some(r#"string.contains_i=$d.name=,"arch""#.to_string())]
        );
    }

    #[test]
    fn test_select_without_prefilter_still_filters() {
        let source = source();
        let expr = Expression::parse("size>150").unwrap();
        let selected = select(&source, "main", &expr).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(source.seen.borrow().as_slice(), &[None]);
    }

    #[test]
    fn test_select_propagates_errors() {
        let expr = Expression::parse("name=arch").unwrap();
        assert_eq!(
            select(&source(), "nope", &expr).unwrap_err(),
            "unknown view 'nope'"
        );
    }
}
