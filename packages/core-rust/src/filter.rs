//! Query-string driven filtering and sorting of apple lists.
//!
//! A filter is a flat map of string keys to string values, exactly as it
//! arrives in a query string. Every key except [`SORT_KEY`] is a dot-path
//! into the record; its value is either an exact match or, when prefixed
//! with `~`, a case-insensitive regular expression. All filters must match.
//! [`SORT_KEY`] names a top-level field to order by (`-field` for
//! descending).
//!
//! Filtering never fails to its caller. Bad input (such as an invalid
//! pattern or a key given more than once) yields [`FilterOutcome::Failed`],
//! which the HTTP layer returns as an ordinary response body.

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::types::Apple;
use crate::value::{compare, is_truthy, render};

/// Reserved key selecting the sort field instead of filtering.
pub const SORT_KEY: &str = "sort";

/// Message carried by [`FilterFailure`].
pub const FILTER_ERROR_MESSAGE: &str = "An error occurred while filtering.";

/// Flat filter map as parsed from a query string.
pub type FilterMap = BTreeMap<String, String>;

/// Error payload reported in place of a result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFailure {
    pub error: String,
    /// The filter exactly as received. A repeated key holds an array of
    /// its values.
    pub filter: Map<String, Value>,
}

/// Result of [`apply`]: either the surviving records or an error payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Matched(Vec<Apple>),
    Failed(FilterFailure),
}

impl FilterOutcome {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The matched records, or `None` for a failed filter.
    #[must_use]
    pub fn into_matched(self) -> Option<Vec<Apple>> {
        match self {
            Self::Matched(apples) => Some(apples),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum FilterError {
    #[error("invalid pattern for `{key}`: {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}

enum Matcher {
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    fn parse(key: &str, raw: &str) -> Result<Self, FilterError> {
        match raw.strip_prefix('~') {
            Some(pattern) => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(Matcher::Pattern)
                .map_err(|source| FilterError::Pattern {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(Matcher::Exact(raw.to_string())),
        }
    }

    fn matches(&self, rendered: &str) -> bool {
        match self {
            Matcher::Exact(expected) => rendered == expected,
            Matcher::Pattern(regex) => regex.is_match(rendered),
        }
    }
}

/// Filters and optionally sorts `apples` according to `filter`.
///
/// With an empty filter map the input is returned unchanged, in order.
#[must_use]
pub fn apply(apples: &[Apple], filter: &FilterMap) -> FilterOutcome {
    match try_apply(apples, filter) {
        Ok(matched) => FilterOutcome::Matched(matched),
        Err(e) => {
            warn!(error = %e, "filtering failed");
            FilterOutcome::Failed(failure(
                filter
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect(),
            ))
        }
    }
}

/// Like [`apply`], but takes raw query pairs in arrival order.
///
/// Every key must appear once. A repeated key cannot be matched against a
/// single string, so it fails the whole filter.
#[must_use]
pub fn apply_query(apples: &[Apple], pairs: &[(String, String)]) -> FilterOutcome {
    let mut received = Map::new();
    let mut repeated = None;

    for (key, value) in pairs {
        match received.get_mut(key) {
            None => {
                received.insert(key.clone(), Value::String(value.clone()));
            }
            Some(Value::Array(values)) => values.push(Value::String(value.clone())),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value.clone())]);
                repeated.get_or_insert(key);
            }
        }
    }

    if let Some(key) = repeated {
        warn!(%key, "filtering failed: key given more than once");
        return FilterOutcome::Failed(failure(received));
    }

    let filter: FilterMap = pairs.iter().cloned().collect();
    apply(apples, &filter)
}

fn failure(filter: Map<String, Value>) -> FilterFailure {
    FilterFailure {
        error: FILTER_ERROR_MESSAGE.to_string(),
        filter,
    }
}

fn try_apply(apples: &[Apple], filter: &FilterMap) -> Result<Vec<Apple>, FilterError> {
    let mut matched = apples.to_vec();

    for (key, raw) in filter.iter().filter(|(key, _)| *key != SORT_KEY) {
        let matcher = Matcher::parse(key, raw)?;
        matched.retain(|apple| matcher.matches(&resolve(apple, key)));
    }

    if let Some(sort) = filter.get(SORT_KEY).filter(|s| !s.is_empty()) {
        sort_by_field(&mut matched, sort);
    }

    Ok(matched)
}

/// Walks `path` through `apple` and renders whatever it lands on.
///
/// The walk is best effort: a segment whose child is missing or falsy is
/// skipped and the walk stays on the current value. A path whose first
/// segment is missing therefore resolves to the record itself.
fn resolve(apple: &Apple, path: &str) -> String {
    let mut current: Option<Cow<'_, Value>> = None;

    for segment in path.split('.') {
        let found = match &current {
            None => apple.get(segment).map(Cow::Borrowed),
            Some(value) => child(value, segment),
        };
        if let Some(next) = found.filter(|v| is_truthy(v)) {
            current = Some(next);
        }
    }

    current.map_or_else(|| "[object Object]".to_string(), |value| render(&value))
}

fn child<'a>(value: &Cow<'a, Value>, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Cow::Borrowed(value) => property(*value, segment),
        Cow::Owned(value) => property(value, segment).map(|found| Cow::Owned(found.into_owned())),
    }
}

/// Looks up `segment` on `value`: object keys, array and string indices,
/// and `length` on arrays and strings.
fn property<'a>(value: &'a Value, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(fields) => fields.get(segment).map(Cow::Borrowed),
        Value::Array(items) if segment == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => index(segment)
            .and_then(|i| items.get(i))
            .map(Cow::Borrowed),
        Value::String(s) if segment == "length" => {
            Some(Cow::Owned(Value::from(s.encode_utf16().count())))
        }
        Value::String(s) => index(segment)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Cow::Owned(Value::String(c.to_string()))),
        _ => None,
    }
}

/// Parses a canonical index segment (`"1"`, not `"01"` or `"+1"`).
fn index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|i| i.to_string() == segment)
}

fn sort_by_field(apples: &mut [Apple], sort: &str) {
    let (field, descending) = match sort.strip_prefix('-') {
        Some(field) => (field, true),
        None => (sort, false),
    };
    apples.sort_by(|a, b| {
        let ordering = compare(a.get(field), b.get(field));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(pairs: &[(&str, &str)]) -> FilterMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn names(outcome: FilterOutcome) -> Vec<String> {
        outcome
            .into_matched()
            .expect("filter should succeed")
            .iter()
            .map(Apple::display_name)
            .collect()
    }

    fn orchard() -> Vec<Apple> {
        vec![
            Apple::named("gala")
                .with("colors", json!(["red", "yellow"]))
                .with("flavors", json!(["sweet"]))
                .with("origin", json!({"country": "NZ", "year": 1934})),
            Apple::named("granny smith")
                .with("colors", json!(["green"]))
                .with("flavors", json!(["tart"]))
                .with("origin", json!({"country": "AU", "year": 1868})),
            Apple::named("fuji")
                .with("colors", json!(["red"]))
                .with("flavors", json!(["sweet", "crisp"]))
                .with("origin", json!({"country": "JP", "year": 1939})),
        ]
    }

    #[test]
    fn empty_filter_returns_input_unchanged() {
        let apples = orchard();
        assert_eq!(
            apply(&apples, &FilterMap::new()),
            FilterOutcome::Matched(apples.clone())
        );
    }

    #[test]
    fn exact_match_on_rendered_value() {
        let apples = orchard();
        assert_eq!(names(apply(&apples, &filter(&[("colors", "red")]))), ["fuji"]);
        assert_eq!(
            names(apply(&apples, &filter(&[("colors", "red,yellow")]))),
            ["gala"]
        );
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        assert!(names(apply(&orchard(), &filter(&[("name", "Gala")]))).is_empty());
    }

    #[test]
    fn regex_match_is_case_insensitive() {
        let apples = vec![Apple::named("x").with("colors", "Red Delicious")];
        assert_eq!(names(apply(&apples, &filter(&[("colors", "~red")]))), ["x"]);
    }

    #[test]
    fn regex_matches_anywhere_in_rendering() {
        let apples = orchard();
        assert_eq!(
            names(apply(&apples, &filter(&[("flavors", "~CRISP")]))),
            ["fuji"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("name", "~^g")]))),
            ["gala", "granny smith"]
        );
    }

    #[test]
    fn filters_are_conjunctive() {
        let f = filter(&[("colors", "~red"), ("flavors", "sweet")]);
        assert_eq!(names(apply(&orchard(), &f)), ["gala"]);
    }

    #[test]
    fn dot_path_reaches_nested_fields() {
        let apples = orchard();
        assert_eq!(
            names(apply(&apples, &filter(&[("origin.country", "JP")]))),
            ["fuji"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("origin.year", "1868")]))),
            ["granny smith"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("colors.1", "yellow")]))),
            ["gala"]
        );
    }

    #[test]
    fn missing_segment_falls_back_to_parent() {
        let apples = orchard();
        // `origin.region` does not exist, so the walk stops on `origin`.
        assert_eq!(
            names(apply(&apples, &filter(&[("origin.region", "[object Object]")]))),
            ["gala", "granny smith", "fuji"]
        );
        // A missing top-level field leaves the record itself.
        assert_eq!(
            names(apply(&apples, &filter(&[("region", "[object Object]")]))),
            ["gala", "granny smith", "fuji"]
        );
        // ...and the walk carries on from there with the next segment.
        assert_eq!(
            names(apply(&apples, &filter(&[("region.name", "gala")]))),
            ["gala"]
        );
    }

    #[test]
    fn falsy_leaf_is_skipped() {
        let apples = vec![
            Apple::named("a").with("stock", json!({"count": 0})),
            Apple::named("b").with("stock", json!({"count": 3})),
        ];
        assert_eq!(names(apply(&apples, &filter(&[("stock.count", "3")]))), ["b"]);
        assert!(names(apply(&apples, &filter(&[("stock.count", "0")]))).is_empty());
    }

    #[test]
    fn sort_ascending_and_descending() {
        let apples = orchard();
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "name")]))),
            ["fuji", "gala", "granny smith"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "-name")]))),
            ["granny smith", "gala", "fuji"]
        );
    }

    #[test]
    fn sort_descending_keeps_already_descending_input() {
        let apples = vec![Apple::named("b"), Apple::named("a")];
        assert_eq!(names(apply(&apples, &filter(&[("sort", "-name")]))), ["b", "a"]);
    }

    #[test]
    fn sort_applies_after_filtering() {
        let f = filter(&[("colors", "~red"), ("sort", "-name")]);
        assert_eq!(names(apply(&orchard(), &f)), ["gala", "fuji"]);
    }

    #[test]
    fn sort_on_numbers_is_numeric() {
        let apples = vec![
            Apple::named("a").with("weight", 100),
            Apple::named("b").with("weight", 9),
            Apple::named("c").with("weight", 25),
        ];
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "weight")]))),
            ["b", "c", "a"]
        );
    }

    #[test]
    fn sort_places_records_missing_the_field_first() {
        let apples = vec![Apple::named("a").with("rank", 1), Apple::named("b")];
        assert_eq!(names(apply(&apples, &filter(&[("sort", "rank")]))), ["b", "a"]);
    }

    #[test]
    fn empty_sort_value_leaves_order() {
        let apples = orchard();
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "")]))),
            ["gala", "granny smith", "fuji"]
        );
    }

    #[test]
    fn invalid_pattern_reports_failure_payload() {
        let f = filter(&[("name", "~(unclosed"), ("sort", "name")]);
        let outcome = apply(&orchard(), &f);
        assert!(outcome.is_failed());
        assert_eq!(
            outcome,
            FilterOutcome::Failed(FilterFailure {
                error: FILTER_ERROR_MESSAGE.to_string(),
                filter: serde_json::from_value(json!({"name": "~(unclosed", "sort": "name"}))
                    .unwrap(),
            })
        );
    }

    #[test]
    fn failure_payload_echoes_received_filter() {
        let f = filter(&[("colors", "~[")]);
        let FilterOutcome::Failed(failure) = apply(&orchard(), &f) else {
            panic!("expected failure");
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"error": "An error occurred while filtering.", "filter": {"colors": "~["}})
        );
    }

    #[test]
    fn length_resolves_on_arrays_and_strings() {
        let apples = vec![
            Apple::named("gala").with("colors", json!(["red", "yellow"])),
            Apple::named("fuji").with("colors", json!(["red"])),
        ];
        assert_eq!(
            names(apply(&apples, &filter(&[("colors.length", "2")]))),
            ["gala"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("name.length", "4")]))),
            ["gala", "fuji"]
        );
    }

    #[test]
    fn index_resolves_into_strings() {
        let apples = orchard();
        assert_eq!(
            names(apply(&apples, &filter(&[("name.0", "g")]))),
            ["gala", "granny smith"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("colors.0.length", "5")]))),
            ["granny smith"]
        );
    }

    #[test]
    fn empty_array_length_is_falsy_and_skipped() {
        let apples = vec![Apple::named("bare").with("colors", json!([]))];
        // Length 0 is skipped, so the walk stays on the (empty) array.
        assert_eq!(
            names(apply(&apples, &filter(&[("colors.length", "")]))),
            ["bare"]
        );
    }

    #[test]
    fn sort_ties_keep_insertion_order() {
        let apples = vec![
            Apple::named("a").with("rank", 1),
            Apple::named("b").with("rank", 1),
            Apple::named("low").with("rank", 0),
            Apple::named("c").with("rank", 1),
        ];
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "rank")]))),
            ["low", "a", "b", "c"]
        );
        assert_eq!(
            names(apply(&apples, &filter(&[("sort", "-rank")]))),
            ["a", "b", "c", "low"]
        );
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn query_pairs_filter_like_a_map() {
        let outcome = apply_query(&orchard(), &pairs(&[("colors", "~red"), ("sort", "name")]));
        assert_eq!(names(outcome), ["fuji", "gala"]);
    }

    #[test]
    fn repeated_query_key_fails_with_values_grouped() {
        let outcome = apply_query(
            &orchard(),
            &pairs(&[("name", "gala"), ("sort", "name"), ("name", "fuji")]),
        );
        let FilterOutcome::Failed(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({
                "error": "An error occurred while filtering.",
                "filter": {"name": ["gala", "fuji"], "sort": "name"},
            })
        );
    }
}
