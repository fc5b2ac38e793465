//! Post-build document transformations.
//!
//! After normalization the assembled document can be edited in place by a
//! list of caller-supplied transformations, applied in declaration order.
//! Each names a JSON-Path-style selector and a function run on every
//! location the selector matches.
//!
//! Selector grammar (a small subset of JSON-Path):
//!
//! - optional leading `$` for the document root
//! - `.name` — object key (also matches keys like `200`)
//! - `.*` or `[*]` — every element of an object or array
//! - `['key']` / `["key"]` — object keys containing `.`, `/`, or `[`
//! - `[0]` — array index
//!
//! Selectors that match nothing are no-ops; malformed selectors are skipped
//! entirely.

use std::fmt;

use serde_json::Value;

/// One in-place edit of the assembled document.
pub struct Transformation {
    selector: String,
    apply: Box<dyn Fn(&mut Value) + Send + Sync>,
}

impl Transformation {
    /// Run `apply` on every location matched by `selector`.
    pub fn new(
        selector: impl Into<String>,
        apply: impl Fn(&mut Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            apply: Box::new(apply),
        }
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Apply every transformation to `document`, in order.
pub(crate) fn apply_all(transformations: &[Transformation], document: &mut Value) {
    for transformation in transformations {
        if let Some(segments) = parse_selector(&transformation.selector) {
            visit_matches(document, &segments, &*transformation.apply);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

fn parse_selector(selector: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = selector.strip_prefix('$').unwrap_or(selector);
    while !rest.is_empty() {
        rest = rest.strip_prefix('.').unwrap_or(rest);
        if rest.is_empty() {
            break;
        }
        if let Some(tail) = rest.strip_prefix('[') {
            let (segment, remainder) = parse_bracket(tail)?;
            segments.push(segment);
            rest = remainder;
        } else {
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            let name = &rest[..end];
            segments.push(if name == "*" {
                Segment::Wildcard
            } else {
                Segment::Key(name.to_owned())
            });
            rest = &rest[end..];
        }
    }
    Some(segments)
}

fn parse_bracket(tail: &str) -> Option<(Segment, &str)> {
    if let Some(quoted) = tail.strip_prefix('\'') {
        let end = quoted.find('\'')?;
        let rest = quoted[end + 1..].strip_prefix(']')?;
        return Some((Segment::Key(quoted[..end].to_owned()), rest));
    }
    if let Some(quoted) = tail.strip_prefix('"') {
        let end = quoted.find('"')?;
        let rest = quoted[end + 1..].strip_prefix(']')?;
        return Some((Segment::Key(quoted[..end].to_owned()), rest));
    }
    if let Some(rest) = tail.strip_prefix("*]") {
        return Some((Segment::Wildcard, rest));
    }
    let end = tail.find(']')?;
    let index: usize = tail[..end].parse().ok()?;
    Some((Segment::Index(index), &tail[end + 1..]))
}

fn visit_matches(value: &mut Value, segments: &[Segment], apply: &dyn Fn(&mut Value)) {
    let Some((first, rest)) = segments.split_first() else {
        apply(value);
        return;
    };
    match (first, value) {
        (Segment::Key(key), Value::Object(map)) => {
            if let Some(child) = map.get_mut(key) {
                visit_matches(child, rest, apply);
            }
        }
        (Segment::Index(index), Value::Array(items)) => {
            if let Some(child) = items.get_mut(*index) {
                visit_matches(child, rest, apply);
            }
        }
        (Segment::Wildcard, Value::Object(map)) => {
            for child in map.values_mut() {
                visit_matches(child, rest, apply);
            }
        }
        (Segment::Wildcard, Value::Array(items)) => {
            for child in items {
                visit_matches(child, rest, apply);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn selector_parsing() {
        assert_eq!(
            parse_selector("$.info.title").unwrap(),
            vec![Segment::Key("info".into()), Segment::Key("title".into())]
        );
        assert_eq!(
            parse_selector("$.paths['/widgets/{id}'].get").unwrap(),
            vec![
                Segment::Key("paths".into()),
                Segment::Key("/widgets/{id}".into()),
                Segment::Key("get".into()),
            ]
        );
        assert_eq!(
            parse_selector("servers[0].url").unwrap(),
            vec![
                Segment::Key("servers".into()),
                Segment::Index(0),
                Segment::Key("url".into()),
            ]
        );
        assert_eq!(
            parse_selector("$.paths.*[*]").unwrap(),
            vec![
                Segment::Key("paths".into()),
                Segment::Wildcard,
                Segment::Wildcard,
            ]
        );
        assert!(parse_selector("$.paths['unclosed").is_none());
    }

    #[test]
    fn matched_locations_are_edited_in_place() {
        let mut document = json!({
            "info": { "title": "Widgets", "version": "1.0.0" }
        });
        let edit = Transformation::new("$.info.title", |value| {
            *value = json!("Widgets (internal)");
        });

        apply_all(&[edit], &mut document);
        assert_eq!(document["info"]["title"], json!("Widgets (internal)"));
    }

    #[test]
    fn wildcards_fan_out() {
        let mut document = json!({
            "paths": {
                "/a": { "get": { "x-order": 1 } },
                "/b": { "get": { "x-order": 2 } }
            }
        });
        let strip = Transformation::new("$.paths.*.*", |value| {
            if let Some(map) = value.as_object_mut() {
                map.remove("x-order");
            }
        });

        apply_all(&[strip], &mut document);
        assert_eq!(document["paths"]["/a"]["get"], json!({}));
        assert_eq!(document["paths"]["/b"]["get"], json!({}));
    }

    #[test]
    fn transformations_apply_in_declaration_order() {
        let mut document = json!({ "value": 1 });
        let double = Transformation::new("$.value", |value| {
            *value = json!(value.as_i64().unwrap() * 2);
        });
        let add_one = Transformation::new("$.value", |value| {
            *value = json!(value.as_i64().unwrap() + 1);
        });

        apply_all(&[double, add_one], &mut document);
        assert_eq!(document["value"], json!(3));
    }

    #[test]
    fn unmatched_selectors_are_no_ops() {
        let mut document = json!({ "a": 1 });
        let edit = Transformation::new("$.b.c", |value| {
            *value = json!(2);
        });
        apply_all(&[edit], &mut document);
        assert_eq!(document, json!({ "a": 1 }));
    }
}
