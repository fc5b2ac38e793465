//! The schema node DSL.
//!
//! A [`Schema`] is an immutable value describing one node of a JSON-schema
//! fragment: its kind (string, number, object, ...) plus the attributes every
//! kind shares (description, example, required/deprecated flags, named
//! examples). Builders are free functions ([`string`], [`object`], ...);
//! modifiers copy on write, so a node can be reused as a building block
//! without later edits bleeding into earlier documents:
//!
//! ```
//! use oasmith_core::string;
//!
//! let id = string().description("widget id");
//! let required_id = id.required();
//! assert!(!id.is_required());
//! assert!(required_id.is_required());
//! ```
//!
//! Rendering is driven by a [`RenderContext`]: `Fixed` nodes inline their
//! wrapped schema in flat representation and emit
//! `#/components/schemas/<label>` references otherwise, and external
//! reference nodes point at the resolved scratch copy of their file.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::{RenderContext, Representation};
use crate::error::{Result, SchemaError};

/// A named example attached to a schema node or route response.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Optional prose shown next to the example value.
    pub description: Option<String>,
    /// The literal example value.
    pub value: Value,
}

impl Example {
    /// Example with a value and no description.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            description: None,
            value: value.into(),
        }
    }

    /// Example with a value and a description.
    #[must_use]
    pub fn described(value: impl Into<Value>, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            value: value.into(),
        }
    }

    /// Render a named example map into the OpenAPI `examples` object: one
    /// `{description, value}` entry per name, the description omitted when
    /// absent.
    #[must_use]
    pub fn render_map(examples: &IndexMap<String, Self>) -> Value {
        let mut out = Map::new();
        for (name, example) in examples {
            let mut entry = Map::new();
            if let Some(text) = &example.description {
                entry.insert("description".into(), text.clone().into());
            }
            entry.insert("value".into(), example.value.clone());
            out.insert(name.clone(), Value::Object(entry));
        }
        Value::Object(out)
    }
}

/// One node of a validation schema.
///
/// Nodes are plain values: cloning is cheap enough for document-building
/// workloads and every modifier returns a modified copy, leaving the receiver
/// untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) kind: SchemaKind,
    pub(crate) description: Option<String>,
    pub(crate) example: Option<Value>,
    pub(crate) required: bool,
    pub(crate) deprecated: bool,
    pub(crate) explode: bool,
    pub(crate) examples: IndexMap<String, Example>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SchemaKind {
    String {
        min_length: Option<f64>,
        max_length: Option<f64>,
        pattern: Option<String>,
    },
    Boolean,
    Date {
        iso: bool,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        default: Option<f64>,
    },
    Enum {
        values: Vec<String>,
    },
    Object {
        fields: IndexMap<String, Schema>,
        additional_properties: Option<bool>,
    },
    Array {
        items: Option<Box<Schema>>,
    },
    Fixed {
        label: String,
        inner: Box<Schema>,
    },
    External {
        file: String,
        pointer: String,
    },
    OneOf {
        variants: Vec<Schema>,
    },
    AnyOf {
        variants: Vec<Schema>,
    },
}

/// A string node. Facets via [`Schema::min`], [`Schema::max`], [`Schema::pattern`].
#[must_use]
pub fn string() -> Schema {
    Schema::node(SchemaKind::String {
        min_length: None,
        max_length: None,
        pattern: None,
    })
}

/// A boolean node.
#[must_use]
pub fn boolean() -> Schema {
    Schema::node(SchemaKind::Boolean)
}

/// A date node, rendered as `{"type":"string","format":"date"}` or, after
/// [`Schema::iso`], with `format: "date-time"`.
#[must_use]
pub fn date() -> Schema {
    Schema::node(SchemaKind::Date { iso: false })
}

/// A number node. Facets via [`Schema::min`], [`Schema::max`], [`Schema::default`].
#[must_use]
pub fn number() -> Schema {
    Schema::node(SchemaKind::Number {
        minimum: None,
        maximum: None,
        default: None,
    })
}

/// A string node restricted to the given values, rendered as an `enum`.
#[must_use]
pub fn allow<I, S>(values: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Schema::node(SchemaKind::Enum {
        values: values.into_iter().map(Into::into).collect(),
    })
}

/// An object node with the given fields, in declaration order.
#[must_use]
pub fn object<I, K>(fields: I) -> Schema
where
    I: IntoIterator<Item = (K, Schema)>,
    K: Into<String>,
{
    Schema::node(SchemaKind::Object {
        fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        additional_properties: None,
    })
}

/// An array node. The item schema is attached with [`Schema::items`].
///
/// Array nodes default their explode flag to `true` so that array-typed query
/// parameters serialize one `name=value` pair per element.
#[must_use]
pub fn array() -> Schema {
    Schema::node(SchemaKind::Array { items: None })
}

/// A reference into an external JSON or YAML document.
///
/// `pointer` is a JSON pointer inside the file (a leading `#` is accepted and
/// stripped, a missing leading `/` is added). The file must be run through
/// external reference resolution before the node can render; the emitted
/// `$ref` points at the resolved scratch copy.
#[must_use]
pub fn reference(file: impl Into<String>, pointer: impl Into<String>) -> Schema {
    let pointer = pointer.into();
    let pointer = match pointer.strip_prefix('#') {
        Some(rest) => rest.to_owned(),
        None => pointer,
    };
    let pointer = if pointer.is_empty() || pointer.starts_with('/') {
        pointer
    } else {
        format!("/{pointer}")
    };
    Schema::node(SchemaKind::External {
        file: file.into(),
        pointer,
    })
}

/// A `oneOf` composition over the given variants.
#[must_use]
pub fn one_of(variants: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::node(SchemaKind::OneOf {
        variants: variants.into_iter().collect(),
    })
}

/// An `anyOf` composition over the given variants.
#[must_use]
pub fn any_of(variants: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::node(SchemaKind::AnyOf {
        variants: variants.into_iter().collect(),
    })
}

impl Schema {
    fn node(kind: SchemaKind) -> Self {
        let explode = matches!(kind, SchemaKind::Array { .. });
        Self {
            kind,
            description: None,
            example: None,
            required: false,
            deprecated: false,
            explode,
            examples: IndexMap::new(),
        }
    }

    /// Copy with the required flag set.
    ///
    /// The flag is consumed by the enclosing object's `required` list and by
    /// parameter projection; it never appears inside the node's own fragment.
    #[must_use]
    pub fn required(&self) -> Self {
        let mut next = self.clone();
        next.required = true;
        next
    }

    /// Copy with a description.
    #[must_use]
    pub fn description(&self, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.description = Some(text.into());
        next
    }

    /// Copy with a literal example value.
    #[must_use]
    pub fn example(&self, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.example = Some(value.into());
        next
    }

    /// Copy with named examples, replacing any previously attached set.
    #[must_use]
    pub fn examples<I, K>(&self, examples: I) -> Self
    where
        I: IntoIterator<Item = (K, Example)>,
        K: Into<String>,
    {
        let mut next = self.clone();
        next.examples = examples.into_iter().map(|(k, v)| (k.into(), v)).collect();
        next
    }

    /// Copy with the deprecated flag set.
    #[must_use]
    pub fn deprecated(&self) -> Self {
        let mut next = self.clone();
        next.deprecated = true;
        next
    }

    /// Wrap this node under a normalized component label.
    ///
    /// The label becomes the key under `components.schemas`; characters
    /// outside `[A-Za-z0-9._-]` are replaced with `_`. In referenced
    /// representation the wrapper renders as
    /// `{"$ref":"#/components/schemas/<label>"}`; in flat representation the
    /// wrapped schema is inlined.
    ///
    /// The wrapper starts with fresh shared attributes: flags set before
    /// labelling stay on the wrapped schema, so `required` must be applied
    /// after `label` for the enclosing object or parameter projection to see
    /// it.
    #[must_use]
    pub fn label(&self, label: impl Into<String>) -> Self {
        Self::node(SchemaKind::Fixed {
            label: normalize_label(&label.into()),
            inner: Box::new(self.clone()),
        })
    }

    /// Copy with a lower bound: `minLength` on strings, `minimum` on numbers.
    /// No effect on other kinds.
    #[must_use]
    pub fn min(&self, value: f64) -> Self {
        let mut next = self.clone();
        match &mut next.kind {
            SchemaKind::String { min_length, .. } => *min_length = Some(value),
            SchemaKind::Number { minimum, .. } => *minimum = Some(value),
            _ => {}
        }
        next
    }

    /// Copy with an upper bound: `maxLength` on strings, `maximum` on numbers.
    /// No effect on other kinds.
    #[must_use]
    pub fn max(&self, value: f64) -> Self {
        let mut next = self.clone();
        match &mut next.kind {
            SchemaKind::String { max_length, .. } => *max_length = Some(value),
            SchemaKind::Number { maximum, .. } => *maximum = Some(value),
            _ => {}
        }
        next
    }

    /// Copy with a regex pattern. String nodes only; no effect elsewhere.
    #[must_use]
    pub fn pattern(&self, pattern: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let SchemaKind::String { pattern: slot, .. } = &mut next.kind {
            *slot = Some(pattern.into());
        }
        next
    }

    /// Copy with the ISO 8601 flag set, switching the date format to
    /// `date-time`. Date nodes only; no effect elsewhere.
    #[must_use]
    pub fn iso(&self) -> Self {
        let mut next = self.clone();
        if let SchemaKind::Date { iso } = &mut next.kind {
            *iso = true;
        }
        next
    }

    /// Copy with a default value. Number nodes only; no effect elsewhere.
    #[must_use]
    pub fn default(&self, value: f64) -> Self {
        let mut next = self.clone();
        if let SchemaKind::Number { default, .. } = &mut next.kind {
            *default = Some(value);
        }
        next
    }

    /// Copy with an item schema. Array nodes only; no effect elsewhere.
    #[must_use]
    pub fn items(&self, items: Schema) -> Self {
        let mut next = self.clone();
        if let SchemaKind::Array { items: slot } = &mut next.kind {
            *slot = Some(Box::new(items));
        }
        next
    }

    /// Copy with `additionalProperties` pinned to the given value. Object
    /// nodes only; no effect elsewhere. Unset, the key is never emitted.
    #[must_use]
    pub fn additional_properties(&self, allowed: bool) -> Self {
        let mut next = self.clone();
        if let SchemaKind::Object {
            additional_properties,
            ..
        } = &mut next.kind
        {
            *additional_properties = Some(allowed);
        }
        next
    }

    /// Whether the required flag is set.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The external file this node references, for reference nodes.
    #[must_use]
    pub fn external_file(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::External { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Render the JSON-schema fragment for this node.
    ///
    /// # Errors
    ///
    /// Fails when an external reference node's file has not been registered
    /// in `ctx` by the resolver.
    pub fn to_schema(&self, ctx: &RenderContext) -> Result<Value> {
        let mut out = Map::new();
        match &self.kind {
            SchemaKind::String {
                min_length,
                max_length,
                pattern,
            } => {
                out.insert("type".into(), "string".into());
                if let Some(v) = min_length {
                    out.insert("minLength".into(), json_number(*v));
                }
                if let Some(v) = max_length {
                    out.insert("maxLength".into(), json_number(*v));
                }
                if let Some(p) = pattern {
                    out.insert("pattern".into(), p.clone().into());
                }
            }
            SchemaKind::Boolean => {
                out.insert("type".into(), "boolean".into());
            }
            SchemaKind::Date { iso } => {
                out.insert("type".into(), "string".into());
                let format = if *iso { "date-time" } else { "date" };
                out.insert("format".into(), format.into());
            }
            SchemaKind::Number {
                minimum,
                maximum,
                default,
            } => {
                out.insert("type".into(), "number".into());
                if let Some(v) = minimum {
                    out.insert("minimum".into(), json_number(*v));
                }
                if let Some(v) = maximum {
                    out.insert("maximum".into(), json_number(*v));
                }
                if let Some(v) = default {
                    out.insert("default".into(), json_number(*v));
                }
            }
            SchemaKind::Enum { values } => {
                out.insert("type".into(), "string".into());
                out.insert(
                    "enum".into(),
                    Value::Array(values.iter().map(|v| v.clone().into()).collect()),
                );
            }
            SchemaKind::Object {
                fields,
                additional_properties,
            } => {
                out.insert("type".into(), "object".into());
                if !fields.is_empty() {
                    let mut properties = Map::new();
                    for (name, field) in fields {
                        properties.insert(name.clone(), field.to_schema(ctx)?);
                    }
                    out.insert("properties".into(), Value::Object(properties));

                    // Immediate children only: nested objects manage their own lists.
                    let required: Vec<Value> = fields
                        .iter()
                        .filter(|(_, field)| field.required)
                        .map(|(name, _)| name.clone().into())
                        .collect();
                    if !required.is_empty() {
                        out.insert("required".into(), Value::Array(required));
                    }
                }
                if let Some(allowed) = additional_properties {
                    out.insert("additionalProperties".into(), (*allowed).into());
                }
            }
            SchemaKind::Array { items } => {
                out.insert("type".into(), "array".into());
                if let Some(items) = items {
                    out.insert("items".into(), items.to_schema(ctx)?);
                }
            }
            SchemaKind::Fixed { label, inner } => match ctx.representation() {
                Representation::Flat => return inner.to_schema(ctx),
                Representation::Referenced => {
                    out.insert("$ref".into(), format!("#/components/schemas/{label}").into());
                    return Ok(Value::Object(out));
                }
            },
            SchemaKind::External { file, pointer } => {
                let Some(path) = ctx.resolved(file) else {
                    return Err(SchemaError::UnresolvedExternal { file: file.clone() });
                };
                out.insert("$ref".into(), format!("{}#{pointer}", path.display()).into());
                return Ok(Value::Object(out));
            }
            SchemaKind::OneOf { variants } => {
                out.insert("oneOf".into(), render_variants(variants, ctx)?);
            }
            SchemaKind::AnyOf { variants } => {
                out.insert("anyOf".into(), render_variants(variants, ctx)?);
            }
        }

        if let Some(text) = &self.description {
            out.insert("description".into(), text.clone().into());
        }
        if let Some(value) = &self.example {
            out.insert("example".into(), value.clone());
        }
        if !self.examples.is_empty() {
            out.insert("examples".into(), Example::render_map(&self.examples));
        }
        if self.deprecated {
            out.insert("deprecated".into(), true.into());
        }
        Ok(Value::Object(out))
    }

    /// The `(label, body)` entry this node contributes to
    /// `components.schemas`, or `None` for unlabeled nodes.
    ///
    /// # Errors
    ///
    /// Fails when the wrapped schema contains an unresolved external
    /// reference.
    pub fn to_component(&self, ctx: &RenderContext) -> Result<Option<(String, Value)>> {
        match &self.kind {
            SchemaKind::Fixed { label, inner } => {
                Ok(Some((label.clone(), inner.to_schema(ctx)?)))
            }
            _ => Ok(None),
        }
    }

    /// Depth-first traversal over this node and every nested node, including
    /// schemas wrapped by labels and composition variants.
    pub fn visit<'a>(&'a self, visitor: &mut dyn FnMut(&'a Schema)) {
        visitor(self);
        match &self.kind {
            SchemaKind::Object { fields, .. } => {
                for field in fields.values() {
                    field.visit(visitor);
                }
            }
            SchemaKind::Array { items: Some(items) } => items.visit(visitor),
            SchemaKind::Fixed { inner, .. } => inner.visit(visitor),
            SchemaKind::OneOf { variants } | SchemaKind::AnyOf { variants } => {
                for variant in variants {
                    variant.visit(visitor);
                }
            }
            _ => {}
        }
    }
}

fn render_variants(variants: &[Schema], ctx: &RenderContext) -> Result<Value> {
    let mut rendered = Vec::with_capacity(variants.len());
    for variant in variants {
        rendered.push(variant.to_schema(ctx)?);
    }
    Ok(Value::Array(rendered))
}

/// JSON numbers write integral floats as integers, matching how the bounds
/// read when authored (`minimum: 0`, not `minimum: 0.0`).
#[allow(clippy::cast_possible_truncation)] // integral check precedes the cast
fn json_number(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
