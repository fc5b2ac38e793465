//! Parameter and response-header projection.
//!
//! Request validation is authored as object schemas (one per location:
//! path, query, header). OpenAPI wants those as parameter lists, so the
//! object's fields are projected into one parameter object each, keeping
//! field order. Response header schemas flatten further still: interactive
//! tooling only renders a header's type and description, and every other
//! facet is discarded.

use serde_json::{Map, Value};

use crate::context::RenderContext;
use crate::error::{Result, SchemaError};
use crate::schema::{Schema, SchemaKind};

/// Where a projected parameter lives in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// A `{placeholder}` inside the URL template. Always required.
    Path,
    /// A query-string key.
    Query,
    /// A request header.
    Header,
}

impl ParameterLocation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

impl Schema {
    /// Project an object schema into a list of parameter objects, one per
    /// field in declaration order.
    ///
    /// Path parameters are forced `required: true` regardless of the field's
    /// flag. The per-field schema fragment has its top-level `example` and
    /// `examples` keys stripped so documentation tools do not auto-fill
    /// try-it-out values. A labeled field contributes its wrapped schema
    /// inline; parameters cannot reference named components.
    ///
    /// # Errors
    ///
    /// Fails on non-object receivers and on unresolved external references
    /// inside field schemas.
    pub fn as_parameter_list(
        &self,
        location: ParameterLocation,
        ctx: &RenderContext,
    ) -> Result<Vec<Value>> {
        let SchemaKind::Object { fields, .. } = &self.kind else {
            return Err(SchemaError::NotAnObject {
                projection: "parameters",
            });
        };

        let mut parameters = Vec::with_capacity(fields.len());
        for (name, field) in fields {
            let target = match &field.kind {
                SchemaKind::Fixed { inner, .. } => inner.as_ref(),
                _ => field,
            };
            let mut fragment = target.to_schema(ctx)?;
            if let Some(map) = fragment.as_object_mut() {
                map.remove("example");
                map.remove("examples");
            }

            let mut parameter = Map::new();
            parameter.insert("name".into(), name.clone().into());
            parameter.insert("in".into(), location.as_str().into());
            if let Some(text) = &field.description {
                parameter.insert("description".into(), text.clone().into());
            }
            parameter.insert("explode".into(), field.explode.into());
            let required = location == ParameterLocation::Path || field.required;
            parameter.insert("required".into(), required.into());
            parameter.insert("schema".into(), fragment);
            parameters.push(Value::Object(parameter));
        }
        Ok(parameters)
    }

    /// Project an object schema into a response `headers` map.
    ///
    /// Each field becomes `{"schema":{"type":...},"description"?}`. Patterns,
    /// bounds, enum values and examples are discarded; kinds without a scalar
    /// JSON type counterpart omit `type` entirely.
    ///
    /// # Errors
    ///
    /// Fails on non-object receivers.
    pub fn as_response_headers(&self) -> Result<Value> {
        let SchemaKind::Object { fields, .. } = &self.kind else {
            return Err(SchemaError::NotAnObject {
                projection: "response headers",
            });
        };

        let mut headers = Map::new();
        for (name, field) in fields {
            let mut schema = Map::new();
            if let Some(ty) = json_type(field) {
                schema.insert("type".into(), ty.into());
            }
            let mut entry = Map::new();
            entry.insert("schema".into(), Value::Object(schema));
            if let Some(text) = &field.description {
                entry.insert("description".into(), text.clone().into());
            }
            headers.insert(name.clone(), Value::Object(entry));
        }
        Ok(Value::Object(headers))
    }
}

fn json_type(schema: &Schema) -> Option<&'static str> {
    match &schema.kind {
        SchemaKind::String { .. } | SchemaKind::Date { .. } | SchemaKind::Enum { .. } => {
            Some("string")
        }
        SchemaKind::Number { .. } => Some("number"),
        SchemaKind::Boolean => Some("boolean"),
        SchemaKind::Object { .. } => Some("object"),
        SchemaKind::Array { .. } => Some("array"),
        SchemaKind::Fixed { inner, .. } => json_type(inner),
        SchemaKind::External { .. } | SchemaKind::OneOf { .. } | SchemaKind::AnyOf { .. } => None,
    }
}
