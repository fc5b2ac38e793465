//! Route descriptors and their path-item rendering.
//!
//! A route is either **defined** in-process (operation metadata plus
//! per-location validation schemas that project into parameters, request
//! body, and responses) or **referenced** out of an existing external
//! document, in which case the path item entry is a bare `$ref`.
//!
//! Rendering order inside an operation's parameter list is header, then
//! path, then query; reordering would change every emitted document.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use oasmith_core::{Example, ParameterLocation, RenderContext, Schema, SchemaError};

use crate::error::Result;

/// HTTP method of a route, serialized lowercase as OpenAPI wants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `get`
    Get,
    /// `post`
    Post,
    /// `put`
    Put,
    /// `patch`
    Patch,
    /// `delete`
    Delete,
    /// `options`
    Options,
    /// `head`
    Head,
    /// `trace`
    Trace,
}

impl Method {
    /// Lowercase method name used as the path item key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Trace => "trace",
        }
    }
}

/// A named security requirement with its scope list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRequirement {
    pub(crate) name: String,
    pub(crate) scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Requirement on the named security scheme, with no scopes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scopes: Vec::new(),
        }
    }

    /// Replace the scope list.
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut entry = Map::new();
        entry.insert(
            self.name.clone(),
            Value::Array(self.scopes.iter().map(|s| s.clone().into()).collect()),
        );
        Value::Object(entry)
    }
}

/// One response of a defined route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResponse {
    pub(crate) status: u16,
    pub(crate) description: String,
    pub(crate) schema: Option<Schema>,
    pub(crate) headers: Option<Schema>,
    pub(crate) examples: IndexMap<String, Example>,
}

impl RouteResponse {
    /// Response with a status code and description and no body.
    #[must_use]
    pub fn new(status: u16, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            schema: None,
            headers: None,
            examples: IndexMap::new(),
        }
    }

    /// Attach a body schema, emitted under `application/json` content.
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Attach a response-header object schema.
    ///
    /// Headers are projected down to type and description; they only appear
    /// when the response also has a body schema.
    #[must_use]
    pub fn headers(mut self, headers: Schema) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a named example to the response content.
    #[must_use]
    pub fn example(mut self, name: impl Into<String>, example: Example) -> Self {
        self.examples.insert(name.into(), example);
        self
    }

    fn render(&self, ctx: &RenderContext) -> Result<Value> {
        let mut out = Map::new();
        out.insert("description".into(), self.description.clone().into());
        if let Some(schema) = &self.schema {
            let mut media = Map::new();
            media.insert("schema".into(), schema.to_schema(ctx)?);
            if !self.examples.is_empty() {
                media.insert("examples".into(), Example::render_map(&self.examples));
            }
            let mut content = Map::new();
            content.insert("application/json".into(), Value::Object(media));
            out.insert("content".into(), Value::Object(content));
            if let Some(headers) = &self.headers {
                out.insert("headers".into(), headers.as_response_headers()?);
            }
        }
        Ok(Value::Object(out))
    }
}

/// A route whose operation is described in-process.
#[derive(Debug, Clone)]
pub struct DefinedRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) operation_id: String,
    pub(crate) description: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) deprecated: bool,
    pub(crate) tags: Vec<String>,
    pub(crate) path_params: Option<Schema>,
    pub(crate) query: Option<Schema>,
    pub(crate) headers: Option<Schema>,
    pub(crate) body: Option<Schema>,
    pub(crate) success: Option<RouteResponse>,
    pub(crate) errors: Vec<RouteResponse>,
    pub(crate) security: Vec<SecurityRequirement>,
    pub(crate) order: Option<u32>,
}

impl DefinedRoute {
    /// Route skeleton for a method, URL template, and operation id.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: operation_id.into(),
            description: None,
            notes: None,
            deprecated: false,
            tags: Vec::new(),
            path_params: None,
            query: None,
            headers: None,
            body: None,
            success: None,
            errors: Vec::new(),
            security: Vec::new(),
            order: None,
        }
    }

    /// Short description, emitted as the operation `summary`.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Longer notes, emitted as the operation `description`.
    #[must_use]
    pub fn notes(mut self, text: impl Into<String>) -> Self {
        self.notes = Some(text.into());
        self
    }

    /// Mark the operation deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Add an explicit tag. Without any, the first path segment is used.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Validation schema for `{placeholder}` path parameters (an object node).
    #[must_use]
    pub fn path_params(mut self, schema: Schema) -> Self {
        self.path_params = Some(schema);
        self
    }

    /// Validation schema for query parameters (an object node).
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Validation schema for request headers (an object node).
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Validation schema for the request body.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// The success response. Rendered first in `responses`.
    #[must_use]
    pub fn success(mut self, response: RouteResponse) -> Self {
        self.success = Some(response);
        self
    }

    /// Add an error response. Rendered after the success response, in
    /// declaration order.
    #[must_use]
    pub fn error(mut self, response: RouteResponse) -> Self {
        self.errors.push(response);
        self
    }

    /// Add a security requirement for this operation.
    #[must_use]
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    /// Sort key within the document. Routes without one sort last.
    #[must_use]
    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// Every schema that participates in component collection and external
    /// file discovery: the four validation schemas plus all response bodies.
    pub(crate) fn component_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.path_params
            .iter()
            .chain(self.query.iter())
            .chain(self.headers.iter())
            .chain(self.body.iter())
            .chain(self.success.iter().filter_map(|r| r.schema.as_ref()))
            .chain(self.errors.iter().filter_map(|r| r.schema.as_ref()))
    }

    fn render(&self, ctx: &RenderContext) -> Result<Value> {
        let mut op = Map::new();
        op.insert("operationId".into(), self.operation_id.clone().into());
        if let Some(text) = &self.description {
            op.insert("summary".into(), text.clone().into());
        }
        if let Some(text) = &self.notes {
            op.insert("description".into(), text.clone().into());
        }
        let tags = self.effective_tags();
        if !tags.is_empty() {
            op.insert(
                "tags".into(),
                Value::Array(tags.into_iter().map(Value::from).collect()),
            );
        }
        if self.deprecated {
            op.insert("deprecated".into(), true.into());
        }

        let mut parameters = Vec::new();
        if let Some(schema) = &self.headers {
            parameters.extend(schema.as_parameter_list(ParameterLocation::Header, ctx)?);
        }
        if let Some(schema) = &self.path_params {
            parameters.extend(schema.as_parameter_list(ParameterLocation::Path, ctx)?);
        }
        if let Some(schema) = &self.query {
            parameters.extend(schema.as_parameter_list(ParameterLocation::Query, ctx)?);
        }
        if !parameters.is_empty() {
            op.insert("parameters".into(), Value::Array(parameters));
        }

        if let Some(schema) = &self.body {
            let mut media = Map::new();
            media.insert("schema".into(), schema.to_schema(ctx)?);
            let mut content = Map::new();
            content.insert("application/json".into(), Value::Object(media));
            let mut body = Map::new();
            body.insert("content".into(), Value::Object(content));
            op.insert("requestBody".into(), Value::Object(body));
        }

        let mut responses = Map::new();
        if let Some(success) = &self.success {
            responses.insert(success.status.to_string(), success.render(ctx)?);
        }
        for error in &self.errors {
            responses.insert(error.status.to_string(), error.render(ctx)?);
        }
        op.insert("responses".into(), Value::Object(responses));

        if !self.security.is_empty() {
            op.insert(
                "security".into(),
                Value::Array(self.security.iter().map(SecurityRequirement::render).collect()),
            );
        }
        if let Some(order) = self.order {
            op.insert("x-order".into(), order.into());
        }
        Ok(Value::Object(op))
    }

    fn effective_tags(&self) -> Vec<String> {
        if !self.tags.is_empty() {
            return self.tags.clone();
        }
        self.path
            .split('/')
            .find(|segment| !segment.is_empty())
            .map(str::to_owned)
            .into_iter()
            .collect()
    }
}

/// A route pulled in by reference from an external document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) file: String,
    pub(crate) pointer: String,
    pub(crate) deprecated: bool,
    pub(crate) order: Option<u32>,
}

impl ReferencedRoute {
    /// Route whose operation lives at `pointer` inside `file`.
    ///
    /// The pointer is normalized the way [`oasmith_core::reference`] does it:
    /// a leading `#` is accepted and stripped, a missing leading `/` is added.
    #[must_use]
    pub fn new(
        method: Method,
        path: impl Into<String>,
        file: impl Into<String>,
        pointer: impl Into<String>,
    ) -> Self {
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
        Self {
            method,
            path: path.into(),
            file: file.into(),
            pointer,
            deprecated: false,
            order: None,
        }
    }

    /// Mark the operation deprecated alongside the `$ref`.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sort key within the document. Routes without one sort last.
    #[must_use]
    pub fn order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    fn render(&self, ctx: &RenderContext) -> Result<Value> {
        let Some(target) = ctx.resolved(&self.file) else {
            return Err(SchemaError::UnresolvedExternal {
                file: self.file.clone(),
            }
            .into());
        };
        let mut entry = Map::new();
        entry.insert(
            "$ref".into(),
            format!("{}#{}", target.display(), self.pointer).into(),
        );
        if self.deprecated {
            entry.insert("deprecated".into(), true.into());
        }
        Ok(Value::Object(entry))
    }
}

/// Either kind of route.
#[derive(Debug, Clone)]
pub enum Route {
    /// Operation described in-process.
    Defined(DefinedRoute),
    /// Operation referenced out of an external document.
    Referenced(ReferencedRoute),
}

impl From<DefinedRoute> for Route {
    fn from(route: DefinedRoute) -> Self {
        Self::Defined(route)
    }
}

impl From<ReferencedRoute> for Route {
    fn from(route: ReferencedRoute) -> Self {
        Self::Referenced(route)
    }
}

impl Route {
    pub(crate) fn method(&self) -> Method {
        match self {
            Self::Defined(route) => route.method,
            Self::Referenced(route) => route.method,
        }
    }

    pub(crate) fn path(&self) -> &str {
        match self {
            Self::Defined(route) => &route.path,
            Self::Referenced(route) => &route.path,
        }
    }

    pub(crate) fn order(&self) -> Option<u32> {
        match self {
            Self::Defined(route) => route.order,
            Self::Referenced(route) => route.order,
        }
    }

    /// The value stored under the lowercase method key of the path item.
    pub(crate) fn method_entry(&self, ctx: &RenderContext) -> Result<Value> {
        match self {
            Self::Defined(route) => route.render(ctx),
            Self::Referenced(route) => route.render(ctx),
        }
    }
}
