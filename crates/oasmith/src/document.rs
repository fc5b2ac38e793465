//! Document input types, assembly, and emission.
//!
//! [`emit`] is the whole pipeline in order:
//!
//! 1. create the scratch directory (removed best-effort when the build ends)
//! 2. discover and resolve external files into self-contained scratch copies
//! 3. sort routes by their order key (stable; missing keys sort last)
//! 4. collect `components.schemas` (duplicate labels fail referenced builds)
//! 5. assemble the top-level document and the path-item map
//! 6. normalize `$ref`s: dereference (flat) or bundle (referenced)
//! 7. apply caller transformations in declaration order
//! 8. pretty-print, perform the output side effect, return the text
//!
//! Any error means no document was produced: the sink is only touched after
//! the full pipeline has succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use oasmith_core::{RenderContext, Representation};

use crate::error::Result;
use crate::route::{Route, SecurityRequirement};
use crate::transform::Transformation;
use crate::{collect, normalize, resolve, transform};

/// Routes without an explicit order sort after every explicitly ordered one.
const UNSET_ORDER: u32 = 10_000;

/// The `info` block of the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version string (not the OpenAPI version).
    pub version: String,
    /// Optional prose description.
    pub description: Option<String>,
    /// Optional contact block.
    pub contact: Option<Contact>,
    /// Optional license block.
    pub license: Option<License>,
}

impl Info {
    /// Info block with a title and version.
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            contact: None,
            license: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Contact details inside `info`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    /// Contact name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact URL.
    pub url: Option<String>,
}

/// License details inside `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    /// License name, e.g. `MIT`.
    pub name: String,
    /// Optional link to the license text.
    pub url: Option<String>,
}

impl License {
    /// License block with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

/// One entry of the `servers` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Optional prose description.
    pub description: Option<String>,
}

impl Server {
    /// Server entry with a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// One entry of the top-level `tags` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name, matched by operations' tag lists.
    pub name: String,
    /// Optional prose description.
    pub description: Option<String>,
}

impl Tag {
    /// Tag entry with a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Where the emitted document text goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    /// Print to standard output.
    Stdout,
    /// Write to the named file.
    File(PathBuf),
    /// Discard; the text is still returned to the caller.
    #[default]
    None,
}

/// Everything that goes into one document build.
///
/// Plain data with public fields; construct with struct update syntax around
/// [`DocumentSpec::default`]. The representation mode is not part of the
/// spec; the same spec can be emitted both ways.
#[derive(Debug)]
pub struct DocumentSpec {
    /// OpenAPI version tag for the `openapi` key. Defaults to `3.0.3`.
    pub openapi: String,
    /// The `info` block.
    pub info: Info,
    /// The `servers` list. Omitted from the document when empty.
    pub servers: Vec<Server>,
    /// The top-level `tags` list. Omitted from the document when empty.
    pub tags: Vec<Tag>,
    /// The routes, in declaration order.
    pub routes: Vec<Route>,
    /// Document-level security requirements, merged by scheme name.
    pub security: Vec<SecurityRequirement>,
    /// Security scheme definitions for `components.securitySchemes`,
    /// passed through as-is.
    pub security_schemes: IndexMap<String, Value>,
    /// Post-build document edits, applied in order.
    pub transformations: Vec<Transformation>,
    /// Output sink for the emitted text.
    pub output: Output,
}

impl Default for DocumentSpec {
    fn default() -> Self {
        Self {
            openapi: "3.0.3".to_owned(),
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            routes: Vec::new(),
            security: Vec::new(),
            security_schemes: IndexMap::new(),
            transformations: Vec::new(),
            output: Output::None,
        }
    }
}

impl DocumentSpec {
    /// Spec skeleton with the default OpenAPI version tag.
    #[must_use]
    pub fn new(info: Info) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }
}

/// Build the document and emit it through the spec's output sink.
///
/// Returns the pretty-printed JSON text in every output mode.
///
/// # Errors
///
/// Fails on duplicate component labels (referenced mode), unresolved or
/// unresolvable references, unreadable external documents, and sink I/O
/// failures. No document text is produced on failure.
pub fn emit(spec: &DocumentSpec, representation: Representation) -> Result<String> {
    let scratch = tempfile::Builder::new().prefix("oasmith-").tempdir()?;
    let text = build_document(spec, representation, scratch.path())?;
    match &spec.output {
        Output::Stdout => println!("{text}"),
        Output::File(path) => fs::write(path, &text)?,
        Output::None => {}
    }
    Ok(text)
}

fn build_document(
    spec: &DocumentSpec,
    representation: Representation,
    scratch: &Path,
) -> Result<String> {
    let mut ctx = RenderContext::new(representation);
    let files = resolve::external_files(&spec.routes);
    resolve::resolve_external(&files, scratch, &mut ctx)?;

    let routes = sorted_routes(&spec.routes);
    let components = collect::collect_components(routes.iter().copied(), &ctx)?;

    let mut paths = Map::new();
    for route in &routes {
        let entry = route.method_entry(&ctx)?;
        let item = paths
            .entry(route.path().to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(item) = item.as_object_mut() {
            item.insert(route.method().as_str().to_owned(), entry);
        }
    }

    let mut document = Map::new();
    document.insert("openapi".into(), spec.openapi.clone().into());
    document.insert("info".into(), render_info(&spec.info));
    if !spec.tags.is_empty() {
        document.insert(
            "tags".into(),
            Value::Array(spec.tags.iter().map(render_tag).collect()),
        );
    }
    if !spec.servers.is_empty() {
        document.insert(
            "servers".into(),
            Value::Array(spec.servers.iter().map(render_server).collect()),
        );
    }
    if !spec.security.is_empty() {
        document.insert("security".into(), union_security(&spec.security));
    }
    document.insert("paths".into(), Value::Object(paths));

    let mut component_block = Map::new();
    if !components.is_empty() {
        component_block.insert("schemas".into(), Value::Object(components));
    }
    if !spec.security_schemes.is_empty() {
        let mut schemes = Map::new();
        for (name, definition) in &spec.security_schemes {
            schemes.insert(name.clone(), definition.clone());
        }
        component_block.insert("securitySchemes".into(), Value::Object(schemes));
    }
    if !component_block.is_empty() {
        document.insert("components".into(), Value::Object(component_block));
    }

    let document = Value::Object(document);
    let mut document = match representation {
        Representation::Flat => normalize::dereference(&document)?,
        Representation::Referenced => normalize::bundle(&document)?,
    };
    transform::apply_all(&spec.transformations, &mut document);
    Ok(serde_json::to_string_pretty(&document)?)
}

fn sorted_routes(routes: &[Route]) -> Vec<&Route> {
    let mut sorted: Vec<&Route> = routes.iter().collect();
    sorted.sort_by_key(|route| route.order().unwrap_or(UNSET_ORDER));
    sorted
}

fn render_info(info: &Info) -> Value {
    let mut out = Map::new();
    out.insert("title".into(), info.title.clone().into());
    out.insert("version".into(), info.version.clone().into());
    if let Some(text) = &info.description {
        out.insert("description".into(), text.clone().into());
    }
    if let Some(contact) = &info.contact {
        let mut block = Map::new();
        if let Some(name) = &contact.name {
            block.insert("name".into(), name.clone().into());
        }
        if let Some(email) = &contact.email {
            block.insert("email".into(), email.clone().into());
        }
        if let Some(url) = &contact.url {
            block.insert("url".into(), url.clone().into());
        }
        out.insert("contact".into(), Value::Object(block));
    }
    if let Some(license) = &info.license {
        let mut block = Map::new();
        block.insert("name".into(), license.name.clone().into());
        if let Some(url) = &license.url {
            block.insert("url".into(), url.clone().into());
        }
        out.insert("license".into(), Value::Object(block));
    }
    Value::Object(out)
}

fn render_tag(tag: &Tag) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), tag.name.clone().into());
    if let Some(text) = &tag.description {
        out.insert("description".into(), text.clone().into());
    }
    Value::Object(out)
}

fn render_server(server: &Server) -> Value {
    let mut out = Map::new();
    out.insert("url".into(), server.url.clone().into());
    if let Some(text) = &server.description {
        out.insert("description".into(), text.clone().into());
    }
    Value::Object(out)
}

/// Union reducer: requirements merge by scheme name, scope lists union in
/// first-seen order.
fn union_security(requirements: &[SecurityRequirement]) -> Value {
    let mut merged: IndexMap<&str, Vec<String>> = IndexMap::new();
    for requirement in requirements {
        let scopes = merged.entry(requirement.name.as_str()).or_default();
        for scope in &requirement.scopes {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
    }
    Value::Array(
        merged
            .into_iter()
            .map(|(name, scopes)| {
                let mut entry = Map::new();
                entry.insert(
                    name.to_owned(),
                    Value::Array(scopes.into_iter().map(Value::from).collect()),
                );
                Value::Object(entry)
            })
            .collect(),
    )
}
