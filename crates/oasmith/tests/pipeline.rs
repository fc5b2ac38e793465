//! End-to-end tests for the full build pipeline.
//!
//! Each test assembles a [`DocumentSpec`], runs [`oasmith::emit`], and
//! verifies the parsed output document.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use oasmith::{
    allow, emit, number, object, reference, string, DefinedRoute, DocumentSpec, Error, Info,
    Method, Output, ReferencedRoute, Representation, Route, RouteResponse, SecurityRequirement,
    Server, Tag, Transformation,
};

/// Run the pipeline and parse the emitted text.
fn run(spec: &DocumentSpec, representation: Representation) -> Value {
    let text = emit(spec, representation).expect("emit should succeed");
    serde_json::from_str(&text).expect("output should parse")
}

fn spec_with_routes(routes: Vec<Route>) -> DocumentSpec {
    DocumentSpec {
        info: Info::new("Widget Service", "1.0.0"),
        routes,
        ..DocumentSpec::default()
    }
}

fn contains_ref(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("$ref") || map.values().any(contains_ref),
        Value::Array(items) => items.iter().any(contains_ref),
        _ => false,
    }
}

#[test]
fn defined_route_end_to_end() {
    let route = DefinedRoute::new(Method::Get, "/widgets/{id}", "getWidget")
        .description("Fetch one widget")
        .headers(object([("X-Tenant", string().required())]))
        .path_params(object([("id", string())]))
        .query(object([("expand", allow(["parts", "none"]))]))
        .success(RouteResponse::new(200, "The widget").schema(object([
            ("id", string().required()),
            ("age", number().min(0.0)),
        ])));
    let spec = spec_with_routes(vec![route.into()]);

    let doc = run(&spec, Representation::Flat);

    assert_eq!(doc["openapi"], json!("3.0.3"));
    assert_eq!(doc["info"]["title"], json!("Widget Service"));

    let op = &doc["paths"]["/widgets/{id}"]["get"];
    assert_eq!(op["operationId"], json!("getWidget"));
    assert_eq!(op["summary"], json!("Fetch one widget"));
    assert_eq!(op["tags"], json!(["widgets"]));

    // Header, then path, then query; the path parameter is forced required.
    let params: Vec<_> = op["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["name"].as_str().unwrap(),
                p["in"].as_str().unwrap(),
                p["required"].as_bool().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        params,
        vec![
            ("X-Tenant", "header", true),
            ("id", "path", true),
            ("expand", "query", false),
        ]
    );

    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"],
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "age": { "type": "number", "minimum": 0 }
            },
            "required": ["id"]
        })
    );
}

#[test]
fn route_order_drives_path_insertion() {
    let routes = vec![
        Route::from(DefinedRoute::new(Method::Get, "/unordered", "listUnordered")),
        Route::from(DefinedRoute::new(Method::Get, "/second", "listSecond").order(1)),
        Route::from(DefinedRoute::new(Method::Get, "/first", "listFirst").order(0)),
    ];
    let spec = spec_with_routes(routes);

    let doc = run(&spec, Representation::Flat);
    let paths: Vec<_> = doc["paths"].as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/first", "/second", "/unordered"]);

    assert_eq!(doc["paths"]["/first"]["get"]["x-order"], json!(0));
    assert_eq!(doc["paths"]["/second"]["get"]["x-order"], json!(1));
    assert!(doc["paths"]["/unordered"]["get"].get("x-order").is_none());
}

#[test]
fn methods_on_one_path_share_a_path_item() {
    let routes = vec![
        Route::from(DefinedRoute::new(Method::Get, "/widgets", "listWidgets")),
        Route::from(DefinedRoute::new(Method::Post, "/widgets", "createWidget")),
    ];
    let spec = spec_with_routes(routes);

    let doc = run(&spec, Representation::Flat);
    let item = doc["paths"]["/widgets"].as_object().unwrap();
    let methods: Vec<_> = item.keys().collect();
    assert_eq!(methods, vec!["get", "post"]);
}

#[test]
fn referenced_documents_keep_component_refs() {
    let widget = object([("id", string().required()), ("name", string())]).label("Widget");
    let route = DefinedRoute::new(Method::Get, "/widgets/{id}", "getWidget")
        .path_params(object([("id", string())]))
        .success(RouteResponse::new(200, "The widget").schema(widget));
    let spec = spec_with_routes(vec![route.into()]);

    let doc = run(&spec, Representation::Referenced);

    assert_eq!(
        doc["paths"]["/widgets/{id}"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"],
        json!({ "$ref": "#/components/schemas/Widget" })
    );
    assert_eq!(
        doc["components"]["schemas"]["Widget"],
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" }
            },
            "required": ["id"]
        })
    );
}

#[test]
fn flat_documents_contain_no_refs() {
    let part = object([("sku", string())]).label("Part");
    let widget = object([("part", part)]).label("Widget");
    let route = DefinedRoute::new(Method::Get, "/widgets", "listWidgets")
        .success(RouteResponse::new(200, "ok").schema(widget));
    let spec = spec_with_routes(vec![route.into()]);

    let doc = run(&spec, Representation::Flat);
    assert!(!contains_ref(&doc));
    assert_eq!(
        doc["paths"]["/widgets"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"]["properties"]["part"],
        json!({
            "type": "object",
            "properties": { "sku": { "type": "string" } }
        })
    );
}

#[test]
fn duplicate_labels_fail_only_referenced_builds() {
    let first = DefinedRoute::new(Method::Get, "/users", "listUsers")
        .success(RouteResponse::new(200, "ok").schema(object([("id", string())]).label("User")));
    let second = DefinedRoute::new(Method::Get, "/users/{id}", "getUser")
        .success(RouteResponse::new(200, "ok").schema(object([("name", string())]).label("User")));
    let spec = spec_with_routes(vec![first.into(), second.into()]);

    let err = emit(&spec, Representation::Referenced).unwrap_err();
    assert!(matches!(err, Error::DuplicateLabel { ref label } if label == "User"));

    emit(&spec, Representation::Flat).expect("flat builds tolerate label collisions");
}

#[test]
fn external_references_inline_self_contained_content() {
    let dir = tempfile::tempdir().unwrap();
    let widgets = dir.path().join("widgets.json");
    fs::write(
        &widgets,
        json!({
            "definitions": {
                "Widget": {
                    "type": "object",
                    "properties": { "sku": { "type": "string" } }
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let route = DefinedRoute::new(Method::Post, "/widgets", "createWidget")
        .body(reference(widgets.display().to_string(), "/definitions/Widget"))
        .success(RouteResponse::new(201, "Created"));
    let spec = spec_with_routes(vec![route.into()]);

    let doc = run(&spec, Representation::Flat);
    assert!(!contains_ref(&doc));
    assert_eq!(
        doc["paths"]["/widgets"]["post"]["requestBody"]["content"]["application/json"]["schema"],
        json!({
            "type": "object",
            "properties": { "sku": { "type": "string" } }
        })
    );
}

#[test]
fn referenced_routes_inline_their_operations() {
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("legacy.json");
    fs::write(
        &legacy,
        json!({
            "paths": {
                "/legacy": {
                    "get": {
                        "operationId": "legacyList",
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let route = ReferencedRoute::new(
        Method::Get,
        "/legacy",
        legacy.display().to_string(),
        "/paths/~1legacy/get",
    );
    let spec = spec_with_routes(vec![route.into()]);

    let doc = run(&spec, Representation::Flat);
    assert_eq!(
        doc["paths"]["/legacy"]["get"]["operationId"],
        json!("legacyList")
    );
}

#[test]
fn transformations_edit_the_final_document() {
    let routes = vec![
        Route::from(DefinedRoute::new(Method::Get, "/a", "getA").order(0)),
        Route::from(DefinedRoute::new(Method::Get, "/b", "getB").order(1)),
    ];
    let mut spec = spec_with_routes(routes);
    spec.transformations = vec![
        Transformation::new("$.paths.*.*", |value| {
            if let Some(map) = value.as_object_mut() {
                map.remove("x-order");
            }
        }),
        Transformation::new("$.info.title", |value| {
            *value = json!("Widget Service (internal)");
        }),
    ];

    let doc = run(&spec, Representation::Flat);
    assert!(doc["paths"]["/a"]["get"].get("x-order").is_none());
    assert!(doc["paths"]["/b"]["get"].get("x-order").is_none());
    assert_eq!(doc["info"]["title"], json!("Widget Service (internal)"));
}

#[test]
fn document_metadata_renders_tags_servers_and_security() {
    let route = DefinedRoute::new(Method::Get, "/widgets", "listWidgets")
        .security(SecurityRequirement::new("api_key").scopes(["read"]));
    let mut spec = spec_with_routes(vec![route.into()]);
    spec.tags = vec![Tag::new("widgets").description("Widget operations")];
    spec.servers = vec![Server::new("https://api.example.com").description("Production")];
    spec.security = vec![
        SecurityRequirement::new("api_key").scopes(["read"]),
        SecurityRequirement::new("api_key").scopes(["write"]),
    ];
    spec.security_schemes.insert(
        "api_key".to_owned(),
        json!({ "type": "apiKey", "name": "X-Api-Key", "in": "header" }),
    );

    let doc = run(&spec, Representation::Flat);
    assert_eq!(
        doc["tags"],
        json!([{ "name": "widgets", "description": "Widget operations" }])
    );
    assert_eq!(
        doc["servers"],
        json!([{ "url": "https://api.example.com", "description": "Production" }])
    );
    assert_eq!(doc["security"], json!([{ "api_key": ["read", "write"] }]));
    assert_eq!(
        doc["components"]["securitySchemes"]["api_key"],
        json!({ "type": "apiKey", "name": "X-Api-Key", "in": "header" })
    );
    assert_eq!(
        doc["paths"]["/widgets"]["get"]["security"],
        json!([{ "api_key": ["read"] }])
    );
}

#[test]
fn file_output_writes_the_returned_text() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("openapi.json");
    let mut spec = spec_with_routes(vec![Route::from(DefinedRoute::new(
        Method::Get,
        "/widgets",
        "listWidgets",
    ))]);
    spec.output = Output::File(target.clone());

    let text = emit(&spec, Representation::Flat).expect("emit should succeed");
    assert_eq!(fs::read_to_string(target).unwrap(), text);
}

#[test]
fn empty_sections_are_omitted() {
    let spec = spec_with_routes(vec![Route::from(DefinedRoute::new(
        Method::Get,
        "/widgets",
        "listWidgets",
    ))]);

    let doc = run(&spec, Representation::Flat);
    assert!(doc.get("tags").is_none());
    assert!(doc.get("servers").is_none());
    assert!(doc.get("security").is_none());
    assert!(doc.get("components").is_none());
    assert!(doc["paths"]["/widgets"]["get"].get("parameters").is_none());
}
