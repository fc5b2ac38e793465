//! Component collection for `components.schemas`.
//!
//! Walks every defined route's validation schemas and response bodies,
//! descending through object fields, array items, wrapped label nodes, and
//! composition variants, and registers each labeled node under its
//! normalized label. Identical re-registrations merge silently and keep
//! their first position. For referenced documents a label that maps to two
//! different bodies fails the build before assembly; flat documents keep
//! last-write-wins, since no `$ref` will name the entry.

use serde_json::{Map, Value};

use oasmith_core::{RenderContext, Representation, Schema};

use crate::error::{Error, Result};
use crate::route::Route;

/// Collect the `components.schemas` map for the given routes, in discovery
/// order.
pub(crate) fn collect_components<'a>(
    routes: impl IntoIterator<Item = &'a Route>,
    ctx: &RenderContext,
) -> Result<Map<String, Value>> {
    let mut components = Map::new();
    for route in routes {
        let Route::Defined(route) = route else {
            continue;
        };
        for schema in route.component_schemas() {
            register(schema, ctx, &mut components)?;
        }
    }
    Ok(components)
}

fn register(
    schema: &Schema,
    ctx: &RenderContext,
    components: &mut Map<String, Value>,
) -> Result<()> {
    let mut failure: Option<Error> = None;
    schema.visit(&mut |node| {
        if failure.is_some() {
            return;
        }
        match node.to_component(ctx) {
            Ok(Some((label, body))) => match components.get(&label) {
                Some(existing) if *existing == body => {}
                Some(_) if ctx.representation() == Representation::Referenced => {
                    failure = Some(Error::DuplicateLabel { label });
                }
                Some(_) | None => {
                    components.insert(label, body);
                }
            },
            Ok(None) => {}
            Err(error) => failure = Some(error.into()),
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use oasmith_core::{array, number, object, one_of, string};

    use crate::route::{DefinedRoute, Method, RouteResponse};

    use super::*;

    fn referenced() -> RenderContext {
        RenderContext::new(Representation::Referenced)
    }

    fn flat() -> RenderContext {
        RenderContext::new(Representation::Flat)
    }

    fn route_with_body(body: Schema) -> Route {
        Route::from(DefinedRoute::new(Method::Post, "/widgets", "createWidget").body(body))
    }

    #[test]
    fn nested_labels_are_all_collected() {
        let part = object([("sku", string())]).label("Part");
        let widget = object([
            ("name", string()),
            ("parts", array().items(part)),
        ])
        .label("Widget");
        let routes = vec![route_with_body(widget)];

        let components = collect_components(&routes, &referenced()).unwrap();
        let keys: Vec<_> = components.keys().collect();
        assert_eq!(keys, vec!["Widget", "Part"]);
        assert_eq!(
            components["Widget"]["properties"]["parts"]["items"],
            json!({ "$ref": "#/components/schemas/Part" })
        );
    }

    #[test]
    fn labels_inside_composition_variants_are_collected() {
        let body = one_of([
            object([("a", string())]).label("VariantA"),
            object([("b", number())]).label("VariantB"),
        ]);
        let routes = vec![route_with_body(body)];

        let components = collect_components(&routes, &referenced()).unwrap();
        assert!(components.contains_key("VariantA"));
        assert!(components.contains_key("VariantB"));
    }

    #[test]
    fn response_schemas_participate() {
        let route = DefinedRoute::new(Method::Get, "/widgets", "listWidgets")
            .success(
                RouteResponse::new(200, "ok")
                    .schema(array().items(object([("id", string())]).label("Widget"))),
            )
            .error(
                RouteResponse::new(404, "missing")
                    .schema(object([("message", string())]).label("Problem")),
            );
        let routes = vec![Route::from(route)];

        let components = collect_components(&routes, &referenced()).unwrap();
        let keys: Vec<_> = components.keys().collect();
        assert_eq!(keys, vec!["Widget", "Problem"]);
    }

    #[test]
    fn identical_bodies_merge_silently() {
        let user = object([("id", string())]).label("User");
        let routes = vec![
            route_with_body(user.clone()),
            route_with_body(user),
        ];

        let components = collect_components(&routes, &referenced()).unwrap();
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn conflicting_bodies_fail_only_when_referenced() {
        let first = object([("id", string())]).label("User");
        let second = object([("name", string())]).label("User");
        let routes = vec![route_with_body(first), route_with_body(second)];

        let err = collect_components(&routes, &referenced()).unwrap_err();
        assert!(matches!(err, Error::DuplicateLabel { ref label } if label == "User"));

        // Flat documents never reference the entry: last write wins.
        let components = collect_components(&routes, &flat()).unwrap();
        assert_eq!(
            components["User"],
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } }
            })
        );
    }
}
