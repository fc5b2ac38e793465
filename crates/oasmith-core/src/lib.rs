//! Schema node DSL and fragment rendering for the `oasmith` OpenAPI builder.
//!
//! This crate provides the [`Schema`] value type — a closed tagged union of
//! JSON-schema-shaped node kinds — together with free-function builders
//! ([`string`], [`number`], [`object`], ...), copy-on-write modifiers,
//! fragment rendering ([`Schema::to_schema`]) in flat and referenced
//! representations, and the parameter / response-header projections used when
//! schemas describe request validation.
//!
//! The higher-level `oasmith` crate (routes, component collection, external
//! reference resolution, document assembly) depends on this crate and
//! re-exports the whole DSL. You should not need to depend on this crate
//! directly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod context;
mod error;
mod project;
mod schema;

pub use context::{RenderContext, Representation};
pub use error::{Result, SchemaError};
pub use project::ParameterLocation;
pub use schema::{
    allow, any_of, array, boolean, date, number, object, one_of, reference, string, Example, Schema,
};
