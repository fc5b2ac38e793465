#![allow(clippy::doc_markdown)] // README uses "OpenAPI" proper noun throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! # Types
//!
//! - [`DocumentSpec`] — everything that goes into one build
//! - [`Route`] / [`DefinedRoute`] / [`ReferencedRoute`] — the route model
//! - [`RouteResponse`] — responses with bodies, headers, and examples
//! - [`Schema`] — schema nodes, built with [`string`], [`object`], ...
//! - [`Transformation`] — post-build document edits
//! - [`Representation`] — `Flat` or `Referenced` emission
//! - [`Output`] — stdout, file, or discard
//!
//! # Entry point
//!
//! - [`emit`] — run the whole pipeline and return the document text

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod collect;
mod document;
mod error;
mod normalize;
mod resolve;
mod route;
mod transform;

pub use document::{emit, Contact, DocumentSpec, Info, License, Output, Server, Tag};
pub use error::{Error, Result};
pub use route::{DefinedRoute, Method, ReferencedRoute, Route, RouteResponse, SecurityRequirement};
pub use transform::Transformation;

pub use oasmith_core::{
    allow, any_of, array, boolean, date, number, object, one_of, reference, string, Example,
    ParameterLocation, RenderContext, Representation, Schema, SchemaError,
};
