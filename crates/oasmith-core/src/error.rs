//! Typed error enum for schema construction and rendering.
//!
//! Library consumers can match on specific variants. The `oasmith` pipeline
//! crate wraps these transparently in its own error enum.

/// Errors produced while rendering or projecting schema nodes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// An external reference was rendered before resolution ran.
    ///
    /// `$ref` fragments point at resolved scratch copies, so the referenced
    /// file must be registered in the [`RenderContext`](crate::RenderContext)
    /// first.
    #[error(
        "external document '{file}' has not been resolved; \
         run external reference resolution before rendering"
    )]
    UnresolvedExternal {
        /// The file named by the unresolved reference node.
        file: String,
    },

    /// A parameter or header projection was applied to a non-object node.
    ///
    /// Only object nodes have named fields to project from.
    #[error("cannot project {projection} from a non-object schema node")]
    NotAnObject {
        /// The projection that was attempted (`"parameters"` or `"response headers"`).
        projection: &'static str,
    },
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, SchemaError>;
