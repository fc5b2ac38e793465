//! Typed error enum for the `oasmith` library API.
//!
//! Library consumers can match on specific variants. Every failure is fatal
//! to the build in progress: no document text is produced and the scratch
//! directory is removed best-effort on the way out.

/// Errors produced by `oasmith` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (scratch files, output sink).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Schema construction or rendering failure from the DSL layer.
    #[error(transparent)]
    Schema(#[from] oasmith_core::SchemaError),

    /// The same component label was registered with two different bodies.
    ///
    /// Only raised for referenced documents, where the label becomes a
    /// `components.schemas` key that both definitions would fight over.
    /// Rename one side or reuse the same schema value.
    #[error(
        "component label '{label}' is registered with conflicting schema bodies; \
         rename one side or reuse the same schema value"
    )]
    DuplicateLabel {
        /// The contested component label, already normalized.
        label: String,
    },

    /// An external document could not be read.
    #[error("failed to read external document '{file}'")]
    ReadExternal {
        /// The file as named by the reference.
        file: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// An external document could not be parsed as JSON or YAML.
    #[error("failed to parse external document '{file}'")]
    ParseExternal {
        /// The file as named by the reference.
        file: String,
        /// The underlying parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A reference names a remote URL.
    ///
    /// Only local files are resolved. Download the document and reference
    /// the local copy instead.
    #[error("remote references are not supported; copy '{file}' locally and reference that")]
    RemoteReference {
        /// The offending URL.
        file: String,
    },

    /// A `$ref` points at a location that does not exist.
    #[error("unresolvable $ref '{reference}'")]
    UnresolvableRef {
        /// The reference as written in the document.
        reference: String,
    },

    /// Expanding a `$ref` ran back into itself.
    #[error("circular $ref chain through '{reference}'")]
    CircularRef {
        /// The reference that closed the cycle.
        reference: String,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    /// Required for crossing the resolver's worker-thread boundary.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };
}
