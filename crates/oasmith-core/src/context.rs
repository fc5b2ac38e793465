//! Render-time state threaded explicitly through fragment rendering.
//!
//! There is no process-global registry: everything a node needs to serialize
//! itself — the representation mode and the external-file resolution map —
//! travels in a [`RenderContext`] passed by reference, so concurrent builds
//! with different settings cannot observe each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How `$ref` pointers appear in the emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Every `$ref` is fully dereferenced; the output contains none.
    Flat,
    /// External `$ref`s are inlined, internal component `$ref`s are kept and
    /// named schemas live under `components.schemas`.
    Referenced,
}

/// State consulted while rendering schema fragments.
///
/// Created once per document build. The external reference resolver fills in
/// the file map before any fragment is rendered; rendering an external
/// reference whose file is absent from the map is a configuration error.
#[derive(Debug, Clone)]
pub struct RenderContext {
    representation: Representation,
    resolved: HashMap<String, PathBuf>,
}

impl RenderContext {
    /// Create a context for the given representation with no resolved files.
    #[must_use]
    pub fn new(representation: Representation) -> Self {
        Self {
            representation,
            resolved: HashMap::new(),
        }
    }

    /// The representation mode this context renders for.
    #[must_use]
    pub fn representation(&self) -> Representation {
        self.representation
    }

    /// Record that `source` has been resolved into the scratch copy at `target`.
    pub fn register_resolved(&mut self, source: impl Into<String>, target: impl Into<PathBuf>) {
        self.resolved.insert(source.into(), target.into());
    }

    /// Scratch-copy path for an external file, if resolution has run for it.
    #[must_use]
    pub fn resolved(&self, source: &str) -> Option<&Path> {
        self.resolved.get(source).map(PathBuf::as_path)
    }
}
