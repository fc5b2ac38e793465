//! External reference resolution.
//!
//! Before assembly, every external file mentioned by a reference node or a
//! referenced route is turned into a self-contained copy inside the build's
//! scratch directory: read, fully dereferenced against its own directory,
//! and written back out as pretty JSON under a fresh randomly-suffixed name.
//! Rendering then points `$ref`s at those copies, so the assembled document
//! never depends on the caller's working tree.
//!
//! Files are independent of each other, so resolution fans out one worker
//! thread per distinct file and joins them all before proceeding. The first
//! failure aborts the build.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use oasmith_core::RenderContext;

use crate::error::{Error, Result};
use crate::normalize;
use crate::route::Route;

/// The distinct external files the given routes mention, in stable order.
pub(crate) fn external_files(routes: &[Route]) -> BTreeSet<String> {
    let mut files = BTreeSet::new();
    for route in routes {
        match route {
            Route::Defined(route) => {
                for schema in route.component_schemas() {
                    schema.visit(&mut |node| {
                        if let Some(file) = node.external_file() {
                            files.insert(file.to_owned());
                        }
                    });
                }
            }
            Route::Referenced(route) => {
                files.insert(route.file.clone());
            }
        }
    }
    files
}

/// Resolve every file into `scratch` and record the mapping in `ctx`.
pub(crate) fn resolve_external(
    files: &BTreeSet<String>,
    scratch: &Path,
    ctx: &mut RenderContext,
) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }
    let outcomes: Vec<Result<(String, PathBuf)>> = std::thread::scope(|scope| {
        let workers: Vec<_> = files
            .iter()
            .map(|file| {
                scope.spawn(move || {
                    let target = resolve_one(file, scratch)?;
                    Ok((file.clone(), target))
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| match worker.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });
    for outcome in outcomes {
        let (source, target) = outcome?;
        ctx.register_resolved(source, target);
    }
    Ok(())
}

/// Produce a self-contained scratch copy of one external document.
fn resolve_one(source: &str, scratch: &Path) -> Result<PathBuf> {
    let document = normalize::load_document(source, Path::new(source))?;
    let resolved = normalize::resolve_document(&document, Path::new(source).parent())?;

    let stem = Path::new(source)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("document");
    let file = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(".json")
        .tempfile_in(scratch)?;
    serde_json::to_writer_pretty(file.as_file(), &resolved)?;
    let (_, path) = file.keep().map_err(|error| Error::Io(error.error))?;
    Ok(path)
}
