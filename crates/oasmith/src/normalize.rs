//! `$ref` normalization: dereferencing and bundling.
//!
//! The same expansion engine drives three call sites:
//!
//! - [`dereference`] — flat documents: every `$ref` (internal and external)
//!   is replaced by its target; none remain in the output.
//! - [`bundle`] — referenced documents: external `$ref`s are inlined,
//!   internal `#/...` references are preserved verbatim.
//! - [`resolve_document`] — the resolver's pre-pass: an external file is
//!   expanded against its own directory so the scratch copy is
//!   self-contained.
//!
//! Inside spliced external content every internal reference targets the
//! external document, not ours, so it is always fully expanded regardless of
//! mode. Unresolvable pointers and cycles are hard failures; `$ref` sibling
//! keys are dropped on expansion, per JSON Reference semantics.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Expand every `$ref` in `document`.
pub(crate) fn dereference(document: &Value) -> Result<Value> {
    let mut expander = Expander::new(false, None);
    expander.expand(document, document)
}

/// Expand external `$ref`s in `document`, preserving internal ones.
pub(crate) fn bundle(document: &Value) -> Result<Value> {
    let mut expander = Expander::new(true, None);
    expander.expand(document, document)
}

/// Fully expand an external document against its own directory.
pub(crate) fn resolve_document(document: &Value, base: Option<&Path>) -> Result<Value> {
    let mut expander = Expander::new(false, base.map(Path::to_path_buf));
    expander.expand(document, document)
}

/// Read and parse a JSON or YAML document. `display` is the name the caller
/// used for it, kept for error messages; remote URLs are rejected here.
pub(crate) fn load_document(display: &str, path: &Path) -> Result<Value> {
    if display.starts_with("http://") || display.starts_with("https://") {
        return Err(Error::RemoteReference {
            file: display.to_owned(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|error| Error::ReadExternal {
        file: display.to_owned(),
        source: error,
    })?;
    parse_document(display, path, &raw)
}

fn parse_document(display: &str, path: &Path, raw: &str) -> Result<Value> {
    let yaml = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if yaml {
        let value: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(raw).map_err(|error| Error::ParseExternal {
                file: display.to_owned(),
                source: Box::new(error),
            })?;
        serde_json::to_value(value).map_err(|error| Error::ParseExternal {
            file: display.to_owned(),
            source: Box::new(error),
        })
    } else {
        serde_json::from_str(raw).map_err(|error| Error::ParseExternal {
            file: display.to_owned(),
            source: Box::new(error),
        })
    }
}

/// One spelling per file: cycle keys and the file cache must agree however a
/// chain of relative references reaches it (`d/a.json` and `d/../d/a.json`
/// are the same file). Prefers the canonical path; when the file does not
/// exist, folds `.` and `..` segments lexically so read errors still carry a
/// readable path.
fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        let mut folded = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => match folded.components().next_back() {
                    Some(Component::Normal(_)) => {
                        folded.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => folded.push(Component::ParentDir),
                },
                other => folded.push(other),
            }
        }
        folded
    })
}

struct Expander {
    keep_internal: bool,
    base: Option<PathBuf>,
    files: HashMap<PathBuf, Rc<Value>>,
    stack: Vec<String>,
}

impl Expander {
    fn new(keep_internal: bool, base: Option<PathBuf>) -> Self {
        Self {
            keep_internal,
            base,
            files: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn expand(&mut self, node: &Value, root: &Value) -> Result<Value> {
        match node {
            Value::Object(map) => {
                if let Some(Value::String(target)) = map.get("$ref") {
                    let target = target.clone();
                    return self.expand_ref(&target, map, root);
                }
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.expand(value, root)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.expand(item, root)?);
                }
                Ok(Value::Array(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn expand_ref(
        &mut self,
        target: &str,
        original: &Map<String, Value>,
        root: &Value,
    ) -> Result<Value> {
        match target.split_once('#') {
            Some(("", pointer)) => {
                if self.keep_internal {
                    return Ok(Value::Object(original.clone()));
                }
                self.expand_internal(pointer, root, target)
            }
            Some((file, pointer)) => self.expand_external(file, pointer, target),
            None => self.expand_external(target, "", target),
        }
    }

    fn expand_internal(&mut self, pointer: &str, root: &Value, target: &str) -> Result<Value> {
        let key = format!("#{pointer}");
        if self.stack.contains(&key) {
            return Err(Error::CircularRef {
                reference: target.to_owned(),
            });
        }
        let Some(found) = root.pointer(pointer) else {
            return Err(Error::UnresolvableRef {
                reference: target.to_owned(),
            });
        };
        self.stack.push(key);
        let expanded = self.expand(found, root);
        self.stack.pop();
        expanded
    }

    fn expand_external(&mut self, file: &str, pointer: &str, target: &str) -> Result<Value> {
        let joined = match &self.base {
            Some(base) => base.join(file),
            None => PathBuf::from(file),
        };
        let path = normalize_path(&joined);
        let key = format!("{}#{pointer}", path.display());
        if self.stack.contains(&key) {
            return Err(Error::CircularRef {
                reference: target.to_owned(),
            });
        }
        let document = self.load(file, &path)?;
        let Some(found) = document.pointer(pointer) else {
            return Err(Error::UnresolvableRef {
                reference: target.to_owned(),
            });
        };

        // The spliced content's own refs resolve against its document and
        // directory, and are always fully expanded.
        self.stack.push(key);
        let saved_base = self.base.clone();
        let saved_keep = self.keep_internal;
        self.base = path.parent().map(Path::to_path_buf);
        self.keep_internal = false;
        let expanded = self.expand(found, &document);
        self.base = saved_base;
        self.keep_internal = saved_keep;
        self.stack.pop();
        expanded
    }

    fn load(&mut self, display: &str, path: &Path) -> Result<Rc<Value>> {
        if let Some(cached) = self.files.get(path) {
            return Ok(Rc::clone(cached));
        }
        let document = Rc::new(load_document(display, path)?);
        self.files.insert(path.to_path_buf(), Rc::clone(&document));
        Ok(document)
    }
}
