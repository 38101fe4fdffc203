//! Module resolution capability consumed by the import checks
//!
//! The checker only needs a yes/no oracle for "does this dotted path name a
//! real module"; hosts with their own import machinery implement
//! [`ModuleResolver`], and [`PathResolver`] covers the common
//! search-the-filesystem case.

use log::trace;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a dotted path failed to resolve
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The path does not name a loadable module or package
    #[error("unable to load module {module}")]
    Unresolvable { module: String },

    /// Resolution failed for reasons unrelated to the module itself
    #[error("IO error while resolving {module}: {source}")]
    Io {
        module: String,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// The one failure class the import rule converts into a diagnostic
    pub fn is_unresolvable(&self) -> bool {
        matches!(self, ResolveError::Unresolvable { .. })
    }
}

/// Capability to resolve a dotted module path
pub trait ModuleResolver {
    /// Attempt to resolve `dotted_path` (e.g. `os.path.join`) as a module
    /// or package
    fn resolve(&self, dotted_path: &str) -> Result<(), ResolveError>;
}

/// Resolves dotted paths against package directories on disk
///
/// `a.b.c` resolves when some root contains `a/b/c.py` or
/// `a/b/c/__init__.py`.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    roots: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }
}

impl ModuleResolver for PathResolver {
    fn resolve(&self, dotted_path: &str) -> Result<(), ResolveError> {
        let rel: PathBuf = dotted_path.split('.').collect();

        for root in &self.roots {
            let module_file = root.join(&rel).with_extension("py");
            let package_init = root.join(&rel).join("__init__.py");
            if probe(dotted_path, &module_file)? || probe(dotted_path, &package_init)? {
                trace!("resolved {} under {}", dotted_path, root.display());
                return Ok(());
            }
        }

        Err(ResolveError::Unresolvable {
            module: dotted_path.to_string(),
        })
    }
}

/// Missing files are a normal miss; any other IO failure is not
fn probe(module: &str, path: &Path) -> Result<bool, ResolveError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ResolveError::Io {
            module: module.to_string(),
            source,
        }),
    }
}
