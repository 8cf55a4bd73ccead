//! Path confinement for every sandboxed operation.
//!
//! A [`WorkingDirectory`] is the canonical sandbox root. [`WorkingDirectory::resolve`]
//! turns an untrusted, caller-relative path into an absolute path and rejects
//! anything that does not stay at or below the root.
//!
//! Containment is decided per path component (`Path::starts_with`), never by
//! string prefix, so a root of `/sandbox` does not admit `/sandbox-evil`.
//! The candidate must pass both lexically (after folding `.` and `..`) and
//! after symlink resolution. Paths that do not exist yet are resolved through
//! their deepest existing ancestor, which is what lets writes create new files
//! without opening a hole through symlinked parents.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("path escapes the working directory: {}", .0.display())]
    Escape(PathBuf),

    #[error("failed to resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a sandbox root could not be established.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("failed to resolve working directory {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("working directory {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Canonical sandbox root for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    root: PathBuf,
}

impl WorkingDirectory {
    /// Canonicalizes `path` and checks that it names an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, RootError> {
        let path = path.as_ref();
        let root = path.canonicalize().map_err(|source| RootError::Resolve {
            path: path.to_path_buf(),
            source,
        })?;

        if !root.is_dir() {
            return Err(RootError::NotADirectory(root));
        }

        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves `requested` against the root. Empty input means the root itself.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, GuardError> {
        let requested = if requested.trim().is_empty() {
            "."
        } else {
            requested
        };

        // An absolute `requested` replaces the root here; the checks below
        // reject it unless it happens to point inside the sandbox.
        let lexical = normalize_lexically(&self.root.join(requested));
        if !self.contains(&lexical) {
            return Err(GuardError::Escape(lexical));
        }

        let resolved = canonicalize_with_missing_tail(&lexical)?;
        if !self.contains(&resolved) {
            return Err(GuardError::Escape(resolved));
        }

        Ok(resolved)
    }

    /// Segment-aware containment: equal to the root or nested under it.
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.root)
    }

    /// Renders `path` relative to the root for messages shown to the model.
    pub fn display_relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
            Ok(relative) => relative.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}

/// Folds `.` and `..` without touching the filesystem. `..` at the filesystem
/// root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    normalized
}

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// missing components. An entry that exists but cannot be canonicalized
/// (a dangling symlink, for one) is an error rather than a missing tail.
fn canonicalize_with_missing_tail(path: &Path) -> Result<PathBuf, GuardError> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut current = path;

    loop {
        match current.canonicalize() {
            Ok(mut base) => {
                for segment in missing.iter().rev() {
                    base.push(segment);
                }
                return Ok(base);
            }
            Err(source) => {
                let exists = fs::symlink_metadata(current).is_ok();
                let next = current.parent().zip(current.file_name());
                match (exists, next) {
                    (false, Some((parent, name))) => {
                        missing.push(name.to_os_string());
                        current = parent;
                    }
                    _ => {
                        return Err(GuardError::Resolve {
                            path: current.to_path_buf(),
                            source,
                        });
                    }
                }
            }
        }
    }
}
