//! Filesystem sandbox — every file access is resolved through here.
//!
//! The security model is a single rule: a candidate path is usable iff its
//! canonical form (after following `..` and symlinks) is the sandbox base
//! itself or a descendant of it. Pure validation, no side effects.

use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Resolves candidate paths against a permitted base directory.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    base: PathBuf,
}

impl PathSandbox {
    /// Creates a sandbox rooted at `base`. The base is canonicalized once
    /// so later comparisons are against its real location.
    pub fn new(base: &Path) -> Result<Self, ToolError> {
        let base = base.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ToolError::NotFound(format!("sandbox base: {}", base.display()))
            }
            _ => ToolError::Io {
                path: base.to_path_buf(),
                source: e,
            },
        })?;
        Ok(Self { base })
    }

    /// The canonical base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Joins `relative` onto the base and validates the result.
    pub fn resolve_relative(&self, relative: &str) -> Result<PathBuf, ToolError> {
        self.resolve(&self.base.join(relative))
    }

    /// Canonicalizes `candidate` and succeeds iff it is the base or a
    /// descendant of it. Fails with `PathEscape` otherwise.
    ///
    /// A candidate that does not exist cannot be canonicalized and is
    /// reported as `NotFound` — the sandbox never vouches for paths it
    /// cannot fully resolve.
    pub fn resolve(&self, candidate: &Path) -> Result<PathBuf, ToolError> {
        let resolved = candidate.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ToolError::NotFound(candidate.display().to_string())
            }
            _ => ToolError::Io {
                path: candidate.to_path_buf(),
                source: e,
            },
        })?;

        // starts_with is component-wise, so the base itself also passes
        if resolved.starts_with(&self.base) {
            Ok(resolved)
        } else {
            Err(ToolError::PathEscape {
                candidate: resolved,
                base: self.base.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_file_inside_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/file.txt"), "hello").unwrap();

        let sandbox = PathSandbox::new(dir.path()).unwrap();
        let resolved = sandbox.resolve_relative("sub/file.txt").unwrap();
        assert!(resolved.starts_with(sandbox.base()));
        assert!(resolved.ends_with("sub/file.txt"));
    }

    #[test]
    fn test_resolve_base_itself() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = PathSandbox::new(dir.path()).unwrap();
        let resolved = sandbox.resolve(dir.path()).unwrap();
        assert_eq!(resolved, sandbox.base());
    }

    #[test]
    fn test_dotdot_escape_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let base = outer.path().join("proj");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "s3cret").unwrap();

        let sandbox = PathSandbox::new(&base).unwrap();
        let err = sandbox.resolve_relative("../secret.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    #[test]
    fn test_absolute_path_outside_base_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = PathSandbox::new(dir.path()).unwrap();
        let err = sandbox.resolve(Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = PathSandbox::new(dir.path()).unwrap();
        let err = sandbox.resolve_relative("nope.txt").unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let base = outer.path().join("proj");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(outer.path().join("target.txt"), "outside").unwrap();
        std::os::unix::fs::symlink(outer.path().join("target.txt"), base.join("link.txt"))
            .unwrap();

        let sandbox = PathSandbox::new(&base).unwrap();
        let err = sandbox.resolve_relative("link.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    #[test]
    fn test_missing_base_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PathSandbox::new(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
