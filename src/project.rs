//! Layout of the managed Ansible project and the read-only operations on it.
//!
//! All paths are derived from the configured project root; nothing global.
//! Reads go through the [`PathSandbox`] so a relative path can never climb
//! out of the project tree, whatever `..` or symlink tricks it contains.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ToolError;
use crate::sandbox::PathSandbox;

/// A top-level playbook file under `ansible/`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlaybookInfo {
    pub name: String,
    pub path: String,
}

/// Derived directory layout plus the sandbox guarding it.
pub struct ProjectLayout {
    root: PathBuf,
    sandbox: PathSandbox,
}

impl ProjectLayout {
    /// Binds the layout to a project root. Fails when the root does not
    /// exist — a sandbox cannot be anchored to a missing directory.
    pub fn new(root: &Path) -> Result<Self, ToolError> {
        let sandbox = PathSandbox::new(root)?;
        Ok(Self {
            root: sandbox.base().to_path_buf(),
            sandbox,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    pub fn ansible_dir(&self) -> PathBuf {
        self.root.join("ansible")
    }

    pub fn roles_dir(&self) -> PathBuf {
        self.ansible_dir().join("roles")
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join("docs")
    }

    /// Top-level `*.yml` / `*.yaml` files under `ansible/`, sorted by name.
    /// Role internals live deeper and are deliberately not traversed.
    pub fn list_playbooks(&self) -> Result<Vec<PlaybookInfo>, ToolError> {
        let dir = self.ansible_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut playbooks: Vec<PlaybookInfo> = read_dir_sorted(&dir)?
            .into_iter()
            .filter(|p| p.is_file() && has_extension(p, &["yml", "yaml"]))
            .map(|p| PlaybookInfo {
                name: file_name_string(&p),
                path: p.display().to_string(),
            })
            .collect();
        playbooks.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("{} playbooks under {}", playbooks.len(), dir.display());
        Ok(playbooks)
    }

    /// Role directory names under `ansible/roles`, sorted.
    pub fn list_roles(&self) -> Result<Vec<String>, ToolError> {
        let dir = self.roles_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut roles: Vec<String> = read_dir_sorted(&dir)?
            .into_iter()
            .filter(|p| p.is_dir())
            .map(|p| file_name_string(&p))
            .collect();
        roles.sort();
        Ok(roles)
    }

    /// Markdown docs under `docs/`, recursive, sorted, skipping image
    /// directories.
    pub fn list_docs(&self) -> Result<Vec<String>, ToolError> {
        let dir = self.docs_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut docs: Vec<String> = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ToolError::Io {
                path: dir.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || !has_extension(entry.path(), &["md"]) {
                continue;
            }
            if entry.path().components().any(|c| c.as_os_str() == "img") {
                continue;
            }
            docs.push(entry.path().display().to_string());
        }
        docs.sort();
        Ok(docs)
    }

    /// Reads a UTF-8 text file by project-relative path, sandboxed to the
    /// project root.
    pub fn read_text_file(&self, relative_path: &str) -> Result<String, ToolError> {
        let path = self.sandbox.resolve_relative(relative_path)?;
        if !path.is_file() {
            return Err(ToolError::NotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(&path).map_err(|e| ToolError::Io {
            path: path.clone(),
            source: e,
        })?;
        String::from_utf8(bytes)
            .map_err(|_| ToolError::Encoding(path.display().to_string()))
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ToolError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ToolError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.contains(&e))
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a minimal project tree:
    /// root/ansible/{site.yml,deploy.yaml,README.md}
    /// root/ansible/roles/{common,network}/
    /// root/docs/{setup.md,img/diagram.md,deep/guide.md}
    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("ansible/roles/common")).unwrap();
        std::fs::create_dir_all(root.join("ansible/roles/network")).unwrap();
        std::fs::create_dir_all(root.join("docs/img")).unwrap();
        std::fs::create_dir_all(root.join("docs/deep")).unwrap();
        std::fs::write(root.join("ansible/site.yml"), "---\n").unwrap();
        std::fs::write(root.join("ansible/deploy.yaml"), "---\n").unwrap();
        std::fs::write(root.join("ansible/README.md"), "readme\n").unwrap();
        std::fs::write(root.join("docs/setup.md"), "# setup\n").unwrap();
        std::fs::write(root.join("docs/img/diagram.md"), "image dir\n").unwrap();
        std::fs::write(root.join("docs/deep/guide.md"), "# guide\n").unwrap();
        dir
    }

    #[test]
    fn test_list_playbooks_sorted_yaml_only() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let playbooks = layout.list_playbooks().unwrap();
        let names: Vec<&str> = playbooks.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["deploy.yaml", "site.yml"]);
        assert!(playbooks[0].path.ends_with("deploy.yaml"));
    }

    #[test]
    fn test_list_playbooks_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        assert!(layout.list_playbooks().unwrap().is_empty());
    }

    #[test]
    fn test_list_roles_sorted() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        assert_eq!(layout.list_roles().unwrap(), vec!["common", "network"]);
    }

    #[test]
    fn test_list_docs_recursive_excluding_img() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let docs = layout.list_docs().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].ends_with("deep/guide.md"));
        assert!(docs[1].ends_with("setup.md"));
        assert!(docs.iter().all(|d| !d.contains("/img/")));
    }

    #[test]
    fn test_read_text_file() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let text = layout.read_text_file("docs/setup.md").unwrap();
        assert_eq!(text, "# setup\n");
    }

    #[test]
    fn test_read_text_file_escape_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let base = outer.path().join("proj");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(outer.path().join("outside.txt"), "no").unwrap();

        let layout = ProjectLayout::new(&base).unwrap();
        let err = layout.read_text_file("../outside.txt").unwrap_err();
        assert!(matches!(err, ToolError::PathEscape { .. }));
    }

    #[test]
    fn test_read_text_file_missing() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let err = layout.read_text_file("docs/nope.md").unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_read_text_file_directory_is_not_found() {
        let dir = fixture();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let err = layout.read_text_file("docs").unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_read_binary_file_is_encoding_error() {
        let dir = fixture();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let layout = ProjectLayout::new(dir.path()).unwrap();
        let err = layout.read_text_file("blob.bin").unwrap_err();
        assert!(matches!(err, ToolError::Encoding(_)));
    }
}
