use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub vars: VarsConfig,
}

/// Location of the managed Ansible project.
///
/// Everything else (ansible/, docs/, roles, vars) is derived from `root`
/// so the components stay testable against arbitrary directories.
#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    /// Root of the Ansible project tree. All file access is sandboxed
    /// to this directory. Supports ${ENV_VAR} substitution.
    #[serde(default = "default_project_root")]
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Executable name looked up on PATH when the project does not
    /// bundle its own.
    #[serde(default = "default_playbook_bin")]
    pub playbook_bin: String,
    /// Project-relative path of the bundled executable, preferred when
    /// it exists (a project venv).
    #[serde(default = "default_bundled_bin")]
    pub bundled_bin: PathBuf,
    /// Default process timeout for run_playbook, in seconds.
    #[serde(default = "default_run_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VarsConfig {
    /// Sample template, relative to the project root.
    #[serde(default = "default_sample_file")]
    pub sample_file: PathBuf,
    /// Render target, relative to the project root. Fully overwritten
    /// on every render.
    #[serde(default = "default_target_file")]
    pub target_file: PathBuf,
    /// Marker comment line after which override vars are inserted.
    #[serde(default = "default_anchor")]
    pub anchor: String,
    /// Keys whose values are always emitted double-quoted.
    #[serde(default = "default_quote_keys")]
    pub quote_keys: Vec<String>,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_playbook_bin() -> String {
    "ansible-playbook".to_string()
}

fn default_bundled_bin() -> PathBuf {
    PathBuf::from(".ansible/bin/ansible-playbook")
}

fn default_run_timeout() -> u64 {
    7200
}

fn default_sample_file() -> PathBuf {
    PathBuf::from("ansible/vars/all.sample.yml")
}

fn default_target_file() -> PathBuf {
    PathBuf::from("ansible/vars/all.yml")
}

fn default_anchor() -> String {
    "# Append override vars below".to_string()
}

fn default_quote_keys() -> Vec<String> {
    vec!["ocp_build".to_string(), "ocp_version".to_string()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_project_root(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            playbook_bin: default_playbook_bin(),
            bundled_bin: default_bundled_bin(),
            timeout_seconds: default_run_timeout(),
        }
    }
}

impl Default for VarsConfig {
    fn default() -> Self {
        Self {
            sample_file: default_sample_file(),
            target_file: default_target_file(),
            anchor: default_anchor(),
            quote_keys: default_quote_keys(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${ANSIBLE_PROJECT_ROOT}
        let expanded = shellexpand::env(&content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Loads the file when it exists, otherwise falls back to defaults
    /// (project root = current directory).
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}
