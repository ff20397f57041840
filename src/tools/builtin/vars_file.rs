//! The create_vars_file tool — renders the cluster vars file from the
//! sample template.
//!
//! The sample is read fresh on every call, edited in memory through the
//! template engine, and the target is written once with the full rendered
//! text. Nothing is written when any step fails.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::ToolError;
use crate::tools::{opt_bool, opt_str, opt_u64, require_str, Tool, ToolContext};
use crate::vars::KeyRule;

/// Cluster flavors the project can deploy.
const CLUSTER_TYPES: [&str; 3] = ["sno", "mno", "vmno"];

/// Creates or overwrites the cluster vars file by copying the sample and
/// editing keys in place, preserving all comments and spacing.
pub struct CreateVarsFileTool;

#[async_trait]
impl Tool for CreateVarsFileTool {
    fn name(&self) -> &str {
        "create_vars_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite the cluster vars file (ansible/vars/all.yml) by \
         copying the sample and replacing only the specified keys in place, \
         preserving all comments and spacing. Extra vars are appended under \
         the override section."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "lab": {
                    "type": "string",
                    "description": "Lab name hosting the cluster"
                },
                "lab_cloud": {
                    "type": "string",
                    "description": "Cloud allocation within the lab"
                },
                "cluster_type": {
                    "type": "string",
                    "enum": CLUSTER_TYPES,
                    "description": "Deployment flavor: single-node (sno), multi-node (mno), \
                                    or virtual multi-node (vmno)"
                },
                "ocp_build": {
                    "type": "string",
                    "description": "OpenShift build stream, e.g. 'ga' or 'dev'"
                },
                "ocp_version": {
                    "type": "string",
                    "description": "OpenShift version, e.g. '4.19.10' or 'latest-4.19'"
                },
                "public_vlan": {
                    "type": "boolean",
                    "default": false
                },
                "sno_use_lab_dhcp": {
                    "type": "boolean",
                    "default": false
                },
                "ssh_private_key_file": {
                    "type": "string",
                    "description": "Defaults to ~/.ssh/id_rsa"
                },
                "ssh_public_key_file": {
                    "type": "string",
                    "description": "Defaults to ~/.ssh/id_rsa.pub"
                },
                "sno_install_disk": {
                    "type": "string",
                    "description": "Install disk for sno clusters (e.g. /dev/nvme0n1)"
                },
                "control_plane_install_disk": {
                    "type": "string",
                    "description": "Install disk for control-plane nodes (non-sno)"
                },
                "worker_install_disk": {
                    "type": "string",
                    "description": "Install disk for worker nodes (non-sno)"
                },
                "pull_secret_lookup": {
                    "type": "string",
                    "description": "Path handed to the pull-secret file lookup \
                                    (default ../pull_secret.txt)"
                },
                "worker_node_count": {
                    "type": "integer",
                    "description": "Optional worker node count"
                },
                "extra_vars_json": {
                    "type": "string",
                    "description": "JSON object of override vars appended under the \
                                    override section"
                }
            },
            "required": ["lab", "lab_cloud", "cluster_type", "ocp_build", "ocp_version"]
        })
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value, ToolError> {
        let cluster_type = require_str(&params, "cluster_type")?;
        if !CLUSTER_TYPES.contains(&cluster_type) {
            return Err(ToolError::Validation(format!(
                "cluster_type must be one of {CLUSTER_TYPES:?}, got '{cluster_type}'"
            )));
        }

        let rules = build_rules(&params, cluster_type)?;
        let overrides = parse_overrides(&params)?;

        let sample_path = context.layout.root().join(&context.vars.sample_file);
        if !sample_path.is_file() {
            return Err(ToolError::NotFound(format!(
                "sample vars file: {}",
                sample_path.display()
            )));
        }
        let sample_bytes = std::fs::read(&sample_path).map_err(|e| ToolError::Io {
            path: sample_path.clone(),
            source: e,
        })?;
        let sample = String::from_utf8(sample_bytes)
            .map_err(|_| ToolError::Encoding(sample_path.display().to_string()))?;

        let (rendered, report) = context.engine.render(&sample, &rules, &overrides);

        // Write once, after the full render succeeded
        let target_path = context.layout.root().join(&context.vars.target_file);
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ToolError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&target_path, &rendered).map_err(|e| ToolError::Io {
            path: target_path.clone(),
            source: e,
        })?;

        info!(
            "Rendered {} ({} keys touched)",
            target_path.display(),
            report.len()
        );

        Ok(json!({
            "written": target_path.display().to_string(),
            "updated": report.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }))
    }
}

/// Assembles the ordered replacement rules from the call parameters.
fn build_rules(params: &Value, cluster_type: &str) -> Result<Vec<KeyRule>, ToolError> {
    let pull_secret_lookup = opt_str(params, "pull_secret_lookup")?
        .unwrap_or_else(|| "../pull_secret.txt".to_string());

    let mut rules = vec![
        KeyRule::new("lab", json!(require_str(params, "lab")?)),
        KeyRule::new("lab_cloud", json!(require_str(params, "lab_cloud")?)),
        KeyRule::new("cluster_type", json!(cluster_type)),
        KeyRule::new("public_vlan", json!(opt_bool(params, "public_vlan", false)?)),
        KeyRule::new(
            "sno_use_lab_dhcp",
            json!(opt_bool(params, "sno_use_lab_dhcp", false)?),
        ),
        KeyRule::new("ocp_build", json!(require_str(params, "ocp_build")?)),
        KeyRule::new("ocp_version", json!(require_str(params, "ocp_version")?)),
        KeyRule::new(
            "ssh_private_key_file",
            json!(opt_str(params, "ssh_private_key_file")?
                .unwrap_or_else(|| "~/.ssh/id_rsa".to_string())),
        ),
        KeyRule::new(
            "ssh_public_key_file",
            json!(opt_str(params, "ssh_public_key_file")?
                .unwrap_or_else(|| "~/.ssh/id_rsa.pub".to_string())),
        ),
        // Stays a Jinja lookup so the secret is read at play time, not now
        KeyRule::new(
            "pull_secret",
            json!(format!("{{{{ lookup('file', '{pull_secret_lookup}') }}}}")),
        ),
    ];

    if let Some(count) = opt_u64(params, "worker_node_count")? {
        rules.push(KeyRule::new("worker_node_count", json!(count)));
    }

    if cluster_type == "sno" {
        if let Some(disk) = opt_str(params, "sno_install_disk")? {
            rules.push(KeyRule::new("sno_install_disk", json!(disk)));
        }
    } else {
        if let Some(disk) = opt_str(params, "control_plane_install_disk")? {
            rules.push(KeyRule::new("control_plane_install_disk", json!(disk)));
        }
        if let Some(disk) = opt_str(params, "worker_install_disk")? {
            rules.push(KeyRule::new("worker_install_disk", json!(disk)));
        }
    }

    Ok(rules)
}

/// Parses extra_vars_json into a flat override map.
fn parse_overrides(params: &Value) -> Result<Map<String, Value>, ToolError> {
    match opt_str(params, "extra_vars_json")? {
        None => Ok(Map::new()),
        Some(raw) => {
            let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                ToolError::Validation(format!("extra_vars_json is not valid JSON: {e}"))
            })?;
            match parsed {
                Value::Object(map) => Ok(map),
                _ => Err(ToolError::Validation(
                    "extra_vars_json must be a JSON object".to_string(),
                )),
            }
        }
    }
}
