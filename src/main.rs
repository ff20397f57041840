mod config;
mod error;
mod exec;
mod mcp;
mod project;
mod sandbox;
mod tools;
mod vars;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::exec::PlaybookRunner;
use crate::mcp::McpServer;
use crate::project::ProjectLayout;
use crate::tools::builtin::{
    CreateVarsFileTool, ListDocsTool, ListPlaybooksTool, ListRolesTool, ReadTextFileTool,
    RunPlaybookTool,
};
use crate::tools::{ToolContext, ToolRegistry};
use crate::vars::TemplateEngine;

fn print_help() {
    eprintln!(
        "\
ansible-mcp v{}

An MCP server that drives an Ansible automation project over stdio.

USAGE:
    ansible-mcp [OPTIONS] [CONFIG_PATH]

ARGUMENTS:
    CONFIG_PATH    Path to TOML configuration file [default: config/server.toml]

OPTIONS:
    -h, --help       Print this help message and exit
    -V, --version    Print version and exit

ENVIRONMENT VARIABLES:
    Variables are referenced in the config file via ${{VAR_NAME}} syntax.

    RUST_LOG    Log level filter for tracing
                (e.g. debug, ansible_mcp=debug,warn)

EXAMPLES:
    ansible-mcp                            # uses config/server.toml
    ansible-mcp /etc/ansible-mcp.toml      # custom config path
    RUST_LOG=debug ansible-mcp             # with debug logging",
        env!("CARGO_PKG_VERSION"),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --help / --version before anything else
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                eprintln!("ansible-mcp v{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    // Logging goes to stderr: stdout is the protocol channel
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ansible_mcp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.toml".to_string());

    info!("Loading configuration from {config_path}");
    let config = Config::load_or_default(&config_path)?;

    let layout = ProjectLayout::new(&config.project.root)
        .with_context(|| format!("project root {}", config.project.root.display()))?;
    info!("Project root: {}", layout.root().display());
    info!(
        "Vars template: {} -> {}",
        config.vars.sample_file.display(),
        config.vars.target_file.display()
    );

    let context = ToolContext {
        layout,
        runner: PlaybookRunner::new(config.runner.clone()),
        engine: TemplateEngine::new(
            config.vars.anchor.clone(),
            config.vars.quote_keys.clone(),
        ),
        vars: config.vars.clone(),
    };

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ListPlaybooksTool));
    registry.register(Box::new(ListRolesTool));
    registry.register(Box::new(ListDocsTool));
    registry.register(Box::new(ReadTextFileTool));
    registry.register(Box::new(RunPlaybookTool));
    registry.register(Box::new(CreateVarsFileTool));
    info!("Tools: {} registered", registry.len());

    let server = McpServer::new(registry, context);
    tokio::select! {
        result = server.serve_stdio() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, exiting");
            Ok(())
        }
    }
}
