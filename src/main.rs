// Artifactory MCP Gateway - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server.
// Usage:
//   artifactory-mcp serve                         # Run MCP server (stdio)
//   artifactory-mcp capabilities                  # Print the bridge method surface
//   artifactory-mcp stat <repository> <path>      # One-shot artifact details
//   artifactory-mcp ping                          # Check connectivity and auth
//
// Configuration comes from the environment: ARTIFACTORY_BASE_URL,
// ARTIFACTORY_TOKEN / ARTIFACTORY_API_KEY / ARTIFACTORY_USERNAME+PASSWORD,
// ARTIFACTORY_VERIFY_SSL, ARTIFACTORY_TIMEOUT_SECONDS,
// MCP_DEFAULT_MAX_ITEMS, MCP_WORKER_THREADS, MCP_CALL_LOG.

use anyhow::{Context, Result};
use artifactory_mcp::handles::HandleStore;
use artifactory_mcp::{artifact_ops, bridge, client, mcp, settings::ServerSettings};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "artifactory-mcp")]
#[command(author = "Joseph Stone")]
#[command(version)]
#[command(about = "Artifactory MCP gateway with generic method-invocation bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// Print the public method surface of the Artifactory client
    Capabilities,

    /// One-shot artifact details (stat, properties)
    Stat {
        /// Repository name
        repository: String,

        /// Path inside the repository
        path: String,

        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Check connectivity and auth against the configured instance
    Ping {
        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging (safe if already init)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();

    let settings = ServerSettings::from_env()
        .context("Failed to load settings from environment")?;

    match &cli.command {
        Commands::Serve => {
            // Blocks until stdin closes
            mcp::run(settings);
        }

        Commands::Capabilities => {
            let capabilities = bridge::list_capabilities();
            println!("{}", serde_json::to_string_pretty(&capabilities)?);
        }

        Commands::Stat { repository, path, base_url } => {
            // One-shot invocation: handles produced here die with the process.
            let store = HandleStore::new();
            let details = artifact_ops::get_artifact_details(
                &settings,
                &store,
                repository,
                path,
                true,
                false,
                base_url.as_deref(),
            )
            .with_context(|| format!("Failed to stat {}/{}", repository, path))?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }

        Commands::Ping { base_url } => {
            let resolved = client::resolve_base_url(base_url.as_deref(), &settings)?;
            let root = client::create_root(&resolved, &settings)?;
            let reply = root.ping().with_context(|| format!("Ping failed for {}", resolved))?;
            println!("{}: {}", resolved, reply);
        }
    }

    Ok(())
}
