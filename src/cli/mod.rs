//! CLI module for risk-insights.
//!
//! Subcommands:
//! - `init`: Apply database migrations
//! - `serve`: Run the HTTP API
//! - `seed`: Rebuild the demo dataset
//! - `insight`: Print the insight for a scope

mod init;
mod insight;
mod seed;
mod serve;

use clap::{Parser, Subcommand};

use crate::models::NodeId;

/// Risk hierarchy aggregation with generated insights
#[derive(Parser)]
#[command(name = "risk-insights")]
#[command(about = "Risk hierarchy aggregation with generated insights")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply pending database migrations
    Init,

    /// Run the HTTP API
    Serve {
        /// Host address to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Wipe the database and load the demo hierarchy
    Seed {
        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,

        /// Use template text only, without calling the provider
        #[arg(long)]
        templates_only: bool,
    },

    /// Print the insight for a node's subtree (all nodes when omitted)
    Insight {
        /// Node identifier
        node_id: Option<NodeId>,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Serve { ref host, port } => self.run_serve(host.clone(), port).await,
            Command::Seed {
                seed,
                templates_only,
            } => self.run_seed(seed, templates_only).await,
            Command::Insight { node_id } => self.run_insight(node_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_flags() {
        let app = App::parse_from(["risk-insights", "seed", "--seed", "7", "--templates-only"]);
        assert!(matches!(
            app.command,
            Command::Seed {
                seed: Some(7),
                templates_only: true
            }
        ));
    }

    #[test]
    fn test_parse_insight_without_node() {
        let app = App::parse_from(["risk-insights", "-v", "insight"]);
        assert!(app.verbose);
        assert!(matches!(app.command, Command::Insight { node_id: None }));
    }
}
