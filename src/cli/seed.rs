//! Seed command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::services::{SeedOptions, SeedService};

use super::App;

impl App {
    /// Replace the database contents with the demo hierarchy.
    pub async fn run_seed(&self, seed: Option<u64>, templates_only: bool) -> Result<()> {
        let config = Config::load_with_dotenv()?;
        let ctx = Context::from(config).await?;

        let report = ctx
            .resolve::<SeedService>()
            .run(SeedOptions {
                seed,
                templates_only,
            })
            .await?;

        println!(
            "Seeded {} nodes, {} users, {} risks, {} incidents, {} action items",
            report.nodes, report.users, report.risks, report.incidents, report.action_items
        );
        Ok(())
    }
}
