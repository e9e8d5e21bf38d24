//! Insight command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::models::{NodeId, Narrative};
use crate::services::InsightService;

use super::App;

impl App {
    /// Print the insight for a scope to stdout.
    pub async fn run_insight(&self, node_id: Option<NodeId>) -> Result<()> {
        let config = Config::load_with_dotenv()?;
        let ctx = Context::from(config).await?;

        let insight = ctx
            .resolve::<InsightService>()
            .get_scope_insight(node_id)
            .await?;

        println!("Scope: {}", insight.scope_label);
        println!(
            "Risks: {}  Incidents: {}  Actions: {}  Financial loss: {}",
            insight.counts.risks_count,
            insight.counts.incidents_count,
            insight.counts.actions_count,
            insight.financial_loss
        );
        match insight.narrative {
            Narrative::Combined { text } => println!("\n{}", text),
            Narrative::Tabular {
                risks,
                incidents,
                actions,
            } => {
                println!("\nRisks: {}", risks);
                println!("Incidents: {}", incidents);
                println!("Actions: {}", actions);
            }
        }
        Ok(())
    }
}
