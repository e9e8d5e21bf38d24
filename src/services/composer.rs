//! Insight composition: prompts and tables from aggregated records.

use std::fmt::Write as _;

use crate::error::ProviderError;
use crate::models::{ActionItem, Aggregate, Incident, Narrative, Risk};
use crate::provider::{GenerateRequest, Table, Task, TextGenerator};

pub const NO_RISKS: &str = "No risks.";
pub const NO_INCIDENTS: &str = "No incidents.";
pub const NO_ACTIONS: &str = "No actions.";

/// Generates the narrative for a scope.
///
/// Table-capable providers get one summarization request per non-empty
/// record kind, issued concurrently; an empty kind answers with its fixed
/// text and makes no call. Other providers get one combined prompt.
pub async fn compose_insight<G>(
    generator: &G,
    scope_label: &str,
    data: &Aggregate,
) -> Result<Narrative, ProviderError>
where
    G: TextGenerator + ?Sized,
{
    if generator.supports_tables() {
        let (risks, incidents, actions) = futures::try_join!(
            summarize(generator, scope_label, "risks", risk_table(&data.risks), NO_RISKS),
            summarize(
                generator,
                scope_label,
                "incidents",
                incident_table(&data.incidents),
                NO_INCIDENTS
            ),
            summarize(
                generator,
                scope_label,
                "actions",
                action_table(&data.actions),
                NO_ACTIONS
            )
        )?;
        return Ok(Narrative::Tabular {
            risks,
            incidents,
            actions,
        });
    }

    let prompt = combined_prompt(scope_label, data);
    let text = generator.generate(&GenerateRequest::text(prompt)).await?;
    Ok(Narrative::Combined { text })
}

async fn summarize<G>(
    generator: &G,
    scope_label: &str,
    kind: &str,
    table: Table,
    when_empty: &'static str,
) -> Result<String, ProviderError>
where
    G: TextGenerator + ?Sized,
{
    if table.is_empty() {
        return Ok(when_empty.to_string());
    }
    let prompt = format!("Summarize the following {} for scope: {}", kind, scope_label);
    generator
        .generate(&GenerateRequest::tabular(prompt, table, Task::Summarization))
        .await
}

/// The single prompt sent to chat-style providers.
///
/// Sections are fixed: scope, counts, one sample each of risk, incident
/// and action when present, then the closing instruction.
pub fn combined_prompt(scope_label: &str, data: &Aggregate) -> String {
    let counts = data.counts();
    let mut prompt = format!(
        "Provide a concise AI insight for the following scope: {}\n",
        scope_label
    );
    let _ = writeln!(prompt, "Risks: {}", counts.risks_count);
    let _ = writeln!(prompt, "Incidents: {}", counts.incidents_count);
    let _ = writeln!(prompt, "Actions: {}", counts.actions_count);
    if let Some(risk) = data.risks.first() {
        let _ = writeln!(
            prompt,
            "Top Risk: {} - {}",
            risk.title,
            risk.description.as_deref().unwrap_or_default()
        );
    }
    if let Some(incident) = data.incidents.first() {
        let _ = writeln!(
            prompt,
            "Recent Incident: {} - {}",
            incident.name,
            incident.description.as_deref().unwrap_or_default()
        );
    }
    if let Some(action) = data.actions.first() {
        let _ = writeln!(prompt, "Sample Action: {}", action.description);
    }
    prompt.push_str("Summarize the risk and incident landscape and suggest a next step.");
    prompt
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub fn risk_table(risks: &[Risk]) -> Table {
    let mut table = Table::new(["title", "description", "type", "status"]);
    for risk in risks {
        table.push_row([
            risk.title.clone(),
            text(&risk.description),
            text(&risk.risk_type),
            text(&risk.status),
        ]);
    }
    table
}

pub fn incident_table(incidents: &[Incident]) -> Table {
    let mut table = Table::new(["name", "description", "root cause", "loss", "financial"]);
    for incident in incidents {
        table.push_row([
            incident.name.clone(),
            text(&incident.description),
            text(&incident.root_cause),
            incident
                .loss_amount
                .map(|loss| loss.to_string())
                .unwrap_or_default(),
            if incident.is_financial { "yes" } else { "no" }.to_string(),
        ]);
    }
    table
}

pub fn action_table(actions: &[ActionItem]) -> Table {
    let mut table = Table::new(["description", "status", "due"]);
    for action in actions {
        table.push_row([
            action.description.clone(),
            text(&action.status),
            action
                .due_date
                .map(|due| due.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}
