//! Demo data seeder.
//!
//! Rebuilds the sample bank hierarchy from scratch inside one write
//! session. Titles and descriptions come from the configured provider
//! through [`with_fallback`], so a missing or failing provider still
//! produces a complete dataset from templates.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::context::{AppGenerator, AppStore, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{NewActionItem, NewIncident, NewNode, NewRisk, NewUser, Node};
use crate::provider::{with_fallback, GenerateRequest};
use crate::store::WriteSession;

type Countries = &'static [&'static str];

/// Regions under the root, each split into sub-regions of countries.
const REGIONS: &[(&str, &[(&str, Countries)])] = &[(
    "Africa",
    &[
        ("East Africa", &["Kenya", "Tanzania", "Uganda"]),
        (
            "Southern Africa",
            &[
                "Botswana",
                "eSwatini",
                "Lesotho",
                "Malawi",
                "Mozambique",
                "Namibia",
                "South Africa",
                "Zambia",
                "Zimbabwe",
            ],
        ),
        (
            "West Africa",
            &["Angola", "Côte d'Ivoire", "Ghana", "Nigeria", "South Sudan"],
        ),
    ],
)];

/// Jurisdictions attached directly to the root.
const STANDALONE_COUNTRIES: &[&str] = &["Isle of Man", "Jersey"];

const SEGMENTS: &[&str] = &[
    "Consumer & Community Banking",
    "Corporate & Investment Bank",
    "Commercial Banking",
    "Asset Management",
];

const BUSINESS_UNITS: &[&str] = &[
    "Business Unit A",
    "Business Unit B",
    "Business Unit C",
    "Business Unit D",
    "Business Unit E",
];

const USERNAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "eve", "frank", "grace", "heidi", "ivan", "judy",
];

const RISK_TYPES: &[&str] = &["third_party", "change", "incident", "regulatory", "operational"];
const RISK_STATUSES: &[&str] = &["open", "closed", "in progress"];
const ACTION_STATUSES: &[&str] = &["open", "closed", "pending"];

const INCIDENT_NAMES: &[&str] = &[
    "System outage",
    "Data breach",
    "Payment failure",
    "Fraudulent transaction",
    "Reporting error",
];
const ROOT_CAUSES: &[&str] = &[
    "Process failure",
    "Human error",
    "Vendor failure",
    "External fraud",
    "Infrastructure fault",
];

/// How a seeding run behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedOptions {
    /// Fixed RNG seed for reproducible data.
    pub seed: Option<u64>,
    /// Skip the provider and use template text throughout.
    pub templates_only: bool,
}

/// Records created by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub nodes: usize,
    pub users: usize,
    pub risks: usize,
    pub incidents: usize,
    pub action_items: usize,
}

#[derive(FromContext, Clone)]
pub struct SeedService {
    store: AppStore,
    generator: AppGenerator,
}

impl SeedService {
    /// Wipes every table and repopulates it. All or nothing.
    pub async fn run(&self, options: SeedOptions) -> Result<SeedReport, AppError> {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut seeder = Seeder {
            rng,
            generator: &self.generator,
            templates_only: options.templates_only,
            report: SeedReport::default(),
        };

        let mut session = self.store.write().await?;
        match seeder.populate(&mut *session).await {
            Ok(()) => {
                session.commit().await?;
                tracing::info!(report = ?seeder.report, "Seeding complete");
                Ok(seeder.report)
            }
            Err(e) => {
                tracing::error!("Seeding failed, rolling back: {}", e);
                session.rollback().await?;
                Err(e)
            }
        }
    }
}

/// Where a business unit sits, for prompts and templates.
struct Location<'a> {
    country: &'a str,
    segment: &'a str,
    business_unit: &'a str,
}

impl Location<'_> {
    fn describe(&self) -> String {
        format!("{}, {}, {}", self.business_unit, self.segment, self.country)
    }
}

struct Seeder<'a> {
    rng: StdRng,
    generator: &'a AppGenerator,
    templates_only: bool,
    report: SeedReport,
}

impl Seeder<'_> {
    async fn populate(&mut self, session: &mut dyn WriteSession) -> Result<(), AppError> {
        session.reset().await?;

        let root = self.node(session, NewNode::root("Root")).await?;
        for (region, subregions) in REGIONS {
            let region_node = self.node(session, NewNode::child_of(&root, *region)).await?;
            for (subregion, countries) in subregions.iter() {
                let subregion_node = self
                    .node(session, NewNode::child_of(&region_node, *subregion))
                    .await?;
                for country in countries.iter() {
                    let country_node = self
                        .node(session, NewNode::child_of(&subregion_node, *country))
                        .await?;
                    self.country(session, &country_node).await?;
                }
            }
        }
        for country in STANDALONE_COUNTRIES {
            let country_node = self.node(session, NewNode::child_of(&root, *country)).await?;
            self.country(session, &country_node).await?;
        }
        Ok(())
    }

    async fn node(&mut self, session: &mut dyn WriteSession, node: NewNode) -> Result<Node, AppError> {
        let node = session.create_node(node).await?;
        self.report.nodes += 1;
        Ok(node)
    }

    async fn country(&mut self, session: &mut dyn WriteSession, country: &Node) -> Result<(), AppError> {
        tracing::debug!(country = %country.name, "Seeding country");
        for segment in SEGMENTS {
            let segment_node = self.node(session, NewNode::child_of(country, *segment)).await?;
            let unit_count = self.rng.gen_range(3..=5);
            for i in 0..unit_count {
                let name = format!("{} {}", self.pick(BUSINESS_UNITS), i + 1);
                let unit = self.node(session, NewNode::child_of(&segment_node, name)).await?;
                let location = Location {
                    country: &country.name,
                    segment,
                    business_unit: &unit.name,
                };
                self.business_unit(session, &unit, &location).await?;
            }
        }
        Ok(())
    }

    async fn business_unit(
        &mut self,
        session: &mut dyn WriteSession,
        unit: &Node,
        location: &Location<'_>,
    ) -> Result<(), AppError> {
        let domain = email_domain(location.country);
        for _ in 0..self.rng.gen_range(1..=3) {
            let username = format!("{}{}", self.pick(USERNAMES), self.rng.gen_range(1..=99));
            if session.find_user_by_username(&username).await?.is_some() {
                continue;
            }
            session
                .create_user(NewUser {
                    email: format!("{}@{}.testbank.com", username.to_lowercase(), domain),
                    username,
                    node_id: unit.id,
                    level: unit.level,
                    is_active: true,
                })
                .await?;
            self.report.users += 1;
        }
        let assignee = session.list_users_at(unit.id).await?.into_iter().next();

        let place = location.describe();
        for r in 0..self.rng.gen_range(2..=5) {
            let risk_type = self.pick(RISK_TYPES);
            let status = self.pick(RISK_STATUSES);
            let title = self
                .text(
                    format!(
                        "Generate a short risk title for a {} risk in {}",
                        risk_type, place
                    ),
                    format!("{} Risk {}", title_case(risk_type), r + 1),
                )
                .await;
            let description = self
                .text(
                    format!(
                        "Describe a {} risk for {} in {}, {}",
                        risk_type, location.business_unit, location.segment, location.country
                    ),
                    format!("Sample description for {} risk in {}.", risk_type, place),
                )
                .await;
            let risk = session
                .create_risk(NewRisk {
                    title,
                    description: Some(description),
                    node_id: unit.id,
                    risk_type: Some(risk_type.to_string()),
                    status: Some(status.to_string()),
                })
                .await?;
            self.report.risks += 1;

            let Some(assignee) = &assignee else {
                continue;
            };
            for a in 0..self.rng.gen_range(1..=2) {
                let description = self
                    .text(
                        format!(
                            "Suggest an action item for risk '{}' in {}",
                            risk.title, place
                        ),
                        format!("Action item {} for {} in {}.", a + 1, risk.title, place),
                    )
                    .await;
                let due_date = Utc::now() + Duration::days(self.rng.gen_range(7..=90));
                let status = self.pick(ACTION_STATUSES);
                session
                    .create_action_item(NewActionItem {
                        description,
                        risk_id: risk.id,
                        assigned_to: assignee.id,
                        status: Some(status.to_string()),
                        due_date: Some(due_date),
                    })
                    .await?;
                self.report.action_items += 1;
            }
        }

        for _ in 0..self.rng.gen_range(0..=2) {
            let name = self.pick(INCIDENT_NAMES);
            let is_financial = self.rng.gen_bool(0.6);
            let loss_amount = is_financial.then(|| self.rng.gen_range(1_000..=250_000));
            let root_cause = self.pick(ROOT_CAUSES);
            let description = self
                .text(
                    format!("Describe a {} incident at {}", name.to_lowercase(), place),
                    format!("Sample {} incident at {}.", name.to_lowercase(), place),
                )
                .await;
            session
                .create_incident(NewIncident {
                    name: name.to_string(),
                    description: Some(description),
                    root_cause: Some(root_cause.to_string()),
                    loss_amount,
                    is_financial,
                    node_id: unit.id,
                })
                .await?;
            self.report.incidents += 1;
        }
        Ok(())
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.gen_range(0..items.len())]
    }

    async fn text(&self, prompt: String, template: String) -> String {
        if self.templates_only {
            return template;
        }
        with_fallback(&**self.generator, template)
            .text(&GenerateRequest::text(prompt))
            .await
    }
}

/// Email host label for a country: ASCII alphanumerics, lowercased.
fn email_domain(country: &str) -> String {
    country
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// Capitalizes the first letter of every alphabetic run.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::ProviderConfig;
    use crate::provider::build;
    use crate::services::scope::resolve_scope;
    use crate::store::backends::memory::MemoryStore;
    use crate::store::RiskStore;

    fn service(store: &MemoryStore) -> SeedService {
        // Default provider config has no key, so every text falls back.
        SeedService {
            store: Arc::new(store.clone()),
            generator: build(&ProviderConfig::default()).unwrap(),
        }
    }

    #[test]
    fn test_email_domain_strips_non_ascii() {
        assert_eq!(email_domain("Côte d'Ivoire"), "ctedivoire");
        assert_eq!(email_domain("Isle of Man"), "isleofman");
    }

    #[test]
    fn test_title_case_matches_template_style() {
        assert_eq!(title_case("third_party"), "Third_Party");
        assert_eq!(title_case("operational"), "Operational");
    }

    #[tokio::test]
    async fn test_seed_builds_hierarchy() {
        let store = MemoryStore::new();
        let report = service(&store)
            .run(SeedOptions {
                seed: Some(7),
                templates_only: false,
            })
            .await
            .unwrap();

        let session = store.read().await.unwrap();
        let nodes = session.list_all_nodes().await.unwrap();
        assert_eq!(nodes.len(), report.nodes);

        let root = &nodes[0];
        assert_eq!((root.name.as_str(), root.level), ("Root", 1));
        let top: Vec<_> = session
            .list_children(root.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(top, vec!["Africa", "Isle of Man", "Jersey"]);

        let all = resolve_scope(&*session, None).await.unwrap();
        let risks = session.list_risks_in(&all.ids()).await.unwrap();
        assert_eq!(risks.len(), report.risks);
        assert!(risks.iter().all(|r| r.title.contains(" Risk ")));
        assert!(report.users > 0 && report.action_items > 0);
    }

    #[tokio::test]
    async fn test_same_seed_same_shape() {
        let first = MemoryStore::new();
        let second = MemoryStore::new();
        let options = SeedOptions {
            seed: Some(42),
            templates_only: true,
        };

        let a = service(&first).run(options).await.unwrap();
        let b = service(&second).run(options).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_reseed_replaces_previous_data() {
        let store = MemoryStore::new();
        let options = SeedOptions {
            seed: Some(1),
            templates_only: true,
        };
        service(&store).run(options).await.unwrap();
        let report = service(&store).run(options).await.unwrap();

        let nodes = store.read().await.unwrap().list_all_nodes().await.unwrap();
        assert_eq!(nodes.len(), report.nodes);
        assert_eq!(nodes[0].id, 1);
    }
}
