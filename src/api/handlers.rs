//! Route handlers. Each resolves its service from the shared context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::AppError;
use crate::models::{
    ActionItem, DashboardSummary, Incident, InsightResult, NewIncident, NewNode, NewRisk, Node,
    NodeId, Risk, RiskId, TreeNode, UserId,
};
use crate::provider::Task;
use crate::services::{
    DashboardService, Health, HealthService, InsightService, RecordService, ScopeService,
};

/// Optional scope selector; absent means the whole hierarchy.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub node_id: Option<NodeId>,
}

/// Action listing filters; both are optional.
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub node_id: Option<NodeId>,
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub text: String,
    pub task: Option<String>,
}

/// Query-string form of [`GenerateBody`].
#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    pub text: Option<String>,
    pub task: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub insight: String,
}

pub async fn health(State(ctx): State<Context>) -> Json<Health> {
    Json(ctx.resolve::<HealthService>().check().await)
}

pub async fn list_nodes(State(ctx): State<Context>) -> Result<Json<Vec<Node>>, AppError> {
    Ok(Json(ctx.resolve::<ScopeService>().list_nodes().await?))
}

pub async fn node_tree(State(ctx): State<Context>) -> Result<Json<Vec<TreeNode>>, AppError> {
    Ok(Json(ctx.resolve::<ScopeService>().tree().await?))
}

pub async fn get_node(
    State(ctx): State<Context>,
    Path(id): Path<NodeId>,
) -> Result<Json<Node>, AppError> {
    Ok(Json(ctx.resolve::<ScopeService>().get_node(id).await?))
}

pub async fn create_node(
    State(ctx): State<Context>,
    Json(node): Json<NewNode>,
) -> Result<(StatusCode, Json<Node>), AppError> {
    let node = ctx.resolve::<RecordService>().create_node(node).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn dashboard(
    State(ctx): State<Context>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let summary = ctx.resolve::<DashboardService>().summary(query.node_id).await?;
    Ok(Json(summary))
}

pub async fn list_risks(
    State(ctx): State<Context>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<Risk>>, AppError> {
    Ok(Json(ctx.resolve::<ScopeService>().list_risks(query.node_id).await?))
}

pub async fn get_risk(
    State(ctx): State<Context>,
    Path(id): Path<RiskId>,
) -> Result<Json<Risk>, AppError> {
    Ok(Json(ctx.resolve::<RecordService>().get_risk(id).await?))
}

pub async fn create_risk(
    State(ctx): State<Context>,
    Json(risk): Json<NewRisk>,
) -> Result<(StatusCode, Json<Risk>), AppError> {
    let risk = ctx.resolve::<RecordService>().create_risk(risk).await?;
    Ok((StatusCode::CREATED, Json(risk)))
}

pub async fn list_incidents(
    State(ctx): State<Context>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<Incident>>, AppError> {
    let incidents = ctx
        .resolve::<ScopeService>()
        .list_incidents(query.node_id)
        .await?;
    Ok(Json(incidents))
}

pub async fn get_incident(
    State(ctx): State<Context>,
    Path(id): Path<i64>,
) -> Result<Json<Incident>, AppError> {
    Ok(Json(ctx.resolve::<RecordService>().get_incident(id).await?))
}

pub async fn create_incident(
    State(ctx): State<Context>,
    Json(incident): Json<NewIncident>,
) -> Result<(StatusCode, Json<Incident>), AppError> {
    let incident = ctx.resolve::<RecordService>().create_incident(incident).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn list_action_items(
    State(ctx): State<Context>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<Vec<ActionItem>>, AppError> {
    let actions = ctx
        .resolve::<ScopeService>()
        .list_actions(query.node_id, query.assigned_to)
        .await?;
    Ok(Json(actions))
}

pub async fn get_action_item(
    State(ctx): State<Context>,
    Path(id): Path<i64>,
) -> Result<Json<ActionItem>, AppError> {
    Ok(Json(ctx.resolve::<RecordService>().get_action_item(id).await?))
}

pub async fn all_insights(State(ctx): State<Context>) -> Result<Json<InsightResult>, AppError> {
    Ok(Json(ctx.resolve::<InsightService>().get_scope_insight(None).await?))
}

pub async fn scope_insight(
    State(ctx): State<Context>,
    Path(node_id): Path<NodeId>,
) -> Result<Json<InsightResult>, AppError> {
    let insight = ctx
        .resolve::<InsightService>()
        .get_scope_insight(Some(node_id))
        .await?;
    Ok(Json(insight))
}

/// Free text straight to the provider.
///
/// `text` and `task` come from a JSON body or, without one, from the query
/// string. Unknown task names reach the provider as "no task".
pub async fn generate(
    State(ctx): State<Context>,
    Query(params): Query<GenerateParams>,
    body: Option<Json<GenerateBody>>,
) -> Result<Json<GenerateResponse>, AppError> {
    let (text, task) = match body {
        Some(Json(body)) => (body.text, body.task),
        None => (params.text.unwrap_or_default(), params.task),
    };
    if text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    let task = task.as_deref().and_then(|t| t.parse::<Task>().ok());
    let insight = ctx.resolve::<InsightService>().generate(&text, task).await?;
    Ok(Json(GenerateResponse { insight }))
}
