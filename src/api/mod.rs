//! HTTP API over the insight services.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /health` | store and provider liveness |
//! | `GET /nodes`, `/nodes/tree`, `/nodes/:id` | hierarchy |
//! | `GET /dashboard?node_id=` | scope summary |
//! | `GET /risks?node_id=`, `/incidents?node_id=` | scoped listings |
//! | `GET /action_items?node_id=&assigned_to=` | scoped actions, by assignee |
//! | `GET /risks/:id`, `/incidents/:id`, `/action_items/:id` | record lookup |
//! | `POST /nodes`, `/risks`, `/incidents` | record creation |
//! | `GET /insights`, `/insights/:node_id` | scope insight |
//! | `POST /insights/generate` | free-text generation (JSON body or `?text=&task=`) |

mod handlers;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::Context;

pub use handlers::{ActionQuery, GenerateBody, GenerateParams, GenerateResponse, ScopeQuery};

/// Routes reachable without credentials.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Authentication middleware state.
#[derive(Clone)]
struct AuthState {
    api_key: Option<String>,
}

/// Requires `Authorization: Bearer <api_key>` when a key is configured.
async fn auth_middleware(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    let Some(expected_key) = &state.api_key else {
        return next.run(req).await;
    };
    if PUBLIC_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) if token == expected_key => next.run(req).await,
        _ => {
            tracing::debug!(path = req.uri().path(), "Rejected unauthenticated request");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Builds the application router.
pub fn router(ctx: Context) -> Router {
    let auth_state = AuthState {
        api_key: ctx.config.server.api_key.clone(),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/nodes", get(handlers::list_nodes).post(handlers::create_node))
        .route("/nodes/tree", get(handlers::node_tree))
        .route("/nodes/:id", get(handlers::get_node))
        .route("/dashboard", get(handlers::dashboard))
        .route("/risks", get(handlers::list_risks).post(handlers::create_risk))
        .route("/risks/:id", get(handlers::get_risk))
        .route(
            "/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route("/incidents/:id", get(handlers::get_incident))
        .route("/action_items", get(handlers::list_action_items))
        .route("/action_items/:id", get(handlers::get_action_item))
        .route("/insights", get(handlers::all_insights))
        .route("/insights/generate", post(handlers::generate))
        .route("/insights/:node_id", get(handlers::scope_insight))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::error::ProviderError;
    use crate::models::{NewActionItem, NewIncident, NewNode, NewRisk, NewUser};
    use crate::provider::{GenerateRequest, TextGenerator};
    use crate::store::backends::memory::MemoryStore;
    use crate::store::RiskStore;

    struct Canned;

    #[async_trait]
    impl TextGenerator for Canned {
        fn name(&self) -> &'static str {
            "Canned"
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
            if request.prompt == "fail" {
                return Err(ProviderError::Status {
                    provider: "Canned",
                    status: 503,
                    body: "overloaded".to_string(),
                });
            }
            Ok("Monitor vendors closely.".to_string())
        }
    }

    /// Root(1) ─┬─ Africa(2) ── Kenya(3)
    ///          └─ Jersey(4)
    ///
    /// Kenya owns risk 1 (with action item 1 for user 1) and incident 1.
    async fn app(api_key: Option<&str>) -> Router {
        let store = MemoryStore::new();
        let mut session = store.write().await.unwrap();
        let root = session.create_node(NewNode::root("Root")).await.unwrap();
        let africa = session
            .create_node(NewNode::child_of(&root, "Africa"))
            .await
            .unwrap();
        let kenya = session
            .create_node(NewNode::child_of(&africa, "Kenya"))
            .await
            .unwrap();
        session
            .create_node(NewNode::child_of(&root, "Jersey"))
            .await
            .unwrap();
        let user = session
            .create_user(NewUser {
                username: "wanjiru1".to_string(),
                email: "wanjiru1@kenya.testbank.com".to_string(),
                node_id: kenya.id,
                level: kenya.level,
                is_active: true,
            })
            .await
            .unwrap();
        let risk = session
            .create_risk(NewRisk {
                title: "Vendor outage".to_string(),
                description: Some("Core banking vendor".to_string()),
                node_id: kenya.id,
                risk_type: Some("third_party".to_string()),
                status: Some("open".to_string()),
            })
            .await
            .unwrap();
        session
            .create_action_item(NewActionItem {
                description: "Add a secondary vendor".to_string(),
                risk_id: risk.id,
                assigned_to: user.id,
                status: Some("pending".to_string()),
                due_date: None,
            })
            .await
            .unwrap();
        session
            .create_incident(NewIncident {
                name: "Card fraud".to_string(),
                description: None,
                root_cause: None,
                loss_amount: Some(1200),
                is_financial: true,
                node_id: kenya.id,
            })
            .await
            .unwrap();
        session.commit().await.unwrap();

        let mut config = Config::default();
        config.server.api_key = api_key.map(str::to_string);
        router(Context::new(Arc::new(store), Arc::new(Canned), config))
    }

    async fn send(app: Router, request: axum::http::Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_scope_insight_for_subtree() {
        let (status, body) = send(app(None).await, get("/insights/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope_label"], "Africa");
        assert_eq!(body["risks_count"], 1);
        assert_eq!(body["incidents_count"], 1);
        assert_eq!(body["actions_count"], 1);
        assert_eq!(body["financial_loss"], 1200);
        assert_eq!(body["narrative"]["kind"], "combined");
        assert_eq!(body["narrative"]["text"], "Monitor vendors closely.");
    }

    #[tokio::test]
    async fn test_all_nodes_insight() {
        let (status, body) = send(app(None).await, get("/insights")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope_label"], "All Nodes");
        assert_eq!(body["node_id"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_scope_is_404() {
        let (status, body) = send(app(None).await, get("/insights/99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "SCOPE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_sibling_scope_has_no_risks() {
        let (status, body) = send(app(None).await, get("/risks?node_id=4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (_, body) = send(app(None).await, get("/risks?node_id=1")).await;
        assert_eq!(body[0]["title"], "Vendor outage");
    }

    #[tokio::test]
    async fn test_dashboard_and_tree() {
        let (status, body) = send(app(None).await, get("/dashboard?node_id=3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope_label"], "Kenya");
        assert_eq!(body["incidents"][0]["name"], "Card fraud");

        let (status, body) = send(app(None).await, get("/nodes/tree")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["children"][0]["children"][0]["name"], "Kenya");
    }

    #[tokio::test]
    async fn test_generate_passes_text_through() {
        let (status, body) = send(
            app(None).await,
            post_json("/insights/generate", json!({ "text": "What next?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insight"], "Monitor vendors closely.");
    }

    #[tokio::test]
    async fn test_generate_accepts_query_text() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/insights/generate?text=What%20next%3F&task=qa")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(None).await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["insight"], "Monitor vendors closely.");

        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/insights/generate")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(None).await, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_record_lookups() {
        let (status, body) = send(app(None).await, get("/risks/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Vendor outage");

        let (status, body) = send(app(None).await, get("/incidents/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loss_amount"], 1200);

        let (status, body) = send(app(None).await, get("/action_items/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assigned_to"], 1);

        for uri in ["/risks/9", "/incidents/9", "/action_items/9"] {
            let (status, body) = send(app(None).await, get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn test_action_items_by_scope_and_assignee() {
        let (status, body) = send(app(None).await, get("/action_items?node_id=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["description"], "Add a secondary vendor");

        let (_, body) = send(app(None).await, get("/action_items?node_id=4")).await;
        assert_eq!(body, json!([]));

        let (_, body) = send(app(None).await, get("/action_items?assigned_to=1")).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (_, body) = send(app(None).await, get("/action_items?assigned_to=2")).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_created_records_join_their_scope() {
        let app = app(None).await;

        let (status, node) = send(
            app.clone(),
            post_json("/nodes", json!({ "name": "Uganda", "parent_id": 2, "level": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(node["id"], 5);

        let (status, _) = send(
            app.clone(),
            post_json("/risks", json!({ "title": "Mobile money fraud", "node_id": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, incident) = send(
            app.clone(),
            post_json(
                "/incidents",
                json!({ "name": "SIM swap", "loss_amount": 300, "is_financial": true, "node_id": 5 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(incident["root_cause"], Value::Null);

        let (_, body) = send(app.clone(), get("/dashboard?node_id=2")).await;
        assert_eq!(body["risks_count"], 2);
        assert_eq!(body["financial_loss"], 1500);

        let (status, body) = send(
            app,
            post_json("/risks", json!({ "title": "Orphan", "node_id": 99 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_text() {
        let (status, body) = send(
            app(None).await,
            post_json("/insights/generate", json!({ "text": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let (status, body) = send(
            app(None).await,
            post_json("/insights/generate", json!({ "text": "fail" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "PROVIDER_ERROR");
    }

    #[tokio::test]
    async fn test_api_key_guards_everything_but_health() {
        let (status, _) = send(app(Some("secret")).await, get("/nodes")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(app(Some("secret")).await, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "db": true, "ai": true }));

        let request = axum::http::Request::builder()
            .uri("/nodes")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(Some("secret")).await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(4));
    }
}
