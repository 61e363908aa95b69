#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use kitasuro_api::auth::jwt::{generate_access_token, JwtConfig};
use kitasuro_api::config::ServerConfig;
use kitasuro_api::router::build_app_router;
use kitasuro_api::state::AppState;
use kitasuro_core::roles::{ROLE_ADMIN, ROLE_STAFF};
use kitasuro_core::types::DbId;
use kitasuro_db::models::organization::CreateOrganization;
use kitasuro_db::models::user::CreateUser;
use kitasuro_db::repositories::{OrganizationRepo, UserRepo};
use kitasuro_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router, middleware included, on `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

/// Like [`build_test_app`], sharing `event_bus` so tests can subscribe.
pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
    };
    build_app_router(state, &config)
}

/// A seeded organization with one admin and one staff member.
pub struct Agency {
    pub organization_id: DbId,
    pub admin_id: DbId,
    pub staff_id: DbId,
}

impl Agency {
    pub fn admin_token(&self) -> String {
        token_for(self.admin_id, self.organization_id, ROLE_ADMIN)
    }

    pub fn staff_token(&self) -> String {
        token_for(self.staff_id, self.organization_id, ROLE_STAFF)
    }
}

pub async fn seed_agency(pool: &PgPool, name: &str) -> Agency {
    let org = OrganizationRepo::create(
        pool,
        &CreateOrganization {
            name: Some(name.to_string()),
            notification_email: None,
        },
    )
    .await
    .unwrap();

    let slug = name.to_lowercase().replace(' ', "-");
    let admin = UserRepo::create(
        pool,
        &CreateUser {
            organization_id: org.id,
            email: format!("admin@{slug}.test"),
            display_name: "Agency Admin".to_string(),
            role: Some(ROLE_ADMIN.to_string()),
        },
    )
    .await
    .unwrap();
    let staff = UserRepo::create(
        pool,
        &CreateUser {
            organization_id: org.id,
            email: format!("staff@{slug}.test"),
            display_name: "Agency Staff".to_string(),
            role: None,
        },
    )
    .await
    .unwrap();

    Agency {
        organization_id: org.id,
        admin_id: admin.id,
        staff_id: staff.id,
    }
}

pub fn token_for(user_id: DbId, organization_id: DbId, role: &str) -> String {
    generate_access_token(user_id, organization_id, role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
