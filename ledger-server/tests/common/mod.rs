//! 集成测试公共工具
//!
//! 内存 SQLite + 完整路由，通过 `oneshot` 直接调用，不监听端口。

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use ledger_server::api::build_router;
use ledger_server::auth::JwtConfig;
use ledger_server::db::DbService;
use ledger_server::db::repository::{order, reference};
use ledger_server::{Config, ServerState};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{OrderCreate, OrderStatus, Role};
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret-that-is-long-enough";

pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbService::in_memory().await.expect("in-memory database");
        let config = Config::with_overrides(
            "/tmp/ledger-it",
            JwtConfig::with_secret(SECRET),
            chrono_tz::Tz::UTC,
        );
        let state = ServerState::new(config, db.pool);
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub fn token(&self, id: i64, role: Role, branch: Option<i64>) -> String {
        self.state
            .jwt_service
            .generate_token(id, &format!("user{id}"), role, branch)
            .expect("token")
    }

    /// Send a request; returns status and parsed JSON body (Null when empty)
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn branch(&self, name: &str) -> i64 {
        reference::create_branch(&self.state.pool, name)
            .await
            .expect("branch")
    }

    pub async fn manager(&self, username: &str, branch: i64) -> i64 {
        reference::create_employee(&self.state.pool, username, username, Role::Manager, Some(branch))
            .await
            .expect("manager")
    }

    /// Create an order the way the order collaborator would
    pub async fn order(&self, total: &str, branch: Option<i64>, manager: Option<i64>, doc_type: &str) -> i64 {
        let client_id = reference::create_client(&self.state.pool, "Client", Some("+998900000000"))
            .await
            .expect("client");
        let data = OrderCreate {
            client_id,
            branch_id: branch,
            manager_id: manager,
            status: OrderStatus::NotStarted,
            customer_type: None,
            doc_type: Some(doc_type.to_string()),
            country: None,
            payment_method: None,
            deadline: None,
            total_amount: total.parse::<Decimal>().expect("decimal"),
            notes: None,
        };
        order::create(&self.state.pool, &data, shared::util::now_millis())
            .await
            .expect("order")
            .id
    }
}

/// Decimal fields serialize as strings
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
