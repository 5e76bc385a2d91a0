//! HTTP 端到端测试 - 收款、列表、统计、审计
//!
//! 每个测试独立的内存数据库，通过 oneshot 调用完整路由。

mod common;

use common::{TestApp, dec};
use http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use shared::models::Role;

fn payment(amount: &str) -> serde_json::Value {
    json!({ "amount": amount, "method": "cash" })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = app
        .call(Method::GET, "/api/orders", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_two_payments_settle_order() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    let order = app.order("500", None, None, "visa").await;

    let (status, receipt) = app
        .post(&format!("/api/orders/{order}/payments"), &admin, payment("200"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["new_payment_state"], "PARTIAL");
    assert_eq!(dec(&receipt["new_paid_amount"]), Decimal::from(200));

    let (status, receipt) = app
        .post(&format!("/api/orders/{order}/payments"), &admin, payment("300"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["new_payment_state"], "PAID");

    let (status, detail) = app.get(&format!("/api/orders/{order}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["order"]["payment_state"], "PAID");
    assert_eq!(dec(&detail["order"]["balance"]), Decimal::ZERO);
    assert_eq!(dec(&detail["order"]["paid_amount"]), Decimal::from(500));
    assert_eq!(detail["payments"].as_array().map(Vec::len), Some(2));

    let (status, audit) = app
        .get(
            &format!("/api/audit-log?action=payment.create&entity_id={order}"),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["total"], 2);
}

#[tokio::test]
async fn test_partial_payment_and_state_filter() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    let partial = app.order("500", None, None, "visa").await;
    app.order("700", None, None, "visa").await;

    app.post(&format!("/api/orders/{partial}/payments"), &admin, payment("100"))
        .await;

    let (status, page) = app.get("/api/orders?payment_state=partial", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    let row = &page["items"][0];
    assert_eq!(row["id"], partial);
    assert_eq!(row["payment_state"], "PARTIAL");
    assert_eq!(dec(&row["balance"]), Decimal::from(400));
}

#[tokio::test]
async fn test_invalid_amounts_are_rejected() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    let order = app.order("500", None, None, "visa").await;

    for amount in ["0", "-5", "10.001"] {
        let (status, body) = app
            .post(&format!("/api/orders/{order}/payments"), &admin, payment(amount))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "amount {amount}");
        assert_eq!(body["code"], 5006);
    }

    let (status, payments) = app.get(&format!("/api/orders/{order}/payments"), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payments.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_manager_is_confined_to_branch() {
    let app = TestApp::new().await;
    let north = app.branch("North").await;
    let south = app.branch("South").await;
    let aziz = app.manager("aziz", north).await;
    let own = app.order("100", Some(north), Some(aziz), "visa").await;
    let foreign = app.order("100", Some(south), None, "visa").await;

    let manager = app.token(aziz, Role::Manager, Some(north));
    let (status, page) = app.get("/api/orders", &manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], own);

    let (status, _) = app.get(&format!("/api/orders/{foreign}"), &manager).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post(&format!("/api/orders/{foreign}/payments"), &manager, payment("10"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2006);

    let (status, _) = app
        .get(&format!("/api/orders?branch_id={south}"), &manager)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token(1, Role::Admin, None);
    let (_, page) = app.get("/api/orders", &admin).await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn test_viewer_cannot_record_payments() {
    let app = TestApp::new().await;
    let north = app.branch("North").await;
    let order = app.order("100", Some(north), None, "visa").await;

    let viewer = app.token(9, Role::Viewer, Some(north));
    let (status, _) = app.get(&format!("/api/orders/{order}"), &viewer).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&format!("/api/orders/{order}/payments"), &viewer, payment("10"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);
}

#[tokio::test]
async fn test_soft_deleted_order_disappears() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    let kept = app.order("100", None, None, "visa").await;
    let gone = app.order("900", None, None, "visa").await;

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/orders/{gone}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = app.get("/api/orders", &admin).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], kept);

    let (status, body) = app.get(&format!("/api/orders/{gone}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);

    let (status, _) = app
        .post(&format!("/api/orders/{gone}/payments"), &admin, payment("10"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, summary) = app.get("/api/dashboard/summary", &admin).await;
    assert_eq!(summary["orders_total"], 1);
}

#[tokio::test]
async fn test_dashboard_reports() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    for doc in ["passport", "diploma", "visa", "contract", "license", "certificate"] {
        app.order("50", None, None, doc).await;
    }

    let (status, timeline) = app.get("/api/dashboard/timeline", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let points = timeline.as_array().expect("points");
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["orders"], 6);

    let (status, top) = app.get("/api/dashboard/top", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top["doc_types"].as_array().map(Vec::len), Some(5));

    let (status, stats) = app
        .get("/api/dashboard/payment-stats?granularity=monthly", &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["granularity"], "month");
    assert_eq!(stats["rows"][0]["states"]["UNPAID"]["count"], 6);
    assert_eq!(stats["rows"][0]["states"]["PAID"]["count"], 0);

    let (status, filters) = app.get("/api/dashboard/filters", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filters["doc_types"].as_array().map(Vec::len), Some(6));
}

#[tokio::test]
async fn test_reconcile_and_override() {
    let app = TestApp::new().await;
    let admin = app.token(1, Role::Admin, None);
    let order = app.order("500", None, None, "visa").await;
    app.post(&format!("/api/orders/{order}/payments"), &admin, payment("100"))
        .await;

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/api/orders/{order}/payment-state"),
            Some(&admin),
            Some(json!({ "payment_state": "settled" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 5007);

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/api/orders/{order}/payment-state"),
            Some(&admin),
            Some(json!({ "payment_state": "paid" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_state"], "PAID");

    // stored state wins for display until the ledger is re-summed
    let (_, detail) = app.get(&format!("/api/orders/{order}"), &admin).await;
    assert_eq!(detail["order"]["payment_state"], "PAID");

    let (status, outcome) = app
        .call(Method::POST, &format!("/api/orders/{order}/reconcile"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["payment_state"], "PARTIAL");
    assert_eq!(outcome["changed"], true);

    let manager = app.token(2, Role::Manager, None);
    let (status, body) = app
        .call(Method::POST, &format!("/api/orders/{order}/reconcile"), Some(&manager), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let (status, body) = app.get("/api/audit-log", &manager).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
}
