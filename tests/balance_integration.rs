use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::Row;

use gameshop_api::api::balance::balance_gateway;

mod support;

#[actix_web::test]
async fn balance_lookup_and_validation() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let user_id = support::seed_user(pool, "rich", None).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(balance_gateway)).await;

    let req = TestRequest::get()
        .uri(&format!("/balance?user_id={user_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["username"], "rich");
    assert_eq!(body["balance"], 0.0);

    let req = TestRequest::get().uri("/balance").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::get().uri("/balance?user_id=99999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn deposit_updates_balance_and_records_transaction() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let user_id = support::seed_user(pool, "rich", None).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(balance_gateway)).await;

    let req = TestRequest::post()
        .uri("/balance")
        .set_json(json!({ "user_id": user_id, "amount": 150.5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["new_balance"], 150.5);
    assert!(body["transaction_id"].is_i64());

    let tx = sqlx::query(
        "SELECT amount::float8 AS amount, type, description FROM transactions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("select transaction");
    assert_eq!(tx.get::<f64, _>("amount"), 150.5);
    assert_eq!(tx.get::<String, _>("type"), "deposit");
    assert_eq!(
        tx.get::<Option<String>, _>("description").as_deref(),
        Some("Пополнение баланса")
    );

    // история отдаётся последними 50 записями
    let req = TestRequest::get()
        .uri(&format!("/balance?user_id={user_id}&action=transactions"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transactions"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn deposit_rejects_non_positive_amounts_and_unknown_users() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let user_id = support::seed_user(pool, "rich", None).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(balance_gateway)).await;

    let req = TestRequest::post()
        .uri("/balance")
        .set_json(json!({ "user_id": user_id, "amount": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri("/balance")
        .set_json(json!({ "user_id": 99999, "amount": 10 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = TestRequest::post()
        .uri("/balance")
        .set_json(json!({ "amount": 10 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM transactions")
        .fetch_one(pool)
        .await
        .expect("count transactions")
        .get("n");
    assert_eq!(count, 0);
}
