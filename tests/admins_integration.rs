use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::Row;

use gameshop_api::api::admins::admins_gateway;

mod support;

#[actix_web::test]
async fn create_admin_hashes_password_and_conflicts_on_duplicate() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(admins_gateway)).await;

    let req = TestRequest::post()
        .uri("/admins")
        .set_json(json!({ "username": "root", "password": "hunter2", "email": "root@shop.local" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["admin"]["username"], "root");
    assert_eq!(body["admin"]["role"], "admin");

    let hash: String = sqlx::query("SELECT password_hash FROM admins WHERE username = 'root'")
        .fetch_one(pool)
        .await
        .expect("select admin")
        .get("password_hash");
    assert_ne!(hash, "hunter2");
    assert!(bcrypt::verify("hunter2", &hash).expect("verify"));

    let req = TestRequest::post()
        .uri("/admins")
        .set_json(json!({ "username": "root", "password": "other" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Username already exists");
}

#[actix_web::test]
async fn create_admin_requires_username_and_password() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(admins_gateway)).await;

    let req = TestRequest::post()
        .uri("/admins")
        .set_json(json!({ "username": "root" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri("/admins")
        .set_json(json!({ "username": "", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn toggle_site_roundtrip() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(admins_gateway)).await;

    let req = TestRequest::post()
        .uri("/admins")
        .set_json(json!({ "username": "root", "password": "hunter2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);

    let req = TestRequest::put()
        .uri("/admins")
        .set_json(json!({ "action": "toggle_site", "site_enabled": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = TestRequest::get()
        .uri("/admins?action=site_status")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["site_enabled"], false);
}

#[actix_web::test]
async fn update_and_delete_missing_admin_return_404() {
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state.clone()).service(admins_gateway)).await;

    let req = TestRequest::put()
        .uri("/admins")
        .set_json(json!({ "id": 424242, "is_active": false }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = TestRequest::delete().uri("/admins?id=424242").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = TestRequest::delete().uri("/admins").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
