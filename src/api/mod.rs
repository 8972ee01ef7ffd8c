// src/api/mod.rs

pub mod admins;
pub mod balance;
pub mod bot;
pub mod payments;
pub mod support;
pub mod telegram;
pub mod users;
pub mod webhooks;
pub mod yookassa;

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use std::collections::HashMap;

// Фронт ходит с других origin'ов, поэтому CORS везде открыт.
const ALLOW_ORIGIN: (&str, &str) = ("Access-Control-Allow-Origin", "*");

pub fn json_response(status: StatusCode, body: impl Serialize) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(ALLOW_ORIGIN)
        .json(body)
}

pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, serde_json::json!({ "error": message }))
}

/// Фиксированный preflight-ответ, один на каждый эндпоинт.
pub fn preflight(methods: &str, headers: &str) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(ALLOW_ORIGIN)
        .insert_header(("Access-Control-Allow-Methods", methods))
        .insert_header(("Access-Control-Allow-Headers", headers))
        .insert_header(("Access-Control-Max-Age", "86400"))
        .finish()
}

pub fn query_map(req: &HttpRequest) -> HashMap<String, String> {
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default()
}

/// Токен сессии: заголовок X-Auth-Token, либо query-параметр token.
pub fn client_token(req: &HttpRequest, query: &HashMap<String, String>) -> Option<String> {
    req.headers()
        .get("X-Auth-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query.get("token").cloned())
}
