// src/api/balance.rs
//
// Баланс пользователя: просмотр, история операций, пополнение.

use actix_web::http::{Method, StatusCode};
use actix_web::{route, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::api::{error_response, json_response, preflight, query_map};
use crate::models::Transaction;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub user_id: i32,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

fn transaction_from_row(row: &PgRow) -> Transaction {
    Transaction {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        tx_type: row.get("type"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

#[utoipa::path(
    get,
    path = "/balance",
    tag = "balance",
    responses(
        (status = 200, description = "Balance or transaction history"),
        (status = 400, description = "user_id is required"),
        (status = 404, description = "User not found")
    )
)]
#[route("/balance", method = "GET", method = "POST", method = "OPTIONS")]
pub async fn balance_gateway(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let method = req.method().clone();
    if method == Method::OPTIONS {
        preflight("GET, POST, OPTIONS", "Content-Type, X-User-Id")
    } else if method == Method::GET {
        handle_get(&req, &state).await
    } else if method == Method::POST {
        handle_deposit(&state, &body).await
    } else {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

async fn handle_get(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let query: HashMap<String, String> = query_map(req);

    let Some(user_id) = query.get("user_id").and_then(|v| v.parse::<i32>().ok()) else {
        return error_response(StatusCode::BAD_REQUEST, "user_id is required");
    };

    match query.get("action").map(String::as_str).unwrap_or("balance") {
        "transactions" => list_transactions(state, user_id).await,
        _ => show_balance(state, user_id).await,
    }
}

async fn show_balance(state: &AppState, user_id: i32) -> HttpResponse {
    let row = match sqlx::query(
        "SELECT id, username, balance::float8 AS balance FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let Some(row) = row else {
        return error_response(StatusCode::NOT_FOUND, "User not found");
    };

    json_response(
        StatusCode::OK,
        json!({
            "user_id": row.get::<i32, _>("id"),
            "username": row.get::<String, _>("username"),
            "balance": row.get::<f64, _>("balance")
        }),
    )
}

async fn list_transactions(state: &AppState, user_id: i32) -> HttpResponse {
    let rows = match sqlx::query(
        "SELECT id, user_id, amount::float8 AS amount, type, description, created_at
         FROM transactions
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT 50",
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let transactions: Vec<Transaction> = rows.iter().map(transaction_from_row).collect();
    json_response(StatusCode::OK, json!({ "transactions": transactions }))
}

async fn handle_deposit(state: &AppState, body: &web::Bytes) -> HttpResponse {
    let body_json: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "user_id and amount are required"),
    };

    let payload: DepositRequest = match serde_json::from_value(body_json) {
        Ok(p) => p,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "user_id and amount are required"),
    };

    if payload.amount <= 0.0 {
        return error_response(StatusCode::BAD_REQUEST, "Amount must be positive");
    }

    let row = match sqlx::query(
        "UPDATE users SET balance = balance + $1::numeric
         WHERE id = $2
         RETURNING balance::float8 AS balance",
    )
    .bind(payload.amount)
    .bind(payload.user_id)
    .fetch_optional(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let Some(row) = row else {
        return error_response(StatusCode::NOT_FOUND, "User not found");
    };

    let description = payload
        .description
        .unwrap_or_else(|| "Пополнение баланса".to_string());

    let tx_row = match sqlx::query(
        "INSERT INTO transactions (user_id, amount, type, description)
         VALUES ($1, $2::numeric, 'deposit', $3)
         RETURNING id",
    )
    .bind(payload.user_id)
    .bind(payload.amount)
    .bind(&description)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    json_response(
        StatusCode::OK,
        json!({
            "success": true,
            "new_balance": row.get::<f64, _>("balance"),
            "transaction_id": tx_row.get::<i32, _>("id")
        }),
    )
}
