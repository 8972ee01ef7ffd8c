// src/api/users.rs
//
// Единая точка входа витрины. Один маршрут принимает вебхук бота, обмен
// токена, оплату, callback провайдера, тикеты и админские правки: запрос
// классифицируется по форме тела и дискриминатору action, каждая ветка
// сама решает вопрос аутентификации.

use actix_web::http::{Method, StatusCode};
use actix_web::{route, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::Row;
use std::collections::HashMap;

use crate::api::{
    bot, client_token, error_response, json_response, payments, preflight, support, webhooks,
};
use crate::{db, session, AppState};

/// Закрытый перечень видов запросов; порядок проверок в classify фиксирован.
#[derive(Debug, PartialEq, Eq)]
pub enum RequestKind {
    BotUpdate,
    AuthExchange,
    InitiatePayment,
    PaymentCallback,
    Support,
    ListUsers,
    AdminMutation,
    Unroutable,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminMutation {
    AddBalance {
        user_id: i32,
        amount: f64,
        #[serde(default)]
        description: Option<String>,
    },
    UpdateStatus {
        user_id: i32,
        status: String,
    },
}

fn looks_like_bot_update(body: &Value) -> bool {
    body.get("message")
        .map_or(false, |m| m.get("chat").is_some())
}

fn looks_like_payment_event(body: &Value) -> bool {
    body.get("event").is_some() && body.get("object").is_some()
}

pub fn classify(method: &Method, action: Option<&str>, body: &Value) -> RequestKind {
    if looks_like_bot_update(body) {
        RequestKind::BotUpdate
    } else if action == Some("auth") {
        RequestKind::AuthExchange
    } else if action == Some("payment") {
        RequestKind::InitiatePayment
    } else if looks_like_payment_event(body) {
        RequestKind::PaymentCallback
    } else if action == Some("support") {
        RequestKind::Support
    } else if *method == Method::GET {
        RequestKind::ListUsers
    } else if *method == Method::POST
        && matches!(action, Some("add_balance") | Some("update_status"))
    {
        RequestKind::AdminMutation
    } else {
        RequestKind::Unroutable
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "storefront",
    responses(
        (status = 200, description = "Request dispatched by action/body shape"),
        (status = 401, description = "Missing or expired session token"),
        (status = 405, description = "Unroutable method/action combination")
    )
)]
#[route("/users", method = "GET", method = "POST", method = "OPTIONS")]
pub async fn users_gateway(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    if *req.method() == Method::OPTIONS {
        return preflight("GET, POST, OPTIONS", "Content-Type, X-Auth-Token");
    }

    let query = crate::api::query_map(&req);

    let body_json: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
        }
    };

    let action = query
        .get("action")
        .map(String::as_str)
        .or_else(|| body_json.get("action").and_then(Value::as_str));

    match classify(req.method(), action, &body_json) {
        RequestKind::BotUpdate => match serde_json::from_value(body_json.clone()) {
            Ok(update) => bot::handle_update(&state, update).await,
            Err(_) => error_response(StatusCode::BAD_REQUEST, "Malformed bot update"),
        },
        RequestKind::AuthExchange => auth_exchange(&req, &state, &query).await,
        RequestKind::InitiatePayment => {
            payments::initiate_payment(&req, &state, &query, &body_json).await
        }
        RequestKind::PaymentCallback => match serde_json::from_value(body_json.clone()) {
            Ok(event) => webhooks::complete_payment(&state, event).await,
            Err(_) => error_response(StatusCode::BAD_REQUEST, "Malformed payment event"),
        },
        RequestKind::Support => support::dispatch(&req, &state, &query, &body_json).await,
        RequestKind::ListUsers => list_users(&state).await,
        RequestKind::AdminMutation => {
            // action мог прийти query-параметром; тег для enum-а должен быть в теле
            let mut payload = body_json.clone();
            if let (Some(obj), Some(action)) = (payload.as_object_mut(), action) {
                obj.entry("action")
                    .or_insert_with(|| Value::String(action.to_string()));
            }
            match serde_json::from_value(payload) {
                Ok(mutation) => apply_admin_mutation(&state, mutation).await,
                Err(_) => error_response(StatusCode::BAD_REQUEST, "Invalid action payload"),
            }
        }
        RequestKind::Unroutable => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
    }
}

/// Обмен токена сессии на профиль пользователя.
async fn auth_exchange(
    req: &HttpRequest,
    state: &AppState,
    query: &HashMap<String, String>,
) -> HttpResponse {
    let ip_address = req.peer_addr().map(|a| a.ip().to_string());
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let resolved = match client_token(req, query) {
        Some(token) => match session::resolve_session(&state.pool, &token).await {
            Ok(resolved) => resolved,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        None => None,
    };

    let Some(user_id) = resolved else {
        log_auth_attempt(state, None, None, &ip_address, &user_agent, "failed").await;
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token");
    };

    let user = match db::get_user(&state.pool, user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            // сессия пережила пользователя, трактуем как просроченный токен
            return error_response(StatusCode::UNAUTHORIZED, "Invalid or expired token");
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    log_auth_attempt(
        state,
        Some(user.id),
        Some(user.username.clone()),
        &ip_address,
        &user_agent,
        "success",
    )
    .await;

    json_response(StatusCode::OK, user)
}

// Журнал входов смотрит админка; сбой записи не должен ломать сам вход.
async fn log_auth_attempt(
    state: &AppState,
    user_id: Option<i32>,
    username: Option<String>,
    ip_address: &Option<String>,
    user_agent: &Option<String>,
    status: &str,
) {
    let result = sqlx::query(
        "INSERT INTO auth_logs (user_id, username, action, ip_address, user_agent, status)
         VALUES ($1, $2, 'token_auth', $3, $4, $5)",
    )
    .bind(user_id)
    .bind(username)
    .bind(ip_address.as_deref())
    .bind(user_agent.as_deref())
    .bind(status)
    .execute(&state.pool)
    .await;

    if let Err(e) = result {
        log::warn!("auth_logs insert failed: {e}");
    }
}

async fn list_users(state: &AppState) -> HttpResponse {
    match db::list_users(&state.pool).await {
        Ok(users) => json_response(StatusCode::OK, users),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Правки из админки: пополнение баланса и смена статуса пользователя.
async fn apply_admin_mutation(state: &AppState, mutation: AdminMutation) -> HttpResponse {
    match mutation {
        AdminMutation::AddBalance {
            user_id,
            amount,
            description,
        } => {
            let row = match sqlx::query(
                "UPDATE users SET balance = balance + $1::numeric
                 WHERE id = $2
                 RETURNING id, balance::float8 AS balance",
            )
            .bind(amount)
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

            let description = description.unwrap_or_else(|| "Пополнение баланса".to_string());

            if let Err(e) = sqlx::query(
                "INSERT INTO transactions (user_id, amount, type, description)
                 VALUES ($1, $2::numeric, 'deposit', $3)",
            )
            .bind(user_id)
            .bind(amount)
            .bind(&description)
            .execute(&state.pool)
            .await
            {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
            }

            let new_balance: f64 = row.get("balance");
            json_response(
                StatusCode::OK,
                json!({ "success": true, "user_id": user_id, "new_balance": new_balance }),
            )
        }
        AdminMutation::UpdateStatus { user_id, status } => {
            let row = match sqlx::query(
                "UPDATE users SET status = $1 WHERE id = $2 RETURNING id, status",
            )
            .bind(&status)
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await
            {
                Ok(r) => r,
                Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            };

            if row.is_none() {
                return error_response(StatusCode::NOT_FOUND, "User not found");
            }

            json_response(
                StatusCode::OK,
                json!({ "success": true, "user_id": user_id, "status": status }),
            )
        }
    }
}
