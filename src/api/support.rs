// src/api/support.rs

use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::api::{client_token, error_response, json_response};
use crate::models::SupportTicket;
use crate::{session, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default)]
    pub priority: Option<String>,
}

fn ticket_from_row(row: &PgRow) -> SupportTicket {
    SupportTicket {
        id: row.get("id"),
        user_id: row.get("user_id"),
        subject: row.get("subject"),
        priority: row.get("priority"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// GET = список своих тикетов, POST = создать. Оба требуют сессию.
pub async fn dispatch(
    req: &HttpRequest,
    state: &AppState,
    query: &HashMap<String, String>,
    body: &Value,
) -> HttpResponse {
    let user_id = match authenticate(req, state, query).await {
        Ok(user_id) => user_id,
        Err(resp) => return resp,
    };

    let method = req.method();
    if *method == Method::GET {
        list_tickets(state, user_id).await
    } else if *method == Method::POST {
        create_ticket(state, user_id, body).await
    } else {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

async fn authenticate(
    req: &HttpRequest,
    state: &AppState,
    query: &HashMap<String, String>,
) -> Result<i32, HttpResponse> {
    let Some(token) = client_token(req, query) else {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
        ));
    };

    match session::resolve_session(&state.pool, &token).await {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        )),
    }
}

async fn list_tickets(state: &AppState, user_id: i32) -> HttpResponse {
    let rows = match sqlx::query(
        "SELECT id, user_id, subject, priority, status, created_at, updated_at
         FROM support_tickets
         WHERE user_id = $1
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let tickets: Vec<SupportTicket> = rows.iter().map(ticket_from_row).collect();
    json_response(StatusCode::OK, json!({ "tickets": tickets }))
}

async fn create_ticket(state: &AppState, user_id: i32, body: &Value) -> HttpResponse {
    let payload: CreateTicketRequest = match serde_json::from_value(body.clone()) {
        Ok(p) => p,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "subject is required"),
    };

    if payload.subject.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "subject is required");
    }

    let priority = payload.priority.unwrap_or_else(|| "normal".to_string());

    let row = match sqlx::query(
        "INSERT INTO support_tickets (user_id, subject, priority)
         VALUES ($1, $2, $3)
         RETURNING id, user_id, subject, priority, status, created_at, updated_at",
    )
    .bind(user_id)
    .bind(payload.subject.trim())
    .bind(&priority)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    json_response(
        StatusCode::CREATED,
        json!({ "success": true, "ticket": ticket_from_row(&row) }),
    )
}
