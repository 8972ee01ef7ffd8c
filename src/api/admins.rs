// src/api/admins.rs
//
// Управление администраторами: список, создание, активация, удаление,
// тумблер сайта и журнал входов.

use actix_web::http::{Method, StatusCode};
use actix_web::{route, web, HttpRequest, HttpResponse};
use bcrypt::{hash, DEFAULT_COST};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::api::{error_response, json_response, preflight, query_map};
use crate::models::{Admin, AuthLog};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_by: Option<i32>,
}

fn admin_from_row(row: &PgRow) -> Admin {
    Admin {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role: row.get("role"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[utoipa::path(
    get,
    path = "/admins",
    tag = "admins",
    responses(
        (status = 200, description = "Admin listing, site status or auth logs"),
        (status = 409, description = "Username already exists (POST)")
    )
)]
#[route(
    "/admins",
    method = "GET",
    method = "POST",
    method = "PUT",
    method = "DELETE",
    method = "OPTIONS"
)]
pub async fn admins_gateway(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let method = req.method().clone();
    if method == Method::OPTIONS {
        preflight(
            "GET, POST, PUT, DELETE, OPTIONS",
            "Content-Type, X-Admin-Token",
        )
    } else if method == Method::GET {
        handle_get(&req, &state).await
    } else if method == Method::POST {
        handle_create(&state, &body).await
    } else if method == Method::PUT {
        handle_update(&state, &body).await
    } else if method == Method::DELETE {
        handle_delete(&req, &state).await
    } else {
        error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }
}

async fn handle_get(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let query: HashMap<String, String> = query_map(req);

    match query.get("action").map(String::as_str).unwrap_or("admins") {
        "site_status" => site_status(state).await,
        "logs" => {
            let limit = query
                .get("limit")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(100);
            list_logs(state, limit).await
        }
        _ => list_admins(state).await,
    }
}

async fn site_status(state: &AppState) -> HttpResponse {
    let row = match sqlx::query("SELECT site_enabled FROM admins LIMIT 1")
        .fetch_optional(&state.pool)
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    // без единого админа сайт считается включённым
    let site_enabled = row.map_or(true, |r| r.get("site_enabled"));
    json_response(StatusCode::OK, json!({ "site_enabled": site_enabled }))
}

async fn list_logs(state: &AppState, limit: i64) -> HttpResponse {
    let rows = match sqlx::query(
        "SELECT id, user_id, username, action, ip_address, user_agent, status, created_at
         FROM auth_logs
         ORDER BY created_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let logs: Vec<AuthLog> = rows
        .iter()
        .map(|row| AuthLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            username: row.get("username"),
            action: row.get("action"),
            ip_address: row.get("ip_address"),
            user_agent: row.get("user_agent"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        })
        .collect();

    json_response(StatusCode::OK, json!({ "logs": logs }))
}

async fn list_admins(state: &AppState) -> HttpResponse {
    let rows = match sqlx::query(
        "SELECT id, username, email, role, is_active, created_at
         FROM admins
         ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let admins: Vec<Admin> = rows.iter().map(admin_from_row).collect();
    json_response(StatusCode::OK, json!({ "admins": admins }))
}

async fn handle_create(state: &AppState, body: &web::Bytes) -> HttpResponse {
    let payload: CreateAdminRequest = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "username and password are required",
            )
        }
    };

    if payload.username.is_empty() || payload.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "username and password are required",
        );
    }

    let password_hash = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("bcrypt hash error: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "password hashing failed");
        }
    };

    let role = payload.role.unwrap_or_else(|| "admin".to_string());

    let row = match sqlx::query(
        "INSERT INTO admins (username, password_hash, email, role, created_by)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, username, email, role, is_active, created_at",
    )
    .bind(&payload.username)
    .bind(&password_hash)
    .bind(payload.email.as_deref())
    .bind(&role)
    .bind(payload.created_by)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) if is_unique_violation(&e) => {
            return error_response(StatusCode::CONFLICT, "Username already exists")
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    json_response(
        StatusCode::CREATED,
        json!({ "success": true, "admin": admin_from_row(&row) }),
    )
}

#[derive(Debug, Deserialize)]
struct ToggleSiteRequest {
    #[serde(default = "default_site_enabled")]
    site_enabled: bool,
}

fn default_site_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct UpdateAdminRequest {
    id: i32,
    is_active: bool,
}

async fn handle_update(state: &AppState, body: &web::Bytes) -> HttpResponse {
    let body_json: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"),
    };

    if body_json.get("action").and_then(Value::as_str) == Some("toggle_site") {
        let payload: ToggleSiteRequest =
            serde_json::from_value(body_json).unwrap_or(ToggleSiteRequest { site_enabled: true });

        // флаг общий для всех строк админов
        if let Err(e) = sqlx::query("UPDATE admins SET site_enabled = $1")
            .bind(payload.site_enabled)
            .execute(&state.pool)
            .await
        {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }

        return json_response(
            StatusCode::OK,
            json!({ "success": true, "site_enabled": payload.site_enabled }),
        );
    }

    let payload: UpdateAdminRequest = match serde_json::from_value(body_json) {
        Ok(p) => p,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "id is required"),
    };

    let row = match sqlx::query("UPDATE admins SET is_active = $1 WHERE id = $2 RETURNING id")
        .bind(payload.is_active)
        .bind(payload.id)
        .fetch_optional(&state.pool)
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    if row.is_none() {
        return error_response(StatusCode::NOT_FOUND, "Admin not found");
    }

    json_response(StatusCode::OK, json!({ "success": true }))
}

async fn handle_delete(req: &HttpRequest, state: &AppState) -> HttpResponse {
    let query: HashMap<String, String> = query_map(req);

    let Some(raw_id) = query.get("id") else {
        return error_response(StatusCode::BAD_REQUEST, "id is required");
    };

    let Ok(admin_id) = raw_id.parse::<i32>() else {
        return error_response(StatusCode::BAD_REQUEST, "id is required");
    };

    let row = match sqlx::query("DELETE FROM admins WHERE id = $1 RETURNING id")
        .bind(admin_id)
        .fetch_optional(&state.pool)
        .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    if row.is_none() {
        return error_response(StatusCode::NOT_FOUND, "Admin not found");
    }

    json_response(StatusCode::OK, json!({ "success": true }))
}
