// src/session.rs
//
// Сессии: непрозрачный токен в БД, срок жизни фиксирован при создании.
// Logout нет, сессия умирает только по expires_at.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::{PgPool, Row};

/// Срок жизни сессии, выданной ботом по /login.
pub const LOGIN_TTL_DAYS: i64 = 30;

/// 32 случайных байта, URL-safe base64 без набивки (43 символа).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Создаёт сессию и возвращает токен. Коллизии токенов не обрабатываются.
pub async fn create_session(
    pool: &PgPool,
    user_id: i32,
    ttl: Duration,
) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let expires_at = Utc::now() + ttl;

    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Владелец токена, если тот существует и не истёк. Просроченный или
/// неизвестный токен = аноним (None), а не ошибка.
pub async fn resolve_session(pool: &PgPool, token: &str) -> Result<Option<i32>, sqlx::Error> {
    let row = sqlx::query("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > NOW()")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("user_id")))
}
