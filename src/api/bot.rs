// src/api/bot.rs
//
// Вебхук Telegram-бота: регистрация (/start) и вход на сайт (/login).
// Любая ветка отвечает платформе 200 {"ok": true}, даже если отправка
// ответного сообщения не удалась.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use sqlx::Row;

use crate::api::{error_response, json_response, telegram};
use crate::{db, session, AppState};

const HELP_TEXT: &str = "Доступные команды:\n/start - регистрация в магазине\n/login - ссылка для входа на сайт";

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub from: Option<TelegramUser>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

fn ack() -> HttpResponse {
    json_response(StatusCode::OK, json!({ "ok": true }))
}

pub async fn handle_update(state: &AppState, update: TelegramUpdate) -> HttpResponse {
    let Some(message) = update.message else {
        // edited_message, callback_query и прочее нас не интересуют
        return ack();
    };

    let chat_id = message.chat.id;
    let text = message.text.as_deref().unwrap_or("").trim();

    let reply = if text.starts_with("/start") {
        match handle_start(state, chat_id, message.from.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    } else if text.starts_with("/login") {
        match handle_login(state, chat_id).await {
            Ok(reply) => reply,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        }
    } else {
        HELP_TEXT.to_string()
    };

    if let Err(e) = telegram::send_message(&state.config.bot_token, chat_id, &reply).await {
        log::warn!("telegram send_message failed chat_id={chat_id}: {e}");
    }

    ack()
}

/// /start идемпотентен: повторный вызов находит уже созданного пользователя.
async fn handle_start(
    state: &AppState,
    chat_id: i64,
    from: Option<&TelegramUser>,
) -> Result<String, sqlx::Error> {
    if let Some(user) = db::find_user_by_chat(&state.pool, chat_id).await? {
        return Ok(format!("Вы уже зарегистрированы. Ваш ID: {}", user.id));
    }

    let username = from
        .and_then(|f| f.username.clone())
        .unwrap_or_else(|| format!("user_{chat_id}"));
    let email = format!("tg_{chat_id}@telegram.local");

    let row = sqlx::query(
        "INSERT INTO users (username, email, telegram_chat_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(chat_id)
    .fetch_one(&state.pool)
    .await?;

    let user_id: i32 = row.get("id");

    let greeting = from
        .and_then(|f| f.first_name.as_deref())
        .map(|name| format!(", {name}"))
        .unwrap_or_default();

    Ok(format!(
        "Добро пожаловать{greeting}! Ваш ID: {user_id}"
    ))
}

/// /login не идемпотентен: каждый вызов выпускает новую сессию.
async fn handle_login(state: &AppState, chat_id: i64) -> Result<String, sqlx::Error> {
    let Some(user) = db::find_user_by_chat(&state.pool, chat_id).await? else {
        return Ok("Вы не зарегистрированы. Отправьте /start".to_string());
    };

    let token = session::create_session(
        &state.pool,
        user.id,
        Duration::days(session::LOGIN_TTL_DAYS),
    )
    .await?;

    Ok(format!(
        "Ссылка для входа: {}/auth?token={}",
        state.config.site_base_url, token
    ))
}
