// src/api/telegram.rs
//
// Минимальный клиент Bot API: только sendMessage.
// Доставка best-effort, вызывающий сам решает, что делать с ошибкой.

use serde_json::json;
use std::fmt;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug)]
pub enum TelegramError {
    /// Токен бота не задан, исходящие сообщения отключены.
    NotConfigured,
    Http(reqwest::Error),
    Api { status: u16, body: String },
}

impl fmt::Display for TelegramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelegramError::NotConfigured => write!(f, "bot token is not configured"),
            TelegramError::Http(e) => write!(f, "http error: {e}"),
            TelegramError::Api { status, body } => {
                write!(f, "telegram api error status={status} body={body}")
            }
        }
    }
}

impl From<reqwest::Error> for TelegramError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub async fn send_message(
    bot_token: &str,
    chat_id: i64,
    text: &str,
) -> Result<(), TelegramError> {
    if bot_token.is_empty() {
        return Err(TelegramError::NotConfigured);
    }

    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{TELEGRAM_API_BASE}/bot{bot_token}/sendMessage"))
        .json(&json!({ "chat_id": chat_id, "text": text }))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TelegramError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
