// src/api/yookassa.rs
//
// Клиент ЮKassa API v3 (https://api.yookassa.ru).
// Авторизация: basic auth shopId/secretKey, ключ идемпотентности на каждый вызов.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const YOOKASSA_API_BASE: &str = "https://api.yookassa.ru/v3";

#[derive(Debug)]
pub enum YooKassaError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for YooKassaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YooKassaError::Http(e) => write!(f, "http error: {e}"),
            YooKassaError::Api { status, body } => {
                write!(f, "yookassa api error status={status} body={body}")
            }
            YooKassaError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for YooKassaError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub struct PaymentParams<'a> {
    pub amount: f64,
    pub order_id: i32,
    pub description: &'a str,
    pub return_url: &'a str,
}

#[derive(Debug, Serialize)]
struct AmountPayload {
    value: String,
    currency: &'static str,
}

#[derive(Debug, Serialize)]
struct ConfirmationPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    return_url: &'a str,
}

#[derive(Debug, Serialize)]
struct MetadataPayload {
    order_id: i32,
}

#[derive(Debug, Serialize)]
struct CreatePaymentBody<'a> {
    amount: AmountPayload,
    capture: bool,
    confirmation: ConfirmationPayload<'a>,
    description: &'a str,
    metadata: MetadataPayload,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationDetails {
    pub confirmation_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPayment {
    pub id: String,
    pub status: String,
    pub confirmation: Option<ConfirmationDetails>,
}

/// Создаёт платёж с немедленным списанием (capture) и redirect-подтверждением.
///
/// Ключ идемпотентности генерируется заново на каждый вызов: повторный вызов
/// создаёт на стороне провайдера новый платёж, а не дедуплицируется.
pub async fn create_payment(
    shop_id: &str,
    secret_key: &str,
    params: PaymentParams<'_>,
) -> Result<CreatedPayment, YooKassaError> {
    let body = CreatePaymentBody {
        amount: AmountPayload {
            value: format!("{:.2}", params.amount),
            currency: "RUB",
        },
        capture: true,
        confirmation: ConfirmationPayload {
            kind: "redirect",
            return_url: params.return_url,
        },
        description: params.description,
        metadata: MetadataPayload {
            order_id: params.order_id,
        },
    };

    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{YOOKASSA_API_BASE}/payments"))
        .basic_auth(shop_id, Some(secret_key))
        .header("Idempotence-Key", Uuid::new_v4().to_string())
        .json(&body)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(YooKassaError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<CreatedPayment>(&body)
        .map_err(|e| YooKassaError::InvalidResponse(format!("{e}; body={body}")))
}
