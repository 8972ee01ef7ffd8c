// src/api/payments.rs

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::Row;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::api::{client_token, error_response, json_response, yookassa};
use crate::{db, session, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub product_id: i32,
}

/// Числовое значение цены из отображаемой строки: рублёвый знак и пробелы
/// (включая неразрывные) отбрасываются, остальное парсится как число.
pub fn parse_price(display: &str) -> Result<f64, std::num::ParseFloatError> {
    let cleaned: String = display
        .chars()
        .filter(|c| *c != '₽' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>()
}

/// Оформление покупки: заказ создаётся всегда, платёж - только если
/// подключена ЮKassa. Заказ и платёж пишутся двумя отдельными стейтментами;
/// отказ провайдера между ними оставляет заказ в pending без платежа.
pub async fn initiate_payment(
    req: &HttpRequest,
    state: &AppState,
    query: &HashMap<String, String>,
    body: &Value,
) -> HttpResponse {
    let token = client_token(req, query);
    let user_id = match token {
        Some(token) => match session::resolve_session(&state.pool, &token).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                return error_response(StatusCode::UNAUTHORIZED, "Authentication required")
            }
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        None => return error_response(StatusCode::UNAUTHORIZED, "Authentication required"),
    };

    let payload: InitiatePaymentRequest = match serde_json::from_value(body.clone()) {
        Ok(p) => p,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "product_id is required"),
    };

    let product = match db::get_product(&state.pool, payload.product_id).await {
        Ok(Some(p)) => p,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Product not found"),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let amount = match parse_price(&product.price) {
        Ok(a) => a,
        Err(e) => {
            // кривая цена в каталоге - это баг данных, не ветка бизнес-логики
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("invalid price for product {}: {e}", product.id),
            );
        }
    };

    let delivery_info = format!("Выдача товара: {}", product.title);

    let order_row = match sqlx::query(
        "INSERT INTO orders (user_id, product_id, status, delivery_status, delivery_info)
         VALUES ($1, $2, 'pending', 'pending', $3)
         RETURNING id",
    )
    .bind(user_id)
    .bind(product.id)
    .bind(&delivery_info)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let order_id: i32 = order_row.get("id");

    if !state.config.payment_configured() {
        log::warn!("payment provider not configured; order {order_id} left pending");
        return json_response(
            StatusCode::OK,
            json!({ "order_id": order_id, "amount": amount }),
        );
    }

    let description = format!("Заказ №{}: {}", order_id, product.title);
    let return_url = format!("{}/profile", state.config.site_base_url);

    let created = match yookassa::create_payment(
        &state.config.yookassa_shop_id,
        &state.config.yookassa_secret_key,
        yookassa::PaymentParams {
            amount,
            order_id,
            description: &description,
            return_url: &return_url,
        },
    )
    .await
    {
        Ok(c) => c,
        Err(e) => {
            // заказ уже закоммичен; он останется pending без платежа
            log::error!("yookassa create_payment failed order_id={order_id}: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    if let Err(e) = sqlx::query(
        "INSERT INTO payments (order_id, amount, provider_payment_id, payment_status)
         VALUES ($1, $2::numeric, $3, 'pending')",
    )
    .bind(order_id)
    .bind(amount)
    .bind(&created.id)
    .execute(&state.pool)
    .await
    {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }

    let payment_url = created
        .confirmation
        .and_then(|c| c.confirmation_url)
        .unwrap_or_default();

    json_response(
        StatusCode::OK,
        json!({
            "payment_url": payment_url,
            "order_id": order_id,
            "amount": amount
        }),
    )
}
