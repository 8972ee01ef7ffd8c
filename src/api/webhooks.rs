// src/api/webhooks.rs
//
// Callback ЮKassa о статусе платежа. Подпись не проверяется: событию
// доверяем целиком, как и фронтовой части провайдера.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{error_response, json_response};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub event: String,
    pub object: PaymentObject,
}

#[derive(Debug, Deserialize)]
pub struct PaymentObject {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMetadata {
    // ЮKassa возвращает metadata строками, но старые платежи несли число
    #[serde(default)]
    pub order_id: Option<Value>,
}

pub fn metadata_order_id(metadata: &PaymentMetadata) -> Option<i32> {
    match metadata.order_id.as_ref()? {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// Переводит заказ в completed/delivered, платёж - в completed.
/// Повторная доставка того же события оставляет конечное состояние прежним.
pub async fn complete_payment(state: &AppState, event: PaymentEvent) -> HttpResponse {
    if event.event != "payment.succeeded" {
        return json_response(StatusCode::OK, json!({ "ok": true, "ignored": true }));
    }

    let order_id = match event.object.metadata.as_ref().and_then(metadata_order_id) {
        Some(id) => id,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "order_id missing in payment metadata",
            )
        }
    };

    if let Err(e) = sqlx::query(
        "UPDATE orders
         SET status = 'completed', delivery_status = 'delivered', delivered_at = NOW()
         WHERE id = $1",
    )
    .bind(order_id)
    .execute(&state.pool)
    .await
    {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }

    if let Err(e) = sqlx::query(
        "UPDATE payments
         SET payment_status = 'completed', completed_at = NOW(), provider_payment_id = $2
         WHERE order_id = $1",
    )
    .bind(order_id)
    .bind(&event.object.id)
    .execute(&state.pool)
    .await
    {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }

    log::info!(
        "payment completed order_id={order_id} provider_payment_id={}",
        event.object.id
    );

    json_response(StatusCode::OK, json!({ "success": true }))
}
