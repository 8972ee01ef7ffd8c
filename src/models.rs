// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub balance: f64,
    pub status: String,
    pub telegram_chat_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Product {
    pub id: i32,
    pub title: String,
    /// Отображаемая цена, например "500₽". Число извлекается при оплате.
    pub price: String,
    pub description: Option<String>,
    pub icon: String,
    pub gradient: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub product_id: i32,
    pub status: String, // pending | completed
    pub delivery_status: String,
    pub delivery_info: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub amount: f64,
    pub provider_payment_id: Option<String>,
    pub payment_status: String, // pending | completed
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SupportTicket {
    pub id: i32,
    pub user_id: i32,
    pub subject: String,
    pub priority: String,
    pub status: String, // open | closed
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: String, // deposit | purchase
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Admin {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AuthLog {
    pub id: i32,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub action: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
