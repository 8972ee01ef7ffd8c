// src/db.rs

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{Product, User};

// balance хранится как NUMERIC; в SQL всегда кастуем к float8,
// чтобы декодирование не зависело от decimal-крейтов.
const USER_COLUMNS: &str =
    "id, username, email, balance::float8 AS balance, status, telegram_chat_id, created_at";

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        balance: row.get("balance"),
        status: row.get("status"),
        telegram_chat_id: row.get("telegram_chat_id"),
        created_at: row.get("created_at"),
    }
}

fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        title: row.get("title"),
        price: row.get("price"),
        description: row.get("description"),
        icon: row.get("icon"),
        gradient: row.get("gradient"),
        created_at: row.get("created_at"),
    }
}

pub async fn get_user(pool: &PgPool, user_id: i32) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn find_user_by_chat(pool: &PgPool, chat_id: i64) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE telegram_chat_id = $1"
    ))
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(user_from_row).collect())
}

pub async fn get_product(pool: &PgPool, product_id: i32) -> Result<Option<Product>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, title, price, description, icon, gradient, created_at
         FROM products
         WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(product_from_row))
}
