pub mod api;
pub mod db;
pub mod docs;
pub mod models;
pub mod session;

use sqlx::PgPool;

/// Внешние интеграции и адреса. Собирается один раз в main из окружения.
#[derive(Debug, Clone)]
pub struct Config {
    /// Токен Telegram-бота. Пустая строка = исходящие сообщения отключены.
    pub bot_token: String,
    /// Базовый URL сайта (ссылки для входа, возврат после оплаты).
    pub site_base_url: String,
    pub yookassa_shop_id: String,
    pub yookassa_secret_key: String,
}

impl Config {
    /// Провайдер оплаты подключён только при непустых кредах магазина.
    pub fn payment_configured(&self) -> bool {
        !self.yookassa_shop_id.is_empty() && !self.yookassa_secret_key.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}
