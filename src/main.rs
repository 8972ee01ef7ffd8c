// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gameshop_api::{api, docs, AppState, Config};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Shop API ready")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let config = Config {
        bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
        site_base_url: env::var("SITE_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        yookassa_shop_id: env::var("YOOKASSA_SHOP_ID").unwrap_or_default(),
        yookassa_secret_key: env::var("YOOKASSA_SECRET_KEY").unwrap_or_default(),
    };

    if config.bot_token.is_empty() {
        log::warn!("TELEGRAM_BOT_TOKEN is not set; bot replies will be skipped");
    }
    if !config.payment_configured() {
        log::warn!("YooKassa credentials are not set; orders will be created without payments");
    }

    let state = web::Data::new(AppState { pool, config });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .service(api::users::users_gateway)
            .service(api::balance::balance_gateway)
            .service(api::admins::admins_gateway)
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}
