#[macro_use] extern crate rocket;

use anyhow::anyhow;
use log::info;
use rocket::http::Method;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};

mod config;
mod db;
mod error;
mod models;
mod store;
mod validation;
mod routes {
    pub mod features;
    pub mod products;
    pub mod reviews;
}

use crate::config::AppConfig;
use crate::db::AppState;
use crate::models::Message;

#[get("/")]
fn home() -> &'static str {
    "BACKEND API PRODUCTS !"
}

#[get("/health")]
fn health() -> &'static str {
    "ok"
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> Json<Message> {
    Json(Message::new(format!("No route for {} {}", req.method(), req.uri())))
}

#[catch(500)]
fn internal_error() -> Json<Message> {
    Json(Message::new("Internal server error"))
}

// Open CORS, same as the frontend dev setup expects.
fn cors() -> Result<rocket_cors::Cors, rocket_cors::Error> {
    CorsOptions {
        allowed_origins: AllowedOrigins::all(),
        allowed_methods: vec![
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Patch,
            Method::Options,
        ]
        .into_iter()
        .map(From::from)
        .collect(),
        allowed_headers: AllowedHeaders::some(&["Content-Type", "Accept", "Authorization"]),
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()
}

/// Mounts every route and catcher on `rocket` with `state` as managed state.
pub fn mount(rocket: Rocket<Build>, state: AppState) -> Rocket<Build> {
    rocket
        .manage(state)
        .mount("/", routes![home, health])
        .mount("/product", routes::products::routes())
        .mount("/review", routes::reviews::routes())
        .mount("/feature", routes::features::routes())
        .register("/", catchers![not_found, internal_error])
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();

    // building first installs rocket's logger, so startup logs are visible
    let figment = rocket::Config::figment().merge(("port", cfg.port));
    let rocket = rocket::custom(figment);

    let state = db::init_state(&cfg).await?;
    let cors = cors().map_err(|e| anyhow!("error building CORS: {e}"))?;

    info!("serving products API on port {}", cfg.port);
    mount(rocket, state)
        .attach(cors)
        .launch()
        .await
        .map_err(|e| anyhow!("rocket failed: {e}"))?;
    Ok(())
}
