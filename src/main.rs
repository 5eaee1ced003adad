#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use passrs::{
    handlers::{begin_login, begin_registration, finish_login, finish_registration, health},
    models::UserStore,
    settings::PassrsSettings,
    webauthn::SessionStore,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = PassrsSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    start_server(settings).await
}

/// Start the server with shared in-memory stores
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: PassrsSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let users = web::Data::new(UserStore::new());
    let sessions = web::Data::new(SessionStore::new(Duration::from_secs(
        settings.session.ceremony_ttl_seconds,
    )));

    // Configure CORS for SPAs
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(users.clone())
            .app_data(sessions.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Passkey ceremony endpoints
        .route(
            "/passkeys/register/options",
            web::post().to(begin_registration),
        )
        .route(
            "/passkeys/register/finish",
            web::post().to(finish_registration),
        )
        .route("/passkeys/login/options", web::post().to(begin_login))
        .route("/passkeys/login/finish", web::post().to(finish_login))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &PassrsSettings) {
    println!("Starting Passrs passkey service on http://{bind_address}");
    println!();
    println!("Passkey endpoints:");
    println!("  POST /passkeys/register/options - Start passkey registration");
    println!("  POST /passkeys/register/finish  - Complete passkey registration");
    println!("  POST /passkeys/login/options    - Start passkey login");
    println!("  POST /passkeys/login/finish     - Complete passkey login");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
    println!();
    println!(
        "Ceremony session TTL: {}s",
        settings.session.ceremony_ttl_seconds
    );
}
