use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::mail_dispatch::{MailDispatcher, UnsubscribeLinkBuilder};
use crate::routes::{
    handle_one_click_unsubscribe, handle_unsubscribe, handle_unsubscribe_page,
    handle_welcome_email, health_check, publish_newsletter,
};
use crate::unsubscribe_token::TokenCodec;

const DB_ACQUIRE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

pub struct Application {
    pub port: u16,
    pub server: Server,
}

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("Failed to connect to the database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Sender email is not valid: {0}")]
    InvalidSender(String),
    #[error("Failed to build the email client: {0}")]
    EmailClient(#[from] reqwest::Error),
    #[error("Failed to start the HTTP server: {0}")]
    Io(#[from] std::io::Error),
}

impl Application {
    /// Connects to the database before binding anything, so a bad database
    /// configuration stops the process here rather than on the first request.
    pub async fn build(config: Settings) -> Result<Self, StartupError> {
        let db_pool = PgPoolOptions::new()
            .acquire_timeout(DB_ACQUIRE_TIMEOUT)
            .connect_with(config.get_db_options())
            .await?;
        let sender_email = config
            .get_email_client_sender()
            .map_err(StartupError::InvalidSender)?;
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            Some(config.get_email_client_timeout()),
        )?;
        let token_codec = TokenCodec::new(config.get_signing_secret());
        let mail_dispatcher = MailDispatcher::new(
            email_client,
            UnsubscribeLinkBuilder::new(&config.get_app_base_url(), token_codec.clone()),
        );

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db_pool, token_codec, mail_dispatcher)?;

        tracing::info!("Server listening on {}", config.get_address());

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    token_codec: TokenCodec,
    mail_dispatcher: MailDispatcher,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let token_codec = web::Data::new(token_codec);
    let mail_dispatcher = web::Data::new(mail_dispatcher);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/unsubscribe", web::get().to(handle_unsubscribe_page))
            .route("/unsubscribe-api", web::get().to(handle_unsubscribe))
            .route("/unsubscribe-api", web::post().to(handle_one_click_unsubscribe))
            .route("/newsletters", web::post().to(publish_newsletter))
            .route("/welcome_emails", web::post().to(handle_welcome_email))
            .app_data(db_pool.clone())
            .app_data(token_codec.clone())
            .app_data(mail_dispatcher.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect_lazy_with(config.get_db_options())
}
