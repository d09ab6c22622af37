pub mod config;
pub mod domain;
pub mod email_client;
pub mod email_templates;
pub mod mail_dispatch;
pub mod recipients;
pub mod routes;
pub mod startup;
pub mod suppression;
pub mod telemetry;
pub mod unsubscribe;
pub mod unsubscribe_token;
