use chrono::{DateTime, Utc};

use crate::domain::normalized_email::NormalizedEmail;

/// How a suppression was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SuppressionSource {
    /// Interactive click on the link in the email footer.
    Link,
    /// Machine POST from a mail client (RFC 8058).
    ListUnsubscribe,
    Manual,
    Api,
}

/// Breadth of a suppression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum SuppressionScope {
    #[default]
    All,
    Newsletter,
}

#[derive(Debug, serde::Serialize)]
pub struct SuppressionRecord {
    pub email: NormalizedEmail,
    pub unsubscribed_at: DateTime<Utc>,
    pub reason: String,
    pub source: SuppressionSource,
    pub scope: SuppressionScope,
}

impl SuppressionSource {
    pub fn parse(source: String) -> Result<SuppressionSource, String> {
        match source.as_str() {
            "link" => Ok(SuppressionSource::Link),
            "list-unsubscribe" => Ok(SuppressionSource::ListUnsubscribe),
            "manual" => Ok(SuppressionSource::Manual),
            "api" => Ok(SuppressionSource::Api),
            _ => Err(format!("{} is not a valid suppression source", source)),
        }
    }
}

impl AsRef<str> for SuppressionSource {
    fn as_ref(&self) -> &str {
        match self {
            SuppressionSource::Link => "link",
            SuppressionSource::ListUnsubscribe => "list-unsubscribe",
            SuppressionSource::Manual => "manual",
            SuppressionSource::Api => "api",
        }
    }
}

impl SuppressionScope {
    pub fn parse(scope: String) -> Result<SuppressionScope, String> {
        match scope.as_str() {
            "all" => Ok(SuppressionScope::All),
            "newsletter" => Ok(SuppressionScope::Newsletter),
            _ => Err(format!("{} is not a valid suppression scope", scope)),
        }
    }
}

impl AsRef<str> for SuppressionScope {
    fn as_ref(&self) -> &str {
        match self {
            SuppressionScope::All => "all",
            SuppressionScope::Newsletter => "newsletter",
        }
    }
}
