/// Storage key for an email address: trimmed and lowercased.
///
/// Every comparison against the suppression table goes through this type, so
/// `A@B.com` and ` a@b.com ` always land on the same row. There is no syntax
/// check: whatever address a token or the manual form carried is stored as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    pub fn parse(email: &str) -> Result<NormalizedEmail, String> {
        let normalized = normalize_email(email);

        if normalized.is_empty() {
            return Err(String::from("email cannot be empty"));
        }

        Ok(Self(normalized))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AsRef<str> for NormalizedEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
