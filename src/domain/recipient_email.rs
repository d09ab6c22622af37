use validator::validate_email;

/// A syntactically valid address we are allowed to put in a `to` or `from` field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecipientEmail(String);

impl RecipientEmail {
    pub fn parse(email: String) -> Result<RecipientEmail, String> {
        let email = email.trim().to_string();
        let is_valid_email = validate_email(&email);

        if !is_valid_email {
            return Err(format!("{} email is not valid", email));
        }

        Ok(Self(email))
    }
}

impl AsRef<str> for RecipientEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
