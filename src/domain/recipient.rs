use crate::domain::recipient_email::RecipientEmail;

/// A row from the `users` table owned by the auth provider. Both columns may be
/// missing for accounts that never completed their profile.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A user that passed the recipient filter and can be rendered into a template.
#[derive(Debug)]
pub struct Recipient {
    pub id: String,
    pub email: RecipientEmail,
    pub name: String,
}
