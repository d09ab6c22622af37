pub mod normalized_email;
pub mod recipient;
pub mod recipient_email;
pub mod suppression;

pub use normalized_email::NormalizedEmail;
pub use recipient::{Recipient, RegisteredUser};
pub use recipient_email::RecipientEmail;
pub use suppression::{SuppressionRecord, SuppressionScope, SuppressionSource};
