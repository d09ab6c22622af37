mod health_check;
mod newsletters;
mod unsubscribe_api;
mod unsubscribe_page;
mod welcome_emails;

pub use health_check::*;
pub use newsletters::*;
pub use unsubscribe_api::*;
pub use unsubscribe_page::*;
pub use welcome_emails::*;
