//! HTML bodies for outgoing mail, rendered with Askama.
use askama::Template;

#[derive(Template)]
#[template(path = "welcome_email.html")]
pub struct WelcomeEmailTemplate<'a> {
    pub name: &'a str,
    pub intro: &'a str,
}

#[derive(Template)]
#[template(path = "news_summary_email.html")]
pub struct NewsSummaryEmailTemplate<'a> {
    pub date: &'a str,
    /// Already HTML, inserted without escaping.
    pub news_content: &'a str,
}
