use watchlist_newsletter::config::get_configuration;
use watchlist_newsletter::startup::{Application, StartupError};
use watchlist_newsletter::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let subscriber = get_subscriber(String::from("watchlist_newsletter"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let application = Application::build(config).await?;

    application.run_until_stop().await?;

    Ok(())
}
