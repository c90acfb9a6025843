use std::net::TcpListener;
use std::time::Duration;

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use blog_newsletter::app::{self, AppContext};
use blog_newsletter::client::EmailClient;
use blog_newsletter::controller::newsletters::SendConcurrency;
use blog_newsletter::domain::{PublicUrl, SiteUrl};
use blog_newsletter::settings::Settings;
use blog_newsletter::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load()?;

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(settings.database.with_db());
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let email_client = EmailClient::new(
        settings.email.sender()?,
        settings.email.sender_name(),
        settings.email.api_timeout(),
        settings.email.api_base_url()?,
        settings.email.api_auth_token(),
    )?;

    let context = AppContext {
        email_client,
        tokens: settings
            .newsletter
            .verification_tokens(settings.app.secret_key())?,
        public_url: PublicUrl::new(settings.app.public_url()?),
        site_url: SiteUrl::new(settings.app.site_url()?),
        send_concurrency: SendConcurrency(settings.newsletter.max_concurrent_sends()),
    };

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(listener, pool, context)?
        .await
        .context("Failed to run app")
}
