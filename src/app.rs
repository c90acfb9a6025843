use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{get, HttpRequest, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use sqlx::PgPool;

use tracing_actix_web::TracingLogger;

use crate::client::EmailClient;
use crate::controller::newsletters::SendConcurrency;
use crate::controller::{admin, blogs, newsletters, subscriptions};
use crate::crypto::VerificationTokens;
use crate::domain::{PublicUrl, SiteUrl};
use crate::error::RestError;

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Everything the handlers share besides the database pool
#[derive(Debug)]
pub struct AppContext {
    pub email_client: EmailClient,
    pub tokens: VerificationTokens,
    pub public_url: PublicUrl,
    pub site_url: SiteUrl,
    pub send_concurrency: SendConcurrency,
}

fn json_error(err: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    RestError::ValidationError(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: QueryPayloadError, _: &HttpRequest) -> actix_web::Error {
    RestError::ValidationError(format!("Invalid query string: {}", err)).into()
}

/// Run the application on a specified TCP listener
pub fn run(listener: TcpListener, pool: PgPool, context: AppContext) -> anyhow::Result<Server> {
    // Wrap application data
    let pool = web::Data::new(pool);
    let email_client = web::Data::new(context.email_client);
    let tokens = web::Data::new(context.tokens);
    let public_url = web::Data::new(context.public_url);
    let site_url = web::Data::new(context.site_url);
    let send_concurrency = web::Data::new(context.send_concurrency);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .app_data(pool.clone())
            .app_data(email_client.clone())
            .app_data(tokens.clone())
            .app_data(public_url.clone())
            .app_data(site_url.clone())
            .app_data(send_concurrency.clone())
            .service(health_check)
            .service(subscriptions::scope())
            .service(newsletters::scope())
            .service(blogs::scope())
            .service(admin::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
