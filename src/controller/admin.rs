use actix_web::dev::HttpServiceFactory;
use actix_web::{get, web, HttpResponse};

use serde::Serialize;

use sqlx::PgPool;

use crate::auth::Administrator;
use crate::error::{RestError, RestResult};
use crate::model::Subscriber;
use crate::repo::{NewsletterLogRepo, SubscriberRepo};

use super::blogs;

#[derive(Debug, Serialize)]
struct SubscriberListing {
    subscribers: Vec<Subscriber>,
    total: usize,
    confirmed: usize,
}

impl From<Vec<Subscriber>> for SubscriberListing {
    fn from(subscribers: Vec<Subscriber>) -> Self {
        let confirmed = subscribers.iter().filter(|s| s.confirmed).count();
        Self {
            total: subscribers.len(),
            confirmed,
            subscribers,
        }
    }
}

#[tracing::instrument(name = "List newsletter subscribers", skip(pool))]
#[get("/newsletter/subscribers")]
async fn list_subscribers(
    admin: Administrator,
    pool: web::Data<PgPool>,
) -> RestResult<HttpResponse> {
    let subscribers = SubscriberRepo::fetch_all(pool.get_ref())
        .await
        .map_err(RestError::data_access("Failed to fetch subscribers"))?;

    Ok(HttpResponse::Ok().json(SubscriberListing::from(subscribers)))
}

#[tracing::instrument(name = "List newsletter logs", skip(pool))]
#[get("/newsletter/logs")]
async fn list_logs(admin: Administrator, pool: web::Data<PgPool>) -> RestResult<HttpResponse> {
    let logs = NewsletterLogRepo::fetch_all(pool.get_ref())
        .await
        .map_err(RestError::data_access("Failed to fetch newsletter logs"))?;

    Ok(HttpResponse::Ok().json(logs))
}

/// Admin API endpoints, all behind HTTP Basic authentication
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/admin")
        .configure(blogs::admin_routes)
        .service(list_subscribers)
        .service(list_logs)
}
