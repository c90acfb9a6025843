use actix_web::dev::HttpServiceFactory;
use actix_web::{post, web, HttpResponse};

use anyhow::Context;

use serde::{Deserialize, Serialize};
use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use crate::client::EmailClient;
use crate::domain::{EmailAddress, SiteUrl};
use crate::error::{RestError, RestResult};
use crate::model::{Blog, NewNewsletterLog, SendStatus};
use crate::repo::{BlogRepo, NewsletterLogRepo, SubscriberRepo};
use crate::templates;

/// Upper bound on emails in flight during a single dispatch
#[derive(Debug, Clone, Copy)]
pub struct SendConcurrency(pub usize);

#[derive(Debug, Deserialize)]
pub struct SendNewsletterBody {
    #[serde(rename = "blogId")]
    blog_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchReport {
    success: bool,
    message: String,
    log_id: Uuid,
    total_subscribers: usize,
    successful_sends: usize,
}

/// Email a published post to every confirmed subscriber and record the outcome
#[tracing::instrument(
    name = "Send newsletter for a post",
    skip(body, pool, email_client, site_url, concurrency)
)]
#[post("/send")]
async fn send(
    body: web::Json<SendNewsletterBody>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    site_url: web::Data<SiteUrl>,
    concurrency: web::Data<SendConcurrency>,
) -> RestResult<HttpResponse> {
    let pool = pool.get_ref();

    let blog_id = body
        .into_inner()
        .blog_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RestError::ValidationError("Blog ID is required".into()))?;

    let blog = find_blog(pool, blog_id.trim())
        .await
        .ok_or(RestError::NotFound("Blog not found"))?;

    let subscribers = SubscriberRepo::fetch_all_confirmed(pool)
        .await
        .map_err(RestError::data_access("Failed to fetch subscribers"))?;
    if subscribers.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "No confirmed subscribers found",
        })));
    }
    let total = subscribers.len();

    let post_url = site_url
        .post(blog.id)
        .context("Failed to build post URL")?;
    let email = templates::new_post_email(&blog, &post_url)
        .context("Failed to render newsletter email")?;

    let new_log = NewNewsletterLog {
        blog_id: blog.id,
        recipients_count: i32::try_from(total).context("Too many subscribers for one log")?,
        subject: email.subject.clone(),
    };
    let log_id = NewsletterLogRepo::insert(pool, &new_log)
        .await
        .map_err(RestError::data_access("Failed to create newsletter log"))?;

    // Stored addresses that no longer parse count as failed sends
    let recipients: Vec<EmailAddress> = subscribers
        .into_iter()
        .filter_map(|subscriber| match subscriber.email.parse() {
            Ok(recipient) => Some(recipient),
            Err(error) => {
                tracing::warn!(
                    "Skipping confirmed subscriber {} with invalid email: {}",
                    subscriber.id,
                    error
                );
                None
            }
        })
        .collect();

    let successes = email_client
        .broadcast(&recipients, &email, concurrency.0)
        .await;

    let status = SendStatus::from_successes(successes);
    // Emails are already out, so a failed update only gets logged
    if let Err(error) =
        NewsletterLogRepo::finish(pool, log_id, status, successes as i32).await
    {
        tracing::error!(
            error.cause_chain = ?error,
            "Failed to update newsletter log {}",
            log_id
        );
    }

    tracing::info!(
        "Newsletter for blog {} sent to {} of {} subscribers",
        blog.id,
        successes,
        total
    );

    Ok(HttpResponse::Ok().json(DispatchReport {
        success: successes > 0,
        message: format!(
            "Newsletter sent to {} of {} subscribers",
            successes, total
        ),
        log_id,
        total_subscribers: total,
        successful_sends: successes,
    }))
}

/// Any failure to produce the post is reported as not found
async fn find_blog(pool: &PgPool, blog_id: &str) -> Option<Blog> {
    let id = Uuid::parse_str(blog_id).ok()?;

    match BlogRepo::fetch_by_id(pool, id).await {
        Ok(blog) => blog,
        Err(error) => {
            tracing::warn!(error.cause_chain = ?error, "Failed to fetch blog {}", id);
            None
        }
    }
}

/// Newsletter API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/newsletters").service(send)
}
