use actix_web::dev::HttpServiceFactory;
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};

use anyhow::Context;

use serde::Deserialize;
use serde_json::json;

use sqlx::PgPool;

use thiserror::Error;

use crate::client::EmailClient;
use crate::crypto::VerificationTokens;
use crate::domain::{EmailAddress, PublicUrl, SiteUrl};
use crate::error::{RestError, RestResult};
use crate::repo::SubscriberRepo;
use crate::templates;

/// Body of an opt-in request
#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
    email: Option<String>,
}

impl TryFrom<SubscribeBody> for EmailAddress {
    type Error = RestError;

    fn try_from(body: SubscribeBody) -> RestResult<Self> {
        let email = body
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| RestError::ValidationError("Email is required".into()))?;

        email.parse().map_err(RestError::ValidationError)
    }
}

/// Start a double opt-in: record the address as pending and email it a
/// verification link
#[tracing::instrument(
    name = "Subscribe to the newsletter",
    skip(body, pool, tokens, public_url, email_client)
)]
#[post("")]
async fn subscribe(
    body: web::Json<SubscribeBody>,
    pool: web::Data<PgPool>,
    tokens: web::Data<VerificationTokens>,
    public_url: web::Data<PublicUrl>,
    email_client: web::Data<EmailClient>,
) -> RestResult<HttpResponse> {
    let pool = pool.get_ref();
    let email: EmailAddress = body.into_inner().try_into()?;

    let existing = SubscriberRepo::fetch_by_email(pool, &email)
        .await
        .map_err(RestError::data_access("Failed to check subscription status"))?;

    let subscriber_id = match existing {
        Some(subscriber) if subscriber.confirmed => {
            tracing::info!("Subscriber {} is already confirmed", subscriber.id);
            return Ok(HttpResponse::Ok().json(json!({
                "message": "Email already confirmed",
                "alreadyConfirmed": true,
            })));
        }
        // Pending subscribers get the same link again
        Some(subscriber) => subscriber.id,
        None => SubscriberRepo::insert(pool, &email)
            .await
            .map_err(RestError::data_access("Failed to create subscription"))?,
    };

    let token = tokens
        .issue(subscriber_id)
        .context("Failed to issue verification token")?;
    let verification_url = public_url
        .verification(&token)
        .context("Failed to build verification URL")?;

    let confirmation = templates::confirmation_email(&verification_url)
        .context("Failed to render confirmation email")?;
    email_client
        .send(&email, &confirmation)
        .await
        .map_err(RestError::transport("Failed to send confirmation email"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Confirmation email sent",
    })))
}

#[derive(Debug, Default, Deserialize)]
struct VerifyParams {
    token: Option<String>,
}

/// Why a verification link could not confirm a subscription
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Missing or invalid verification token")]
    InvalidToken,

    #[error("No subscription matches the verification token")]
    SubscriptionNotFound,

    #[error("Failed to look up subscription")]
    Lookup(#[source] sqlx::Error),

    #[error("Failed to confirm subscription")]
    ConfirmationUpdateFailed(#[source] sqlx::Error),
}

impl VerifyError {
    /// Reason reported to the result page
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid-token",
            Self::SubscriptionNotFound => "invalid-subscription",
            Self::ConfirmationUpdateFailed(_) => "update-failed",
            Self::Lookup(_) => "server-error",
        }
    }
}

/// Successful verification outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {
    Confirmed,
    AlreadyConfirmed,
}

impl Verified {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::AlreadyConfirmed => "already-confirmed",
        }
    }
}

/// Verification link target. Every outcome, including failures, is a
/// redirect to a result page on the public site.
#[tracing::instrument(name = "Verify a subscription", skip(req, pool, tokens, site_url))]
#[get("/verify")]
async fn verify(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    tokens: web::Data<VerificationTokens>,
    site_url: web::Data<SiteUrl>,
) -> RestResult<HttpResponse> {
    let params = web::Query::<VerifyParams>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    let location = match confirm_token(pool.get_ref(), tokens.get_ref(), params.token).await {
        Ok((email, outcome)) => site_url.subscription_confirmed(&email, outcome.as_str()),
        Err(error) => {
            match &error {
                VerifyError::Lookup(_) | VerifyError::ConfirmationUpdateFailed(_) => {
                    tracing::error!(error.cause_chain = ?error, "{}", error)
                }
                _ => tracing::warn!(error.cause_chain = ?error, "{}", error),
            }
            site_url.subscription_error(error.reason())
        }
    }
    .context("Failed to build verification redirect")?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_str()))
        .finish())
}

/// Resolve a token and confirm its subscriber, returning the subscriber's email
async fn confirm_token(
    pool: &PgPool,
    tokens: &VerificationTokens,
    token: Option<String>,
) -> Result<(String, Verified), VerifyError> {
    let token = token
        .filter(|token| !token.trim().is_empty())
        .ok_or(VerifyError::InvalidToken)?;

    let subscriber_id = tokens
        .resolve(token.trim())
        .map_err(|error| {
            tracing::warn!(error.cause_chain = ?error, "Rejected verification token");
            VerifyError::InvalidToken
        })?
        .ok_or(VerifyError::SubscriptionNotFound)?;

    let subscriber = SubscriberRepo::fetch_by_id(pool, subscriber_id)
        .await
        .map_err(VerifyError::Lookup)?
        .ok_or(VerifyError::SubscriptionNotFound)?;

    if subscriber.confirmed {
        return Ok((subscriber.email, Verified::AlreadyConfirmed));
    }

    // A concurrent visit may confirm between the lookup and this update
    let outcome = if SubscriberRepo::confirm_by_id(pool, subscriber.id)
        .await
        .map_err(VerifyError::ConfirmationUpdateFailed)?
    {
        Verified::Confirmed
    } else {
        Verified::AlreadyConfirmed
    };

    Ok((subscriber.email, outcome))
}

/// Subscriptions API endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/subscriptions")
        .service(subscribe)
        .service(verify)
}
