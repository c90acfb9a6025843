use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use anyhow::Context;

use secrecy::Secret;

use sqlx::PgPool;

use uuid::Uuid;

use crate::domain::EmailAddress;
use crate::error::{RestError, RestResult};
use crate::repo::UsersRepo;
use crate::telemetry::spawn_blocking_with_tracing;

use super::Credentials;

/// Checked when no user matches, so unknown emails cost the same argon2 work
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=15000,t=2,p=1$gZiV/M1gPc22ElAH/Jh1Hw$CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

/// Extractor guarding the admin endpoints with HTTP Basic credentials
#[derive(Debug)]
pub struct Administrator(Uuid);

impl FromRequest for Administrator {
    type Error = RestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .context("Database pool not registered for application")?;

            let creds = Credentials::from_headers(req.headers())
                .map_err(RestError::FailedToAuthenticate)?;

            let user_id = validate_credentials(pool, creds).await?;
            Ok(Administrator(user_id))
        })
    }
}

impl AsRef<Uuid> for Administrator {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

#[tracing::instrument("Validate credentials", skip(pool, credentials), fields(username = %credentials.username))]
async fn validate_credentials(pool: &PgPool, credentials: Credentials) -> RestResult<Uuid> {
    let email: EmailAddress = credentials
        .username
        .parse()
        .map_err(|e: String| RestError::FailedToAuthenticate(anyhow::anyhow!(e)))?;

    let user = UsersRepo::fetch_credentials_by_email(pool, &email)
        .await
        .map_err(RestError::data_access("Failed to fetch user credentials"))?;

    let (user_id, password_hash) = match user {
        Some(user) => (Some(user.id), user.password_hash),
        None => (None, Secret::new(DUMMY_PASSWORD_HASH.to_string())),
    };

    let password = credentials.password;
    spawn_blocking_with_tracing(move || verify_password_hash(password, password_hash))
        .await
        .context("Failed to spawn blocking task")??;

    user_id
        .context("No user stored for email")
        .map_err(RestError::FailedToAuthenticate)
}

#[tracing::instrument("Verify password hash", skip(password, password_hash))]
fn verify_password_hash(password: Secret<String>, password_hash: Secret<String>) -> RestResult<()> {
    use secrecy::ExposeSecret;

    let password_hash = PasswordHash::new(password_hash.expose_secret())
        .map_err(|e| anyhow::anyhow!("Failed to parse stored password hash: {}", e))?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &password_hash)
        .map_err(|e| RestError::FailedToAuthenticate(anyhow::anyhow!("Invalid password: {}", e)))
}
