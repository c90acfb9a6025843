use secrecy::Secret;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::domain::EmailAddress;

#[derive(Debug)]
pub struct NewUser {
    pub email: EmailAddress,
    /// Argon2 hash in PHC string format
    pub password_hash: String,
}

#[derive(Debug)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: Secret<String>,
}

pub struct UsersRepo;

impl UsersRepo {
    #[tracing::instrument("Insert a new user record", skip(executor, new_user), fields(email = %new_user.email))]
    pub async fn insert<'conn>(
        executor: impl PgExecutor<'conn>,
        new_user: &NewUser,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar("insert into users(email, password_hash) values ($1, $2) returning id")
            .bind(new_user.email.as_ref())
            .bind(&new_user.password_hash)
            .fetch_one(executor)
            .await
    }

    #[tracing::instrument("Fetch user credentials", skip(executor))]
    pub async fn fetch_credentials_by_email<'conn>(
        executor: impl PgExecutor<'conn>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<UserCredentials>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("select id, password_hash from users where email=$1")
                .bind(email.as_ref())
                .fetch_optional(executor)
                .await?;

        Ok(row.map(|(id, password_hash)| UserCredentials {
            id,
            password_hash: Secret::new(password_hash),
        }))
    }
}
