use uuid::Uuid;

use sqlx::PgExecutor;

use crate::domain::EmailAddress;
use crate::model::Subscriber;

/// Repository for interfacing with the `newsletter_subscribers` table
pub struct SubscriberRepo;

impl SubscriberRepo {
    #[tracing::instrument(name = "Insert subscriber", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        email: &EmailAddress,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar(
            "insert into newsletter_subscribers(email, confirmed) values ($1, false) returning id",
        )
        .bind(email.as_ref())
        .fetch_one(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscriber by email", skip(executor))]
    pub async fn fetch_by_email<'con>(
        executor: impl PgExecutor<'con>,
        email: &EmailAddress,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as(
            "select id, email, confirmed, created_at from newsletter_subscribers where email=$1",
        )
        .bind(email.as_ref())
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch subscriber by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Subscriber>> {
        sqlx::query_as(
            "select id, email, confirmed, created_at from newsletter_subscribers where id=$1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Confirm a pending subscriber.
    ///
    /// Returns `false` when no pending row matched, which means the subscriber
    /// was confirmed already (possibly by a concurrent request).
    #[tracing::instrument(name = "Confirm a subscriber by id", skip(executor))]
    pub async fn confirm_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "update newsletter_subscribers set confirmed=true where id=$1 and not confirmed",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "Fetch all confirmed subscribers", skip(executor))]
    pub async fn fetch_all_confirmed<'con>(
        executor: impl PgExecutor<'con>,
    ) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as(
            "select id, email, confirmed, created_at from newsletter_subscribers \
             where confirmed order by created_at",
        )
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch all subscribers", skip(executor))]
    pub async fn fetch_all<'con>(executor: impl PgExecutor<'con>) -> sqlx::Result<Vec<Subscriber>> {
        sqlx::query_as(
            "select id, email, confirmed, created_at from newsletter_subscribers \
             order by created_at desc",
        )
        .fetch_all(executor)
        .await
    }
}
