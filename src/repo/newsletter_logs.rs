use uuid::Uuid;

use sqlx::PgExecutor;

use crate::model::{
    NewNewsletterLog, NewsletterLog, NewsletterLogEntry, SendStatus, DELETED_POST_LABEL,
};

/// Repository for interfacing with the `newsletter_logs` table
pub struct NewsletterLogRepo;

impl NewsletterLogRepo {
    /// Record a dispatch as `processing`
    #[tracing::instrument(name = "Insert newsletter log", skip(executor))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        new_log: &NewNewsletterLog,
    ) -> sqlx::Result<Uuid> {
        sqlx::query_scalar(
            "insert into newsletter_logs(blog_id, recipients_count, subject, status) \
             values ($1, $2, $3, $4) returning id",
        )
        .bind(new_log.blog_id)
        .bind(new_log.recipients_count)
        .bind(&new_log.subject)
        .bind(SendStatus::Processing.as_str())
        .fetch_one(executor)
        .await
    }

    /// Move a `processing` log to its terminal status. Terminal logs are left
    /// untouched, so the returned flag is `false` for them.
    #[tracing::instrument(name = "Finish newsletter log", skip(executor))]
    pub async fn finish<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        status: SendStatus,
        recipients_count: i32,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "update newsletter_logs set status=$2, recipients_count=$3 \
             where id=$1 and status=$4",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(recipients_count)
        .bind(SendStatus::Processing.as_str())
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(name = "Fetch newsletter log by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<NewsletterLog>> {
        sqlx::query_as(
            "select id, blog_id, recipients_count, subject, status, sent_at \
             from newsletter_logs where id=$1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// All send logs, newest first, labelled with the title of their post
    #[tracing::instrument(name = "Fetch newsletter logs", skip(executor))]
    pub async fn fetch_all<'con>(
        executor: impl PgExecutor<'con>,
    ) -> sqlx::Result<Vec<NewsletterLogEntry>> {
        sqlx::query_as(
            "select l.id, l.blog_id, coalesce(b.title, $1) as blog_title, \
             l.recipients_count, l.subject, l.status, l.sent_at \
             from newsletter_logs l left join blogs b on b.id = l.blog_id \
             order by l.sent_at desc",
        )
        .bind(DELETED_POST_LABEL)
        .fetch_all(executor)
        .await
    }
}
