use uuid::Uuid;

use sqlx::PgExecutor;

use crate::model::{Blog, BlogDraft};

/// Optional filters for listing posts
#[derive(Debug, Default)]
pub struct BlogFilter {
    /// Only posts carrying this tag
    pub tag: Option<String>,
    pub featured_only: bool,
}

/// Repository for interfacing with the `blogs` table
pub struct BlogRepo;

impl BlogRepo {
    #[tracing::instrument(name = "Fetch blogs", skip(executor))]
    pub async fn fetch_all<'con>(
        executor: impl PgExecutor<'con>,
        filter: &BlogFilter,
    ) -> sqlx::Result<Vec<Blog>> {
        sqlx::query_as(
            "select * from blogs \
             where ($1::text is null or $1 = any(tags)) and (not $2 or featured) \
             order by created_at desc",
        )
        .bind(filter.tag.as_deref())
        .bind(filter.featured_only)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch blog by id", skip(executor))]
    pub async fn fetch_by_id<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<Option<Blog>> {
        sqlx::query_as("select * from blogs where id=$1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    #[tracing::instrument(name = "Insert blog", skip(executor, draft), fields(title = %draft.title))]
    pub async fn insert<'con>(
        executor: impl PgExecutor<'con>,
        draft: &BlogDraft,
    ) -> sqlx::Result<Blog> {
        sqlx::query_as(
            "insert into blogs(title, slug, excerpt, content, cover_image, author_name, \
             author_avatar, tags, featured, read_time) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) returning *",
        )
        .bind(&draft.title)
        .bind(draft.slug().as_ref())
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.cover_image)
        .bind(&draft.author_name)
        .bind(draft.author_avatar.as_deref())
        .bind(&draft.tags)
        .bind(draft.featured)
        .bind(draft.read_time())
        .fetch_one(executor)
        .await
    }

    /// Overwrite a post's content. The slug assigned at creation is kept.
    #[tracing::instrument(name = "Update blog", skip(executor, draft))]
    pub async fn update<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
        draft: &BlogDraft,
    ) -> sqlx::Result<Option<Blog>> {
        sqlx::query_as(
            "update blogs set title=$2, excerpt=$3, content=$4, cover_image=$5, \
             author_name=$6, author_avatar=$7, tags=$8, featured=$9, read_time=$10, \
             updated_at=now() \
             where id=$1 returning *",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.cover_image)
        .bind(&draft.author_name)
        .bind(draft.author_avatar.as_deref())
        .bind(&draft.tags)
        .bind(draft.featured)
        .bind(draft.read_time())
        .fetch_optional(executor)
        .await
    }

    /// Returns `false` when there was nothing to delete
    #[tracing::instrument(name = "Delete blog", skip(executor))]
    pub async fn delete<'con>(executor: impl PgExecutor<'con>, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("delete from blogs where id=$1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
