use actix_web::dev::HttpServiceFactory;
use actix_web::{delete, get, post, put, web, HttpResponse};

use serde::Deserialize;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::Administrator;
use crate::error::{RestError, RestResult};
use crate::model::BlogDraft;
use crate::repo::{BlogFilter, BlogRepo};

const BLOG_NOT_FOUND: &str = "Blog not found";

#[derive(Debug, Deserialize)]
pub struct ListParams {
    tag: Option<String>,
    featured: Option<bool>,
}

impl From<ListParams> for BlogFilter {
    fn from(params: ListParams) -> Self {
        Self {
            tag: params.tag.filter(|tag| !tag.is_empty()),
            featured_only: params.featured.unwrap_or(false),
        }
    }
}

/// Post content as sent by the admin panel
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogForm {
    title: Option<String>,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    cover_image: String,
    author_name: Option<String>,
    author_avatar: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    featured: bool,
}

impl TryFrom<BlogForm> for BlogDraft {
    type Error = RestError;

    fn try_from(form: BlogForm) -> RestResult<Self> {
        let title = required(form.title, "Title is required")?;
        let author_name = required(form.author_name, "Author name is required")?;

        Ok(Self {
            title,
            excerpt: form.excerpt,
            content: form.content,
            cover_image: form.cover_image,
            author_name,
            author_avatar: form.author_avatar.filter(|avatar| !avatar.is_empty()),
            tags: form.tags,
            featured: form.featured,
        })
    }
}

fn required(value: Option<String>, message: &str) -> RestResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RestError::ValidationError(message.into()))
}

fn parse_id(id: &str) -> RestResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| RestError::NotFound(BLOG_NOT_FOUND))
}

#[tracing::instrument(name = "List blogs", skip(pool))]
#[get("")]
async fn list(
    params: web::Query<ListParams>,
    pool: web::Data<PgPool>,
) -> RestResult<HttpResponse> {
    let filter: BlogFilter = params.into_inner().into();
    let blogs = BlogRepo::fetch_all(pool.get_ref(), &filter)
        .await
        .map_err(RestError::data_access("Failed to fetch blogs"))?;

    Ok(HttpResponse::Ok().json(blogs))
}

#[tracing::instrument(name = "Fetch a blog", skip(pool))]
#[get("/{id}")]
async fn fetch(path: web::Path<String>, pool: web::Data<PgPool>) -> RestResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    let blog = BlogRepo::fetch_by_id(pool.get_ref(), id)
        .await
        .map_err(RestError::data_access("Failed to fetch blog"))?
        .ok_or(RestError::NotFound(BLOG_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(blog))
}

#[tracing::instrument(name = "Create a blog", skip(form, pool))]
#[post("/blogs")]
async fn create(
    admin: Administrator,
    form: web::Json<BlogForm>,
    pool: web::Data<PgPool>,
) -> RestResult<HttpResponse> {
    let draft: BlogDraft = form.into_inner().try_into()?;
    let blog = BlogRepo::insert(pool.get_ref(), &draft)
        .await
        .map_err(RestError::data_access("Failed to create blog"))?;

    Ok(HttpResponse::Created().json(blog))
}

#[tracing::instrument(name = "Update a blog", skip(form, pool))]
#[put("/blogs/{id}")]
async fn update(
    admin: Administrator,
    path: web::Path<String>,
    form: web::Json<BlogForm>,
    pool: web::Data<PgPool>,
) -> RestResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    let draft: BlogDraft = form.into_inner().try_into()?;
    let blog = BlogRepo::update(pool.get_ref(), id, &draft)
        .await
        .map_err(RestError::data_access("Failed to update blog"))?
        .ok_or(RestError::NotFound(BLOG_NOT_FOUND))?;

    Ok(HttpResponse::Ok().json(blog))
}

#[tracing::instrument(name = "Delete a blog", skip(pool))]
#[delete("/blogs/{id}")]
async fn remove(
    admin: Administrator,
    path: web::Path<String>,
    pool: web::Data<PgPool>,
) -> RestResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    let deleted = BlogRepo::delete(pool.get_ref(), id)
        .await
        .map_err(RestError::data_access("Failed to delete blog"))?;

    if !deleted {
        return Err(RestError::NotFound(BLOG_NOT_FOUND));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Public blog endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/blogs").service(list).service(fetch)
}

/// Blog management endpoints, mounted under the admin scope
pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create).service(update).service(remove);
}
