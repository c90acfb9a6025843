use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

use crate::domain::{read_time_minutes, Slug};

/// Stored blog post
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    /// Estimated minutes to read
    pub read_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated post content from the admin panel
#[derive(Debug, Clone)]
pub struct BlogDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
}

impl BlogDraft {
    pub fn slug(&self) -> Slug {
        Slug::from_title(&self.title)
    }

    pub fn read_time(&self) -> i32 {
        read_time_minutes(&self.content)
    }
}
