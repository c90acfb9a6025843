use std::fmt;

use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

/// Label shown for send logs whose post has since been deleted
pub const DELETED_POST_LABEL: &str = "Deleted post";

/// Lifecycle of a single newsletter dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Processing,
    Completed,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal status for a dispatch that delivered `successes` emails
    pub fn from_successes(successes: usize) -> Self {
        if successes > 0 {
            Self::Completed
        } else {
            Self::Failed
        }
    }
}

impl TryFrom<String> for SendStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("{} is not a valid send status", other)),
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New send log, written before any email goes out
#[derive(Debug)]
pub struct NewNewsletterLog {
    pub blog_id: Uuid,
    pub recipients_count: i32,
    pub subject: String,
}

/// Stored send log record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterLog {
    pub id: Uuid,
    /// `None` once the post has been deleted
    pub blog_id: Option<Uuid>,
    /// Planned recipients while processing, successful sends afterwards
    pub recipients_count: i32,
    pub subject: String,
    #[sqlx(try_from = "String")]
    pub status: SendStatus,
    pub sent_at: DateTime<Utc>,
}

/// Send log joined with the title of the post it announced
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterLogEntry {
    pub id: Uuid,
    pub blog_id: Option<Uuid>,
    pub blog_title: String,
    pub recipients_count: i32,
    pub subject: String,
    #[sqlx(try_from = "String")]
    pub status: SendStatus,
    pub sent_at: DateTime<Utc>,
}
