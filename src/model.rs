mod blogs;
mod newsletter_logs;
mod subscribers;

pub use blogs::{Blog, BlogDraft};
pub use newsletter_logs::{
    NewNewsletterLog, NewsletterLog, NewsletterLogEntry, SendStatus, DELETED_POST_LABEL,
};
pub use subscribers::Subscriber;
