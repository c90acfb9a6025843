mod email_address;
mod public_url;
mod site_url;
mod slug;

pub use email_address::EmailAddress;
pub use public_url::PublicUrl;
pub use site_url::SiteUrl;
pub use slug::{read_time_minutes, Slug};
