mod blogs;
mod newsletter_logs;
mod subscribers;
mod users;

pub use blogs::{BlogFilter, BlogRepo};
pub use newsletter_logs::NewsletterLogRepo;
pub use subscribers::SubscriberRepo;
pub use users::{NewUser, UserCredentials, UsersRepo};
