/// Admin dashboard endpoints
pub mod admin;
/// Blog post endpoints
pub mod blogs;
/// Newsletter dispatch endpoints
pub mod newsletters;
/// Subscription opt-in and verification endpoints
pub mod subscriptions;
