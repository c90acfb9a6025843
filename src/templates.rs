use askama::Template;

use chrono::{Datelike, Utc};

use url::Url;

use crate::client::Email;
use crate::model::Blog;

const CONFIRMATION_SUBJECT: &str = "Confirm your newsletter subscription";

#[derive(Template)]
#[template(path = "emails/confirmation.html")]
struct ConfirmationHtml<'a> {
    verification_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "emails/confirmation.txt")]
struct ConfirmationText<'a> {
    verification_url: &'a str,
    year: i32,
}

/// Post fields are escaped in the HTML body; URLs come from `Url` and are
/// already percent-encoded
#[derive(Template)]
#[template(path = "emails/new_post.html")]
struct NewPostHtml<'a> {
    blog: &'a Blog,
    post_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "emails/new_post.txt")]
struct NewPostText<'a> {
    blog: &'a Blog,
    post_url: &'a str,
    year: i32,
}

/// Email asking a new subscriber to follow their verification link
pub fn confirmation_email(verification_url: &Url) -> askama::Result<Email> {
    let year = Utc::now().year();
    let verification_url = verification_url.as_str();

    Ok(Email {
        subject: CONFIRMATION_SUBJECT.into(),
        html_body: ConfirmationHtml {
            verification_url,
            year,
        }
        .render()?,
        text_body: ConfirmationText {
            verification_url,
            year,
        }
        .render()?,
    })
}

/// Subject line used for a post announcement, also stored in the send log
pub fn new_post_subject(blog: &Blog) -> String {
    format!("New Post: {}", blog.title)
}

/// Email announcing a freshly published post
pub fn new_post_email(blog: &Blog, post_url: &Url) -> askama::Result<Email> {
    let year = Utc::now().year();
    let post_url = post_url.as_str();

    Ok(Email {
        subject: new_post_subject(blog),
        html_body: NewPostHtml {
            blog,
            post_url,
            year,
        }
        .render()?,
        text_body: NewPostText {
            blog,
            post_url,
            year,
        }
        .render()?,
    })
}
