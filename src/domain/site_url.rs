use url::Url;

use uuid::Uuid;

/// Base URL of the public site that renders posts and subscription result pages
#[derive(Debug, Clone)]
pub struct SiteUrl(Url);

impl SiteUrl {
    pub fn new(base: Url) -> Self {
        Self(base)
    }

    /// Result page for a successful or repeated verification
    pub fn subscription_confirmed(&self, email: &str, status: &str) -> Result<Url, url::ParseError> {
        let mut url = self.0.join("subscription/confirmed")?;
        url.query_pairs_mut()
            .append_pair("email", email)
            .append_pair("status", status);
        Ok(url)
    }

    /// Result page for a failed verification
    pub fn subscription_error(&self, reason: &str) -> Result<Url, url::ParseError> {
        let mut url = self.0.join("subscription/error")?;
        url.query_pairs_mut().append_pair("reason", reason);
        Ok(url)
    }

    /// Public page of a post
    pub fn post(&self, blog_id: Uuid) -> Result<Url, url::ParseError> {
        self.0.join(&format!("blog/{}", blog_id))
    }
}

impl AsRef<Url> for SiteUrl {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}
