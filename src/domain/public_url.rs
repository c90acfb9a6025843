use url::Url;

/// Externally reachable base URL of this service, as configured
#[derive(Debug, Clone)]
pub struct PublicUrl(Url);

impl PublicUrl {
    pub fn new(base: Url) -> Self {
        Self(base)
    }

    /// Verification link embedding a subscriber's token
    pub fn verification(&self, token: &str) -> Result<Url, url::ParseError> {
        let mut url = self.0.join("subscriptions/verify")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
