use chrono::Duration;

use uuid::Uuid;

use super::{SigningKey, Token, TokenResult};

/// Issues and resolves the tokens embedded in subscription verification links.
///
/// In plain mode the token is the subscriber id itself. In signed mode the id
/// is wrapped in an HMAC-signed token that may carry an expiry.
#[derive(Debug, Clone)]
pub enum VerificationTokens {
    Plain,
    Signed {
        key: SigningKey,
        ttl: Option<Duration>,
    },
}

impl VerificationTokens {
    pub fn signed(key: SigningKey, ttl: Option<Duration>) -> Self {
        Self::Signed { key, ttl }
    }

    /// Produce the token for a subscriber
    pub fn issue(&self, subscriber_id: Uuid) -> TokenResult<String> {
        match self {
            Self::Plain => Ok(subscriber_id.to_string()),
            Self::Signed { key, ttl } => {
                let builder = Token::builder(subscriber_id);
                let builder = match ttl {
                    Some(ttl) => builder.expires_in(*ttl),
                    None => builder,
                };
                builder.sign(key).map(|token| token.to_string())
            }
        }
    }

    /// Resolve a token back to a subscriber id.
    ///
    /// `Ok(None)` means the token is well-formed for this mode but cannot name
    /// any subscriber; `Err` means a signed token failed verification.
    pub fn resolve(&self, token: &str) -> TokenResult<Option<Uuid>> {
        match self {
            Self::Plain => Ok(Uuid::parse_str(token).ok()),
            Self::Signed { key, .. } => {
                let id = token.parse::<Token>()?.verify(key)?;
                Ok(Some(id))
            }
        }
    }
}
