use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Duration, TimeZone, Utc};

use base64::{
    alphabet,
    engine::{self, general_purpose},
    Engine as _,
};
use regex::Regex;

use super::SigningKey;

lazy_static::lazy_static! {
    // URL-safe, unpadded so tokens can sit in a query string untouched
    static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);
    static ref TOKEN_REGEX: Regex = Regex::new(r"^([\w-]+)\.([\w-]+)$").unwrap();
}

/// Various errors that can occur when handling tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature does not match")]
    SignatureMismatch,
    #[error("Token is expired")]
    Expired,
    #[error("Token is of invalid format")]
    InvalidFormat,
    #[error("Serialization error")]
    Serde(#[from] serde_json::Error),
    #[error("Decode error")]
    DecodeError(#[from] base64::DecodeError),
}

pub type TokenResult<T> = Result<T, TokenError>;

/// A signed `<message>.<signature>` token
#[derive(Debug, Clone, PartialEq)]
pub struct Token(String);

impl Token {
    pub fn builder<T: Serialize>(payload: T) -> TokenBuilder<T> {
        TokenBuilder::new(payload)
    }

    /// Verify the signature and expiry, then hand back the payload
    pub fn verify<T>(&self, key: &SigningKey) -> TokenResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let (msg, sig) = self.split().ok_or(TokenError::InvalidFormat)?;
        let msg = BASE64_ENGINE.decode(msg)?;
        let sig = BASE64_ENGINE.decode(sig)?;

        if !key.verify(&msg, &sig) {
            return Err(TokenError::SignatureMismatch);
        }

        let msg: TokenMessage<T> = serde_json::from_slice(&msg)?;
        if msg.is_expired() {
            Err(TokenError::Expired)
        } else {
            Ok(msg.data)
        }
    }

    fn split(&self) -> Option<(&str, &str)> {
        let captures = TOKEN_REGEX.captures(&self.0)?;

        let msg = captures.get(1)?.as_str();
        let sig = captures.get(2)?.as_str();
        Some((msg, sig))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(token: &str) -> TokenResult<Self> {
        if !TOKEN_REGEX.is_match(token) {
            Err(TokenError::InvalidFormat)
        } else {
            Ok(Self(token.to_string()))
        }
    }
}

/// Builder for creating and signing tokens
#[derive(Debug)]
pub struct TokenBuilder<T> {
    expiration: Option<DateTime<Utc>>,
    payload: T,
}

impl<T: Serialize> TokenBuilder<T> {
    pub fn new(payload: T) -> Self {
        Self {
            expiration: None,
            payload,
        }
    }

    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.expiration = Some(Utc::now() + duration);
        self
    }

    pub fn expires_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.expiration = Some(timestamp);
        self
    }

    pub fn sign(self, key: &SigningKey) -> TokenResult<Token> {
        let msg = serde_json::to_vec(&TokenMessage::from(self))?;
        let sig = key.sign(&msg);

        Ok(Token(format!(
            "{}.{}",
            BASE64_ENGINE.encode(msg),
            BASE64_ENGINE.encode(sig)
        )))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenMessage<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    data: T,
}

impl<T> TokenMessage<T> {
    fn is_expired(&self) -> bool {
        match self.exp {
            // Ambiguous or out of range timestamps count as expired
            Some(exp) => Utc
                .timestamp_opt(exp, 0u32)
                .earliest()
                .map(|exp| Utc::now() >= exp)
                .unwrap_or(true),
            None => false,
        }
    }
}

impl<T> From<TokenBuilder<T>> for TokenMessage<T> {
    fn from(value: TokenBuilder<T>) -> Self {
        Self {
            exp: value.expiration.map(|d| d.timestamp()),
            data: value.payload,
        }
    }
}
