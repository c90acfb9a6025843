mod signing_key;
mod token;
mod verification;

pub use signing_key::SigningKey;
pub use token::{Token, TokenBuilder, TokenError, TokenResult};
pub use verification::VerificationTokens;
