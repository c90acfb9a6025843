use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

pub type RestResult<T> = Result<T, RestError>;

/// Errors surfaced by the JSON endpoints.
///
/// The display string of each variant is what the client sees in the
/// `{"error": ...}` body, so internal details stay in the source chain.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    FailedToAuthenticate(#[source] anyhow::Error),

    #[error("{context}")]
    DataAccessError {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{context}")]
    TransportError {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Internal Server Error")]
    Other(#[from] anyhow::Error),
}

impl RestError {
    pub fn data_access(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::DataAccessError { context, source }
    }

    pub fn transport(context: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::TransportError { context, source }
    }
}

impl From<sqlx::Error> for RestError {
    fn from(source: sqlx::Error) -> Self {
        Self::DataAccessError {
            context: "Database error",
            source,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::FailedToAuthenticate(_) => StatusCode::UNAUTHORIZED,
            Self::DataAccessError { .. } | Self::TransportError { .. } | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error.cause_chain = ?self, "{}", self);
        } else {
            tracing::warn!(error.cause_chain = ?self, "{}", self);
        }

        let mut res = HttpResponse::build(self.status_code());
        if let Self::FailedToAuthenticate(_) = self {
            res.insert_header((header::WWW_AUTHENTICATE, r#"Basic realm="admin""#));
        }
        res.json(ErrorBody {
            error: self.to_string(),
        })
    }
}
