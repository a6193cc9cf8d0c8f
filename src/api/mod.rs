pub mod admin;
pub mod client;
pub mod contacts;
pub mod images;
pub mod plots;
pub mod quiz;
pub mod requests;
pub mod visits;

use std::fmt;

pub use client::ApiClient;

/// Coarse classification of a failed backend call. The commit sequence
/// and the CLI branch on this instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Request never produced an HTTP response (DNS, connect, timeout).
    Network,
    /// Missing, expired or rejected admin session.
    Auth,
    NotFound,
    /// The backend rejected the payload (400, or 422 outside admin auth).
    Validation,
    /// Any other non-success response.
    Server,
    /// Local failure before or after the wire: file IO, body decoding.
    Internal,
}

#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub error: anyhow::Error,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, error: anyhow::Error) -> Self {
        Self { kind, error }
    }

    pub fn into_anyhow(self) -> anyhow::Error {
        self.error
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl<E> From<E> for ApiError
where
    anyhow::Error: From<E>,
{
    fn from(err: E) -> Self {
        ApiError {
            kind: ApiErrorKind::Internal,
            error: anyhow::Error::from(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
