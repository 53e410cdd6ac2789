// Error type for every call into the planning API

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated: session expired or logged out, please log in again")]
    Unauthorized,
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HTTP: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
    #[error("CSRF token unavailable: {0}")]
    Csrf(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err)
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Worth retrying: connection trouble, timeouts, 408/429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT.as_u16()
                    || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || *status >= 500
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(status(408).is_transient());
        assert!(ApiError::Timeout.is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(404).is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), Some(401));
        assert!(status(404).is_not_found());
        assert_eq!(ApiError::Timeout.status(), None);
    }
}
