use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error body returned by every failing endpoint.
///
/// Serializes as `{"message": ...}`; server errors additionally carry the
/// underlying cause in `error`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiError {
    /// Creates a new `ApiError` with provided message and status
    pub fn new_with_message_and_status(message: &str, status: StatusCode) -> Self {
        Self {
            status,
            message: message.to_string(),
            error: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new_with_message_and_status(message, StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new_with_message_and_status(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::new_with_message_and_status(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new_with_message_and_status(message, StatusCode::NOT_FOUND)
    }

    /// A 500 with the generic `Server error` message and `detail` as the cause.
    pub fn server_error(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Server error".to_string(),
            error: Some(detail.into()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(cause) => write!(f, "{} ({}): {}", self.message, self.status, cause),
            None => write!(f, "{} ({})", self.message, self.status),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl warp::Reply for ApiError {
    fn into_response(self) -> warp::reply::Response {
        warp::reply::with_status(warp::reply::json(&self), self.status).into_response()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl warp::reject::Reject for ApiError {}

#[cfg(not(target_arch = "wasm32"))]
impl ApiError {
    pub fn into_rejection(self) -> warp::Rejection {
        warp::reject::custom(self)
    }
}

impl std::error::Error for ApiError {}
