use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub const INTERNAL_MESSAGE: &str = "internal server error - please contact support";

/// Error as rendered to clients. Internal faults are logged in full and then
/// collapsed into a generic message.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    error: &'a ApiError,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            kind,
            param: None,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        error!(kind = "internal_error", "request failed: {}", error);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_MESSAGE,
        )
    }

    pub fn bad_request(param: &str, message: impl Into<String>) -> ApiError {
        ApiError {
            param: Some(param.to_string()),
            ..ApiError::new(
                StatusCode::BAD_REQUEST,
                "input_validation_error",
                message,
            )
        }
    }

    fn body_status(&self) -> &'static str {
        if self.status.is_server_error() {
            "error"
        } else {
            "fail"
        }
    }

    pub fn into_reply(self) -> warp::reply::WithStatus<warp::reply::Json> {
        let json = warp::reply::json(&ErrorBody {
            status: self.body_status(),
            error: &self,
        });
        warp::reply::with_status(json, self.status)
    }
}

impl reject::Reject for ApiError {}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let api_error = match &error {
            AuthError::Validation { param, message } => ApiError::bad_request(param, message),
            AuthError::NotFound(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "item_does_not_exist",
                error.to_string(),
            ),
            AuthError::AlreadyExists(_) => ApiError::new(
                StatusCode::CONFLICT,
                "item_already_exists",
                error.to_string(),
            ),
            AuthError::Unauthenticated(_) => ApiError::new(
                StatusCode::FORBIDDEN,
                "unauthenticated_request",
                error.to_string(),
            ),
            AuthError::Unauthorized(_) => ApiError::new(
                StatusCode::FORBIDDEN,
                "unauthorized_request",
                error.to_string(),
            ),
            AuthError::Token(token_error) if token_error.is_server_fault() => {
                return ApiError::internal(&error);
            }
            AuthError::Token(_) => ApiError::new(
                StatusCode::FORBIDDEN,
                "unauthorized_request",
                error.to_string(),
            ),
            AuthError::Store(_) | AuthError::Database(_) | AuthError::InternalError(_) => {
                return ApiError::internal(&error);
            }
        };
        warn!(
            kind = api_error.kind,
            param = api_error.param.as_deref().unwrap_or(""),
            status = api_error.status.as_u16(),
            "request failed: {}",
            error
        );
        api_error
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let api_error = if let Some(err) = err.find::<ApiError>() {
        err.clone()
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        warn!("bad request body: {}", e);
        ApiError::bad_request("body", "incorrect data format")
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "invalid_request_error",
            "method not allowed",
        )
    } else if err.is_not_found() {
        ApiError::new(StatusCode::NOT_FOUND, "item_does_not_exist", "route not found")
    } else {
        ApiError::internal(format!("unhandled rejection: {:?}", err))
    };
    Ok(api_error.into_reply())
}
