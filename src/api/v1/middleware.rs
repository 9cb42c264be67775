use super::cookie::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use super::error::*;
use crate::application_port::*;
use crate::domain_model::User;
use std::sync::Arc;
use warp::http::header::AUTHORIZATION;
use warp::{Filter, reject};

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Picks the bearer token first and falls back to the cookie. Blank values
/// count as absent.
fn pick_token(header: Option<String>, cookie: Option<String>) -> Option<String> {
    let bearer = header.and_then(|value| {
        value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
    });
    bearer
        .filter(|token| !token.is_empty())
        .or_else(|| cookie.filter(|token| !token.is_empty()))
}

/// Resolves the caller from its access token and hands the `User` to the
/// next filter.
pub fn with_authentication(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (User,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION.as_str())
        .and(warp::cookie::optional::<String>(ACCESS_TOKEN_COOKIE))
        .and_then(move |header: Option<String>, cookie: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let Some(token) = pick_token(header, cookie) else {
                    return Err(reject::custom(ApiError::from(AuthError::Unauthenticated(
                        "you are not logged in".to_string(),
                    ))));
                };
                auth_service
                    .authenticate(&token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)
            }
        })
}

/// Refresh token from its cookie, or from the `X-Refresh-Token` header for
/// clients without a cookie jar. Missing tokens surface as an empty string so
/// the auth service reports them.
pub fn refresh_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(REFRESH_TOKEN_COOKIE)
        .and(warp::header::optional::<String>(REFRESH_TOKEN_HEADER))
        .map(|cookie: Option<String>, header: Option<String>| {
            cookie
                .filter(|token| !token.is_empty())
                .or(header)
                .map(|token| token.trim().to_string())
                .unwrap_or_default()
        })
}
