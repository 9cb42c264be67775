use super::cookie::*;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use ::cookie::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Reply, reject};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DataResponse<T> {
    status: &'static str,
    data: T,
}

#[derive(Debug, Serialize)]
struct TokenResponse<'a> {
    status: &'static str,
    access_token: &'a str,
}

#[derive(Debug, Serialize)]
struct UserEnvelope<T> {
    user: T,
}

#[derive(Debug, Serialize)]
struct RegisteredUser<'a> {
    username: &'a str,
    password: &'a str,
    create_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CurrentUser<'a> {
    id: UserId,
    username: &'a str,
    create_at: DateTime<Utc>,
}

fn respond<T: Serialize>(
    body: &T,
    status: StatusCode,
    cookies: Vec<Cookie<'static>>,
) -> Response {
    let mut response =
        warp::reply::with_status(warp::reply::json(body), status).into_response();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => return ApiError::internal(e).into_reply().into_response(),
        }
    }
    response
}

fn reject_with(error: AuthError) -> warp::Rejection {
    reject::custom(ApiError::from(error))
}

pub async fn register(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl Reply, warp::Rejection> {
    let input = SignupInput {
        username: body.username,
        password: body.password,
    };
    let user = auth_service.signup(input).await.map_err(reject_with)?;

    let response = DataResponse {
        status: "success",
        data: UserEnvelope {
            user: RegisteredUser {
                username: &user.username,
                password: &user.password_hash,
                create_at: user.created_at,
            },
        },
    };
    Ok(respond(&response, StatusCode::CREATED, Vec::new()))
}

pub async fn login(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: Arc<CookiePolicy>,
) -> Result<impl Reply, warp::Rejection> {
    let input = LoginInput {
        username: body.username,
        password: body.password,
    };
    let LoginResult { tokens, .. } = auth_service.login(input).await.map_err(reject_with)?;

    let cookies = vec![
        cookie_policy.until(
            ACCESS_TOKEN_COOKIE,
            &tokens.access_token.0,
            tokens.access_token_expires_at,
            true,
        ),
        cookie_policy.until(
            REFRESH_TOKEN_COOKIE,
            &tokens.refresh_token.0,
            tokens.refresh_token_expires_at,
            true,
        ),
        cookie_policy.until(
            LOGGED_IN_COOKIE,
            "true",
            tokens.access_token_expires_at,
            false,
        ),
    ];
    let response = TokenResponse {
        status: "success",
        access_token: &tokens.access_token.0,
    };
    Ok(respond(&response, StatusCode::OK, cookies))
}

pub async fn refresh(
    refresh_token: String,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: Arc<CookiePolicy>,
) -> Result<impl Reply, warp::Rejection> {
    let result = auth_service
        .refresh(&refresh_token)
        .await
        .map_err(reject_with)?;

    let mut cookies = vec![
        cookie_policy.until(
            ACCESS_TOKEN_COOKIE,
            &result.access_token.0,
            result.access_token_expires_at,
            true,
        ),
        cookie_policy.until(
            LOGGED_IN_COOKIE,
            "true",
            result.access_token_expires_at,
            false,
        ),
    ];
    if let Some((rotated, expires_at)) = &result.rotated {
        cookies.push(cookie_policy.until(REFRESH_TOKEN_COOKIE, &rotated.0, *expires_at, true));
    }
    let response = TokenResponse {
        status: "success",
        access_token: &result.access_token.0,
    };
    Ok(respond(&response, StatusCode::OK, cookies))
}

pub async fn logout(
    user: User,
    refresh_token: String,
    auth_service: Arc<dyn AuthService>,
    cookie_policy: Arc<CookiePolicy>,
) -> Result<impl Reply, warp::Rejection> {
    auth_service
        .logout(&user, &refresh_token)
        .await
        .map_err(reject_with)?;

    let cookies = vec![
        cookie_policy.clear(ACCESS_TOKEN_COOKIE, true),
        cookie_policy.clear(REFRESH_TOKEN_COOKIE, true),
        cookie_policy.clear(LOGGED_IN_COOKIE, false),
    ];
    Ok(respond(
        &StatusResponse { status: "success" },
        StatusCode::OK,
        cookies,
    ))
}

pub async fn current_user(user: User) -> Result<impl Reply, warp::Rejection> {
    let response = DataResponse {
        status: "success",
        data: UserEnvelope {
            user: CurrentUser {
                id: user.id,
                username: &user.username,
                create_at: user.created_at,
            },
        },
    };
    Ok(respond(&response, StatusCode::OK, Vec::new()))
}
