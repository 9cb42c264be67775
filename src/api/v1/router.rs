use super::handler;
use super::middleware::*;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path!("auth" / "register")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_policy.clone()))
        .and_then(handler::login);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::get())
        .and(refresh_token())
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_policy.clone()))
        .and_then(handler::refresh);

    let logout = warp::path!("auth" / "logout")
        .and(warp::get())
        .and(with_authentication(server.auth_service.clone()))
        .and(refresh_token())
        .and(with(server.auth_service.clone()))
        .and(with(server.cookie_policy.clone()))
        .and_then(handler::logout);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_authentication(server.auth_service.clone()))
        .and_then(handler::current_user);

    register
        .or(login)
        .or(refresh)
        .or(logout)
        .or(me)
        .with(warp::trace::request())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
