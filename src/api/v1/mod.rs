mod cookie;
mod error;
mod handler;
mod middleware;
mod router;

pub use cookie::CookiePolicy;
pub use error::recover_error;
pub use router::routes;
