mod argon2_hasher;
mod auth_service_impl;
mod jwt_codec;
mod token_service_impl;
mod user_service_impl;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use jwt_codec::*;
pub use token_service_impl::*;
pub use user_service_impl::*;
