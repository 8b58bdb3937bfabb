pub mod auth;

pub use auth::{auth_middleware, authenticate, bearer_token, AuthUser, MaybeAuthUser};
