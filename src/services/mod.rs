pub mod auth;

pub use auth::{AuthService, Claims, TokenKind, TokenPair};
