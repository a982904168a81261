pub mod auth;

pub use auth::{attach_auth_middleware, AuthCapability, AuthUser};
