pub mod require_role;
pub mod session_auth;

pub use require_role::RequireRole;
pub use session_auth::{SessionAuthMiddleware, SessionAuthenticator, SessionToken};
