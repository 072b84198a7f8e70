pub mod middleware;
pub mod oauth;
pub mod session;

pub use middleware::{OptionalAuth, RequireAdmin, RequireAuth};
pub use session::SessionClaims;
