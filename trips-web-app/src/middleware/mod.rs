pub mod session;

pub use session::{ApiSession, SessionContext, ViewSession, SESSION_COOKIE};
