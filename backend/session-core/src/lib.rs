pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod tests;

pub use config::{AuthStrategy, SessionConfig};
pub use error::SessionError;
pub use session::{
    FacadeStatus, LogoutOutcome, Session, SessionFacade, SessionManager, SessionPhase,
    SessionStore,
};

pub const DEFAULT_API_HOSTNAME: &str = "localhost";
pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_API_BASE_URL: &str =
    const_format::concatcp!("http://", DEFAULT_API_HOSTNAME, ":", DEFAULT_API_PORT, "/");
