//! Session state and the operations that change it.
//!
//! - [`SessionStore`]: observable state (identity, bootstrapping, last error)
//! - [`SessionManager`]: bootstrap, login, logout, refresh, forced clear
//! - [`SessionFacade`]: per-call loading/error flags for UI callers

pub mod facade;
pub mod lifecycle;
pub mod store;

pub use facade::{FacadeStatus, SIGN_IN_FALLBACK_MESSAGE, SIGN_OUT_FALLBACK_MESSAGE, SessionFacade};
pub use lifecycle::{LogoutOutcome, SessionManager};
pub use store::{Session, SessionPhase, SessionStore};

pub(crate) const ME_ENDPOINT: &str = "me";
pub(crate) const LOGIN_ENDPOINT: &str = "login";
pub(crate) const LOGOUT_ENDPOINT: &str = "logout";
