pub mod config;
pub mod session;
pub mod storage;

pub use config::ConfigError;
pub use session::SessionError;
pub use storage::StorageError;
