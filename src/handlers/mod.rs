// HTTP request handlers for the passkey service
pub mod health;
pub mod passkey;

// Re-export the main handler functions
pub use health::health;
pub use passkey::{begin_login, begin_registration, finish_login, finish_registration};
