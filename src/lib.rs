#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the passrs application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod handlers;
pub mod models;
pub mod settings;
pub mod webauthn;

/// Re-export commonly used items
pub use handlers::{begin_login, begin_registration, finish_login, finish_registration, health};
pub use models::UserStore;
pub use settings::PassrsSettings;
pub use webauthn::{RelyingParty, SessionStore, WebAuthnError};
