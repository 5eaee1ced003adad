//! Hand-rolled `WebAuthn` relying-party engine
//!
//! Implements the registration and login ceremonies directly: option
//! building, ceremony session lifecycle, client response verification,
//! and assertion signature checks for ES256 and RS256 credentials.

pub mod crypto;
pub mod errors;
pub mod service;
pub mod session;
pub mod types;

pub use crypto::VerifierKey;
pub use errors::WebAuthnError;
pub use service::{RelyingParty, RpConfig};
pub use session::{PendingCeremony, SessionStore};
pub use types::Credential;
