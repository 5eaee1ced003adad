//! `WebAuthn` error types
//!
//! One variant per distinct failure kind so the transport layer can pick
//! an HTTP status without parsing message strings.

use std::fmt;

/// Failures that can occur during a registration or login ceremony
#[derive(Debug)]
pub enum WebAuthnError {
    /// Invalid relying-party configuration (e.g. empty RPID or origin)
    Configuration(String),

    /// Malformed JSON body or a missing/undecodable required field
    InvalidPayload(String),

    /// Ceremony session missing, already consumed, or expired
    SessionNotFound,

    /// `clientDataJSON.type` was not the expected ceremony type
    ClientDataTypeMismatch,

    /// `clientDataJSON.origin` did not exactly match the session origin
    OriginMismatch,

    /// Challenge in `clientDataJSON` did not match the session challenge
    ChallengeMismatch,

    /// SHA-256 of the session RPID did not match the authenticator data
    RpIdHashMismatch,

    /// The user-verified flag was absent although verification is required
    UserVerificationRequired,

    /// Asserted credential ID is not among the user's credentials
    UnknownCredential,

    /// Assertion signature did not verify against the stored public key
    SignatureVerificationFailed,

    /// Stored public key is not an ECDSA P-256 or RSA key
    UnsupportedKeyType,

    /// Login attempted for an account with zero passkeys
    NoEnrolledCredential,

    /// Non-zero sign count did not increase: possible cloned authenticator
    ClonedAuthenticator { stored: u32, received: u32 },

    /// The system random source failed; never downgraded to a weaker source
    RandomSourceFailure,
}

impl fmt::Display for WebAuthnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebAuthnError::Configuration(msg) => write!(f, "invalid configuration: {msg}"),
            WebAuthnError::InvalidPayload(msg) => write!(f, "invalid request payload: {msg}"),
            WebAuthnError::SessionNotFound => write!(f, "ceremony session not found or expired"),
            WebAuthnError::ClientDataTypeMismatch => write!(f, "unexpected client data type"),
            WebAuthnError::OriginMismatch => write!(f, "origin mismatch"),
            WebAuthnError::ChallengeMismatch => write!(f, "challenge mismatch"),
            WebAuthnError::RpIdHashMismatch => write!(f, "relying party ID hash mismatch"),
            WebAuthnError::UserVerificationRequired => {
                write!(f, "user verification required but not performed")
            }
            WebAuthnError::UnknownCredential => write!(f, "unknown credential"),
            WebAuthnError::SignatureVerificationFailed => {
                write!(f, "signature verification failed")
            }
            WebAuthnError::UnsupportedKeyType => write!(f, "unsupported public key type"),
            WebAuthnError::NoEnrolledCredential => write!(f, "no passkey enrolled"),
            WebAuthnError::ClonedAuthenticator { stored, received } => write!(
                f,
                "possible cloned authenticator: sign count {received} not above stored {stored}"
            ),
            WebAuthnError::RandomSourceFailure => write!(f, "system random source failed"),
        }
    }
}

impl std::error::Error for WebAuthnError {}
