//! `WebAuthn` protocol types
//!
//! Wire vocabulary for the registration and login ceremonies: the option
//! structures returned to the browser, the client response shapes posted
//! back, and the stored credential. Binary fields are base64url encoded
//! (no padding) on the wire, matching the browser's JSON serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde helpers for base64url-encoded byte fields.
pub mod base64url {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Encode bytes as a base64url string without padding.
    ///
    /// # Errors
    /// Returns a serialization error if the underlying serializer fails.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Decode a base64url string without padding into bytes.
    ///
    /// # Errors
    /// Returns a deserialization error if the string is not valid base64url.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Resident-key requirement communicated in authenticator selection
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    Discouraged,
    Preferred,
    Required,
}

/// User-verification requirement for a ceremony
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    Required,
    Preferred,
    Discouraged,
}

/// Attestation conveyance preference sent to the browser
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    None,
    Indirect,
    Direct,
}

impl AttestationConveyancePreference {
    /// String tag stored on credentials as the informational attestation type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Indirect => "indirect",
            Self::Direct => "direct",
        }
    }
}

/// Relying party information
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: String,
}

/// User entity included in creation options
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserEntity {
    #[serde(with = "base64url")]
    pub id: Vec<u8>,
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// Allowed credential algorithm (always type "public-key")
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub r#type: String,
    pub alg: i32,
}

/// Reference to an existing credential by ID
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(with = "base64url")]
    pub id: Vec<u8>,
}

impl CredentialDescriptor {
    #[must_use]
    pub fn public_key(id: &[u8]) -> Self {
        Self {
            r#type: "public-key".to_string(),
            id: id.to_vec(),
        }
    }
}

/// Authenticator selection criteria for registration
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthenticatorSelection {
    #[serde(rename = "residentKey")]
    pub resident_key: ResidentKeyRequirement,
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
}

/// Options returned to the browser for `navigator.credentials.create`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreationOptions {
    #[serde(with = "base64url")]
    pub challenge: Vec<u8>,
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    #[serde(rename = "pubKeyCredParams")]
    pub pub_key_cred_params: Vec<CredentialParameter>,
    #[serde(
        rename = "excludeCredentials",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    pub timeout: u32,
    pub attestation: AttestationConveyancePreference,
    #[serde(rename = "authenticatorSelection")]
    pub authenticator_selection: AuthenticatorSelection,
}

/// Options returned to the browser for `navigator.credentials.get`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RequestOptions {
    #[serde(with = "base64url")]
    pub challenge: Vec<u8>,
    #[serde(rename = "rpId")]
    pub rp_id: String,
    pub timeout: u32,
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
    #[serde(rename = "allowCredentials")]
    pub allow_credentials: Vec<CredentialDescriptor>,
}

/// Parsed `clientDataJSON` contents
#[derive(Deserialize, Debug)]
pub struct CollectedClientData {
    #[serde(rename = "type")]
    pub r#type: String,
    pub challenge: String,
    pub origin: String,
}

/// Registration response posted by the browser
#[derive(Deserialize, Debug)]
pub struct RegistrationResponse {
    #[serde(rename = "rawId", with = "base64url")]
    pub raw_id: Vec<u8>,
    pub response: AttestationResponseBody,
}

/// Attestation response body from `navigator.credentials.create`
///
/// The attestation object itself is ignored: the browser-reported public
/// key is trusted for the credential being registered, so no attestation
/// statement verification happens here.
#[derive(Deserialize, Debug)]
pub struct AttestationResponseBody {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(default)]
    pub transports: Vec<String>,
}

/// Assertion response posted by the browser during login
#[derive(Deserialize, Debug)]
pub struct AssertionResponse {
    #[serde(rename = "rawId", with = "base64url")]
    pub raw_id: Vec<u8>,
    pub response: AssertionResponseBody,
}

/// Assertion response body from `navigator.credentials.get`
#[derive(Deserialize, Debug)]
pub struct AssertionResponseBody {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    pub signature: String,
}

/// A stored passkey credential
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credential {
    #[serde(with = "base64url")]
    pub id: Vec<u8>,
    /// DER-encoded SubjectPublicKeyInfo as reported by the browser
    #[serde(with = "base64url")]
    pub public_key: Vec<u8>,
    pub attestation_type: String,
    pub transports: Vec<String>,
    pub sign_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

/// In-flight ceremony state, created by `begin_*` and consumed exactly
/// once by the matching `finish_*` call.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionData {
    #[serde(with = "base64url")]
    pub challenge: Vec<u8>,
    #[serde(with = "base64url")]
    pub user_id: Vec<u8>,
    pub rp_id: String,
    pub origin: String,
    /// Credential IDs offered in `allowCredentials` (login only)
    pub allowed_credential_ids: Vec<Vec<u8>>,
    pub user_verification: UserVerificationRequirement,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_creation_options(exclude: Vec<CredentialDescriptor>) -> CreationOptions {
        CreationOptions {
            challenge: vec![1, 2, 3],
            rp: RelyingPartyEntity {
                id: "example.test".to_string(),
                name: "Example".to_string(),
            },
            user: UserEntity {
                id: b"user-1".to_vec(),
                name: "alice@example.test".to_string(),
                display_name: "alice@example.test".to_string(),
            },
            pub_key_cred_params: vec![CredentialParameter {
                r#type: "public-key".to_string(),
                alg: -7,
            }],
            exclude_credentials: exclude,
            timeout: 60000,
            attestation: AttestationConveyancePreference::None,
            authenticator_selection: AuthenticatorSelection {
                resident_key: ResidentKeyRequirement::Preferred,
                user_verification: UserVerificationRequirement::Required,
            },
        }
    }

    #[test]
    fn creation_options_serialize_with_webauthn_field_names() {
        let options = sample_creation_options(vec![CredentialDescriptor::public_key(b"cred")]);

        let json = serde_json::to_value(&options).expect("options serialize");
        assert_eq!(json["challenge"], "AQID");
        assert_eq!(json["pubKeyCredParams"][0]["alg"], -7);
        assert_eq!(json["user"]["displayName"], "alice@example.test");
        assert_eq!(json["attestation"], "none");
        assert_eq!(json["authenticatorSelection"]["residentKey"], "preferred");
        assert_eq!(
            json["authenticatorSelection"]["userVerification"],
            "required"
        );
        assert_eq!(json["excludeCredentials"][0]["type"], "public-key");
    }

    #[test]
    fn empty_exclude_credentials_is_omitted() {
        let options = sample_creation_options(Vec::new());

        let json = serde_json::to_value(&options).expect("options serialize");
        assert!(json.get("excludeCredentials").is_none());
    }

    #[test]
    fn registration_response_parses_browser_payload() {
        let body = serde_json::json!({
            "id": "Y3JlZA",
            "rawId": "Y3JlZA",
            "type": "public-key",
            "response": {
                "clientDataJSON": "e30",
                "attestationObject": "ignored",
                "publicKey": "cHVibGljLWtleQ",
                "transports": ["internal", "hybrid"]
            }
        });

        let parsed: RegistrationResponse =
            serde_json::from_value(body).expect("registration response parses");
        assert_eq!(parsed.raw_id, b"cred");
        assert_eq!(parsed.response.transports, vec!["internal", "hybrid"]);
    }

    #[test]
    fn assertion_response_requires_signature() {
        let body = serde_json::json!({
            "rawId": "Y3JlZA",
            "response": {
                "clientDataJSON": "e30",
                "authenticatorData": "AAAA"
            }
        });

        assert!(serde_json::from_value::<AssertionResponse>(body).is_err());
    }
}
