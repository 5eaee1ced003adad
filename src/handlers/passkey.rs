//! Passkey ceremony handlers
//!
//! Four endpoints drive the two ceremonies: `options` calls return the
//! browser options together with an opaque session identifier, `finish`
//! calls consume that session (via the `session` query parameter) and
//! verify the browser's response. Verification failures are logged with
//! detail server-side; clients get a generic message.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{User, UserStore};
use crate::settings::PassrsSettings;
use crate::webauthn::errors::WebAuthnError;
use crate::webauthn::service::{RelyingParty, RpConfig};
use crate::webauthn::session::{PendingCeremony, SessionStore};

/// Cookie holding the signed-in user identifier
pub const COOKIE_NAME: &str = "sid";

/// Email request body for both `options` endpoints
#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// Query parameters for both `finish` endpoints
#[derive(Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session: String,
}

/// Build the relying party for this request.
///
/// RPID is the request host without the port; the ceremony origin is
/// `scheme://host` with the port kept, which is what the browser reports
/// in `clientDataJSON`.
fn relying_party(
    req: &HttpRequest,
    settings: &PassrsSettings,
) -> Result<RelyingParty, WebAuthnError> {
    let connection_info = req.connection_info();
    let host = connection_info.host();
    let rp_id = host.split(':').next().unwrap_or_default();

    RelyingParty::new(RpConfig {
        rp_id: rp_id.to_string(),
        rp_name: settings.relying_party.display_name.clone(),
        origin: format!("{}://{host}", connection_info.scheme()),
        timeout_ms: settings.ceremony_timeout_ms(),
        resident_key: settings.relying_party.resident_key,
        user_verification: settings.relying_party.user_verification,
        attestation: settings.relying_party.attestation,
        enforce_sign_count: settings.relying_party.enforce_sign_count,
    })
}

fn bad_request(error: &str, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": error, "message": message }))
}

fn options_response(session_id: &str, options: &impl serde::Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "session_id": session_id, "options": options }))
}

/// Success response for both finish endpoints: sign the user in and send
/// the browser home.
fn redirect_response(user: &User, settings: &PassrsSettings) -> HttpResponse {
    let duration_hours = i64::try_from(settings.session.cookie_duration_hours).unwrap_or(24);
    let cookie = Cookie::build(COOKIE_NAME, user.id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.session.cookie_secure)
        .max_age(CookieDuration::hours(duration_hours))
        .finish();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "redirect": "/" }))
}

fn validated_email(body: &web::Json<EmailRequest>) -> Result<String, HttpResponse> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(bad_request("invalid_email", "email is required"));
    }
    Ok(email.to_string())
}

/// Start passkey registration: create or look up the account, build
/// creation options, and stash the ceremony state.
pub async fn begin_registration(
    req: HttpRequest,
    body: web::Json<EmailRequest>,
    settings: web::Data<PassrsSettings>,
    users: web::Data<UserStore>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let email = match validated_email(&body) {
        Ok(email) => email,
        Err(response) => return Ok(response),
    };
    let user = users.find_or_create_by_email(&email);

    let rp = match relying_party(&req, &settings) {
        Ok(rp) => rp,
        Err(err) => {
            log::error!("failed to configure relying party: {err}");
            return Ok(bad_request("rp_unavailable", "passkeys unavailable for host"));
        }
    };

    let (options, data) = match rp.begin_registration(
        user.id.as_bytes(),
        &user.email,
        &user.email,
        &user.credentials,
    ) {
        Ok(result) => result,
        Err(err) => {
            log::error!("failed to build registration options: {err}");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "registration_failed",
                "message": "unable to start registration"
            })));
        }
    };

    let ceremony = PendingCeremony {
        user_id: user.id.to_string(),
        data,
    };
    match sessions.save(ceremony) {
        Ok(session_id) => Ok(options_response(&session_id, &options)),
        Err(err) => {
            log::error!("failed to store registration session: {err}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "registration_failed",
                "message": "unable to start registration"
            })))
        }
    }
}

/// Complete passkey registration: consume the ceremony session, verify
/// the attestation response, and store the credential.
pub async fn finish_registration(
    req: HttpRequest,
    query: web::Query<SessionQuery>,
    body: web::Bytes,
    settings: web::Data<PassrsSettings>,
    users: web::Data<UserStore>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let Some(ceremony) = sessions.take(&query.session) else {
        return Ok(bad_request("session_expired", "registration session expired"));
    };

    let Some(mut user) = lookup_ceremony_user(&users, &ceremony) else {
        return Ok(bad_request(
            "registration_failed",
            "unable to complete registration",
        ));
    };

    let rp = match relying_party(&req, &settings) {
        Ok(rp) => rp,
        Err(err) => {
            log::error!("failed to configure relying party: {err}");
            return Ok(bad_request("rp_unavailable", "passkeys unavailable for host"));
        }
    };

    let credential = match rp.finish_registration(&ceremony.data, &body) {
        Ok(credential) => credential,
        Err(err) => {
            log::warn!("passkey registration failed: {err}");
            return Ok(bad_request("validation_failed", "passkey validation failed"));
        }
    };

    user.upsert_credential(credential);
    users.update(user.clone());

    Ok(redirect_response(&user, &settings))
}

/// Start passkey login: look up the account and build request options
/// listing its enrolled credentials.
pub async fn begin_login(
    req: HttpRequest,
    body: web::Json<EmailRequest>,
    settings: web::Data<PassrsSettings>,
    users: web::Data<UserStore>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let email = match validated_email(&body) {
        Ok(email) => email,
        Err(response) => return Ok(response),
    };
    let Some(user) = users.get_by_email(&email) else {
        return Ok(bad_request(
            "unknown_account",
            "no account found for that email",
        ));
    };

    let rp = match relying_party(&req, &settings) {
        Ok(rp) => rp,
        Err(err) => {
            log::error!("failed to configure relying party: {err}");
            return Ok(bad_request("rp_unavailable", "passkeys unavailable for host"));
        }
    };

    let (options, data) = match rp.begin_login(user.id.as_bytes(), &user.credentials) {
        Ok(result) => result,
        Err(WebAuthnError::NoEnrolledCredential) => {
            return Ok(bad_request("no_passkey", "create a passkey first"));
        }
        Err(err) => {
            log::error!("failed to build login options: {err}");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "login_failed",
                "message": "unable to start login"
            })));
        }
    };

    let ceremony = PendingCeremony {
        user_id: user.id.to_string(),
        data,
    };
    match sessions.save(ceremony) {
        Ok(session_id) => Ok(options_response(&session_id, &options)),
        Err(err) => {
            log::error!("failed to store login session: {err}");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "login_failed",
                "message": "unable to start login"
            })))
        }
    }
}

/// Complete passkey login: consume the ceremony session, verify the
/// assertion, persist the updated sign count, and sign the user in.
pub async fn finish_login(
    req: HttpRequest,
    query: web::Query<SessionQuery>,
    body: web::Bytes,
    settings: web::Data<PassrsSettings>,
    users: web::Data<UserStore>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let Some(ceremony) = sessions.take(&query.session) else {
        return Ok(bad_request("session_expired", "login session expired"));
    };

    let Some(mut user) = lookup_ceremony_user(&users, &ceremony) else {
        return Ok(bad_request("login_failed", "unable to complete login"));
    };

    let rp = match relying_party(&req, &settings) {
        Ok(rp) => rp,
        Err(err) => {
            log::error!("failed to configure relying party: {err}");
            return Ok(bad_request("rp_unavailable", "passkeys unavailable for host"));
        }
    };

    let updated = match rp.finish_login(&ceremony.data, &user.credentials, &body) {
        Ok(credential) => credential,
        Err(err) => {
            log::warn!("passkey verification failed: {err}");
            return Ok(HttpResponse::Unauthorized()
                .json(json!({ "error": "login_failed", "message": "login failed" })));
        }
    };

    user.upsert_credential(updated);
    users.update(user.clone());

    Ok(redirect_response(&user, &settings))
}

fn lookup_ceremony_user(users: &UserStore, ceremony: &PendingCeremony) -> Option<User> {
    let id = match Uuid::parse_str(&ceremony.user_id) {
        Ok(id) => id,
        Err(err) => {
            log::error!("malformed user id in ceremony session: {err}");
            return None;
        }
    };
    let user = users.get_by_id(id);
    if user.is_none() {
        log::error!("user {id} not found for ceremony session");
    }
    user
}
