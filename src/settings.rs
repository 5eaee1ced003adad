use serde::{Deserialize, Serialize};
use std::fs;

use crate::webauthn::types::{
    AttestationConveyancePreference, ResidentKeyRequirement, UserVerificationRequirement,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PassrsSettings {
    pub application: ApplicationSettings,
    pub relying_party: RelyingPartySettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelyingPartySettings {
    /// Human-readable relying party name shown in browser prompts
    pub display_name: String,
    /// Ceremony timeout communicated to the browser
    pub timeout_seconds: u32,
    pub user_verification: UserVerificationRequirement,
    pub resident_key: ResidentKeyRequirement,
    pub attestation: AttestationConveyancePreference,
    /// Reject logins whose sign count did not increase. When disabled the
    /// anomaly is logged and the stored count is kept.
    pub enforce_sign_count: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// How long a begun ceremony may wait for its finish call
    pub ceremony_ttl_seconds: u64,
    /// Lifetime of the signed-in cookie issued after login
    pub cookie_duration_hours: u64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for RelyingPartySettings {
    fn default() -> Self {
        Self {
            display_name: "Passrs".to_string(),
            timeout_seconds: 60,
            user_verification: UserVerificationRequirement::Required,
            resident_key: ResidentKeyRequirement::Preferred,
            attestation: AttestationConveyancePreference::None,
            enforce_sign_count: true,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ceremony_ttl_seconds: 300,
            cookie_duration_hours: 24,
            cookie_secure: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PassrsSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Load the .env file (if any) and initialize logging
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `PASSRS_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("PASSRS_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ PASSRS_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_relying_party_env_overrides(&mut settings.relying_party);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for relying party settings
    pub fn apply_relying_party_env_overrides(rp_settings: &mut RelyingPartySettings) {
        if let Ok(display_name) = std::env::var("RP_DISPLAY_NAME") {
            rp_settings.display_name = display_name;
        }
        if let Ok(timeout_str) = std::env::var("RP_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout_str.parse::<u32>() {
                rp_settings.timeout_seconds = timeout;
            }
        }
        if let Ok(enforce_str) = std::env::var("RP_ENFORCE_SIGN_COUNT") {
            if let Ok(enforce) = enforce_str.parse::<bool>() {
                rp_settings.enforce_sign_count = enforce;
            }
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(ttl_str) = std::env::var("CEREMONY_TTL_SECONDS") {
            if let Ok(ttl) = ttl_str.parse::<u64>() {
                session_settings.ceremony_ttl_seconds = ttl;
            }
        }
        if let Ok(duration_str) = std::env::var("COOKIE_DURATION_HOURS") {
            if let Ok(duration) = duration_str.parse::<u64>() {
                session_settings.cookie_duration_hours = duration;
            }
        }
        if let Ok(secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(secure) = secure_str.parse::<bool>() {
                session_settings.cookie_secure = secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }

    /// Ceremony timeout in milliseconds, as communicated to the browser
    #[must_use]
    pub fn ceremony_timeout_ms(&self) -> u32 {
        self.relying_party.timeout_seconds.saturating_mul(1000)
    }
}
