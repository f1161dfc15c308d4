//! Runtime settings for the filing core.
//!
//! Settings are resolved once at process start and passed by reference into
//! the document assembler and the controllers.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ELSTER_ENV` | (required) | `development`, `testing`, `staging` or `production` |
//! | `CERT_PIN` | 123456 | PIN of the certificate or security token |
//! | `ABRUF_CODE` | LD6LC-FSVEU | Access code used for document retrieval |
//! | `ELSTER_DATENLIEFERANT` | PLACEHOLDER_DATENLIEFERANT | Vendor-assigned data supplier name |
//! | `ELSTER_HERSTELLER_ID` | 74931 | Vendor id registered with ELSTER |
//! | `ELSTER_CERT_PATH` | cert.pfx | Certificate file used when no security token is in use |
//! | `ELSTER_PLUGIN_PATH` | (none) | Directory holding the ERiC plugins |
//!
//! # Example
//!
//! ```rust
//! use elster_transfer::core::{Environment, Settings};
//!
//! let settings = Settings::for_environment(Environment::Testing);
//! assert!(!settings.using_stick);
//! assert!(settings.accept_test_bufa);
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ElsterError;

/// Deployment profile the settings are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ElsterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Environment::Development),
            "testing" => Ok(Environment::Testing),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(ElsterError::Config(format!("unknown environment '{other}'"))),
        }
    }
}

/// Settings for talking to ELSTER through ERiC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environment: Environment,
    pub cert_pin: String,
    /// Certificate file used when `using_stick` is off.
    pub cert_path: PathBuf,
    /// Authenticate with a hardware security token instead of a certificate file.
    pub using_stick: bool,
    /// Mark every submission as a test case.
    pub use_testmerker: bool,
    /// Accept the tax offices reserved for testing.
    pub accept_test_bufa: bool,
    pub abruf_code: String,
    pub debug: bool,
    /// Forward the ERiC log file to the debug log after each session.
    pub log_eric_debug_info: bool,
    /// Always set, but not evaluated by ELSTER.
    pub testing_email_address: String,
    pub elster_datenlieferant: String,
    pub hersteller_id: String,
    pub plugin_path: Option<PathBuf>,
    pub copyright: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            cert_pin: "123456".to_string(),
            cert_path: PathBuf::from("cert.pfx"),
            using_stick: true,
            use_testmerker: true,
            accept_test_bufa: false,
            abruf_code: "LD6LC-FSVEU".to_string(),
            debug: false,
            log_eric_debug_info: false,
            testing_email_address: "steuerlotse_testing@4germany.org".to_string(),
            elster_datenlieferant: "PLACEHOLDER_DATENLIEFERANT".to_string(),
            hersteller_id: "74931".to_string(),
            plugin_path: None,
            copyright: "(C) 2021 DigitalService4Germany".to_string(),
        }
    }
}

impl Settings {
    /// Settings with the defaults of the given profile.
    pub fn for_environment(environment: Environment) -> Self {
        let base = Self {
            environment,
            ..Self::default()
        };
        match environment {
            Environment::Production => Self {
                using_stick: true,
                use_testmerker: false,
                accept_test_bufa: false,
                ..base
            },
            Environment::Staging => Self {
                using_stick: true,
                accept_test_bufa: true,
                ..base
            },
            Environment::Development | Environment::Testing => Self {
                using_stick: false,
                debug: true,
                accept_test_bufa: true,
                ..base
            },
        }
    }

    /// Settings for tests: testing profile, certificate file instead of token.
    pub fn for_testing() -> Self {
        Self::for_environment(Environment::Testing)
    }

    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ElsterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ElsterError> {
        let environment: Environment = lookup("ELSTER_ENV")
            .ok_or_else(|| ElsterError::Config("ELSTER_ENV is not set".to_string()))?
            .parse()?;

        let mut settings = Self::for_environment(environment);
        if let Some(pin) = lookup("CERT_PIN") {
            settings.cert_pin = pin;
        }
        if let Some(code) = lookup("ABRUF_CODE") {
            settings.abruf_code = code;
        }
        if let Some(name) = lookup("ELSTER_DATENLIEFERANT") {
            settings.elster_datenlieferant = name;
        }
        if let Some(id) = lookup("ELSTER_HERSTELLER_ID") {
            settings.hersteller_id = id;
        }
        if let Some(path) = lookup("ELSTER_CERT_PATH") {
            settings.cert_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("ELSTER_PLUGIN_PATH") {
            settings.plugin_path = Some(PathBuf::from(path));
        }

        settings.validate().map_err(|errors| ElsterError::Config(errors.join("; ")))?;
        Ok(settings)
    }

    /// Validates the settings and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.cert_pin.is_empty() {
            errors.push("Certificate PIN cannot be empty".to_string());
        }

        if self.hersteller_id.len() != 5 || !self.hersteller_id.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!(
                "Hersteller id must be 5 digits, got '{}'",
                self.hersteller_id
            ));
        }

        if self.elster_datenlieferant.is_empty() {
            errors.push("Datenlieferant cannot be empty".to_string());
        }

        if self.environment == Environment::Production && self.use_testmerker {
            errors.push("Production must not mark submissions as test cases".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Path handed to ERiC when acquiring a certificate handle: the token
    /// library when a security token is used, the certificate file otherwise.
    pub fn cert_path(&self) -> &Path {
        if self.using_stick {
            Path::new(token_library())
        } else {
            &self.cert_path
        }
    }
}

fn token_library() -> &'static str {
    if cfg!(target_os = "macos") {
        "libaetpkss.dylib"
    } else {
        "libaetpkss.so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn profiles() {
        let prod = Settings::for_environment(Environment::Production);
        assert!(prod.using_stick);
        assert!(!prod.use_testmerker);
        assert!(!prod.accept_test_bufa);

        let staging = Settings::for_environment(Environment::Staging);
        assert!(staging.using_stick);
        assert!(staging.use_testmerker);
        assert!(staging.accept_test_bufa);

        let dev = Settings::for_environment(Environment::Development);
        assert!(!dev.using_stick);
        assert!(dev.debug);
        assert!(dev.accept_test_bufa);
    }

    #[test]
    fn from_lookup_requires_environment() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ElsterError::Config(_)));
    }

    #[test]
    fn from_lookup_rejects_unknown_environment() {
        let err = Settings::from_lookup(lookup(&[("ELSTER_ENV", "qa")])).unwrap_err();
        assert!(err.to_string().contains("unknown environment 'qa'"));
    }

    #[test]
    fn from_lookup_applies_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("ELSTER_ENV", "staging"),
            ("CERT_PIN", "987654"),
            ("ELSTER_HERSTELLER_ID", "12345"),
            ("ELSTER_PLUGIN_PATH", "/opt/eric/plugins2"),
        ]))
        .unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.cert_pin, "987654");
        assert_eq!(settings.hersteller_id, "12345");
        assert_eq!(settings.plugin_path, Some(PathBuf::from("/opt/eric/plugins2")));
    }

    #[test]
    fn invalid_hersteller_id() {
        let settings = Settings {
            hersteller_id: "7493".into(),
            ..Settings::for_testing()
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn cert_path_depends_on_stick() {
        let mut settings = Settings::for_testing();
        settings.cert_path = PathBuf::from("/secrets/cert.pfx");
        assert_eq!(settings.cert_path(), Path::new("/secrets/cert.pfx"));

        settings.using_stick = true;
        assert!(settings.cert_path().to_string_lossy().starts_with("libaetpkss"));
    }

    #[test]
    fn deserializes_partial_settings() {
        let settings: Settings =
            serde_json::from_str(r#"{"environment": "production", "use_testmerker": false}"#).unwrap();
        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.hersteller_id, "74931");
    }
}
