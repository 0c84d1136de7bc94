use crate::models::ApplicationPaths;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine as _};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory searched for a higher-priority `Settings.toml`
pub const CONFIG_DIR_ENV: &str = "REMOTE_AUTH_CONFIG_DIR";

const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemoteAuthSettings {
    pub application: ApplicationSettings,
    pub paths: ApplicationPaths,
    pub protection: ProtectionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Absolute base URI of the client application, ending in `/`
    pub base_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProtectionSettings {
    /// Base64 master key for state protection (32 bytes once decoded)
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            base_uri: "http://localhost:8080/".to_string(),
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

impl RemoteAuthSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// Priority, highest first:
    /// 1. Environment variables
    /// 2. `Settings.toml` in `REMOTE_AUTH_CONFIG_DIR` (if set and present)
    /// 3. `Settings.toml` in the current directory (if present)
    /// 4. Defaults
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - A settings file cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.application.base_uri = normalize_base_uri(&settings.application.base_uri);

        Ok(settings)
    }

    /// Load `.env` and initialize the logger
    fn initialize_environment() -> Result<()> {
        Self::load_env_file();
        env_logger::try_init().context("Failed to initialize logger")?;
        Ok(())
    }

    fn load_base_settings() -> Result<Self> {
        let mut settings = Self::default();

        if let Some(from_cwd) = Self::read_settings_file(&PathBuf::from(SETTINGS_FILE))? {
            info!("Loaded base settings from {SETTINGS_FILE}");
            settings = from_cwd;
        }

        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            let config_path = Path::new(&config_dir).join(SETTINGS_FILE);
            match Self::read_settings_file(&config_path)? {
                Some(from_dir) => {
                    info!("Overriding settings from {}", config_path.display());
                    settings = from_dir;
                }
                None => info!(
                    "{CONFIG_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    config_path.display()
                ),
            }
        }

        Ok(settings)
    }

    /// Parse a settings file, or `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read_settings_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = basic_toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(settings))
    }

    fn apply_env_overrides(settings: &mut Self) {
        if let Ok(base_uri) = std::env::var("BASE_URI") {
            settings.application.base_uri = base_uri;
        }
        Self::apply_paths_env_overrides(&mut settings.paths);
        Self::apply_protection_env_overrides(&mut settings.protection);
        if let Ok(level) = std::env::var("RUST_LOG") {
            settings.logging.level = level;
        }
    }

    /// Apply `AUTH_<FIELD>_PATH` overrides
    pub fn apply_paths_env_overrides(paths: &mut ApplicationPaths) {
        Self::apply_path_override("AUTH_LOG_IN_PATH", &mut paths.log_in_path);
        Self::apply_path_override("AUTH_LOG_IN_CALLBACK_PATH", &mut paths.log_in_callback_path);
        Self::apply_path_override("AUTH_LOG_IN_FAILED_PATH", &mut paths.log_in_failed_path);
        Self::apply_path_override("AUTH_LOG_OUT_PATH", &mut paths.log_out_path);
        Self::apply_path_override("AUTH_LOG_OUT_CALLBACK_PATH", &mut paths.log_out_callback_path);
        Self::apply_path_override("AUTH_LOG_OUT_FAILED_PATH", &mut paths.log_out_failed_path);
        Self::apply_path_override(
            "AUTH_LOG_OUT_SUCCEEDED_PATH",
            &mut paths.log_out_succeeded_path,
        );
        Self::apply_path_override("AUTH_PROFILE_PATH", &mut paths.profile_path);
        Self::apply_path_override("AUTH_REGISTER_PATH", &mut paths.register_path);
        Self::apply_path_override("AUTH_REMOTE_PROFILE_PATH", &mut paths.remote_profile_path);
        Self::apply_path_override("AUTH_REMOTE_REGISTER_PATH", &mut paths.remote_register_path);
    }

    fn apply_path_override(env_var: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(env_var) {
            *target = Some(value);
        }
    }

    /// Apply `PROTECTION_KEY`, generating a key when none is configured
    pub fn apply_protection_env_overrides(protection: &mut ProtectionSettings) {
        let env_key_set = std::env::var("PROTECTION_KEY").is_ok_and(|key| {
            if key.is_empty() {
                false
            } else {
                protection.key = key;
                true
            }
        });

        if !env_key_set && protection.key.is_empty() {
            protection.key = Self::generate_protection_key();
            warn!(
                "Using an auto-generated protection key; protected state will not survive a \
                 restart. Set PROTECTION_KEY or protection.key in {SETTINGS_FILE}"
            );
        }
    }

    /// 32 random bytes, base64 encoded
    fn generate_protection_key() -> String {
        use rand::RngCore;
        let mut key = [0u8; 32];
        rand::rng().fill_bytes(&mut key);
        general_purpose::STANDARD.encode(key)
    }

    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Configured paths with the built-in defaults filled in
    #[must_use]
    pub fn effective_paths(&self) -> ApplicationPaths {
        self.paths.merged_with(&ApplicationPaths::with_defaults())
    }
}

fn normalize_base_uri(base_uri: &str) -> String {
    let trimmed = base_uri.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const PATH_ENV_VARS: [&str; 11] = [
        "AUTH_LOG_IN_PATH",
        "AUTH_LOG_IN_CALLBACK_PATH",
        "AUTH_LOG_IN_FAILED_PATH",
        "AUTH_LOG_OUT_PATH",
        "AUTH_LOG_OUT_CALLBACK_PATH",
        "AUTH_LOG_OUT_FAILED_PATH",
        "AUTH_LOG_OUT_SUCCEEDED_PATH",
        "AUTH_PROFILE_PATH",
        "AUTH_REGISTER_PATH",
        "AUTH_REMOTE_PROFILE_PATH",
        "AUTH_REMOTE_REGISTER_PATH",
    ];

    fn clean_env_vars() {
        for var in PATH_ENV_VARS {
            std::env::remove_var(var);
        }
        std::env::remove_var("PROTECTION_KEY");
        std::env::remove_var("BASE_URI");
        std::env::remove_var(CONFIG_DIR_ENV);
    }

    #[test]
    fn test_defaults() {
        let settings = RemoteAuthSettings::default();
        assert_eq!(settings.application.base_uri, "http://localhost:8080/");
        assert_eq!(settings.paths, ApplicationPaths::default());
        assert_eq!(settings.protection.key, "");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: RemoteAuthSettings = basic_toml::from_str(
            r#"
            [paths]
            log_in_path = "auth/sign-in"
            remote_profile_path = "https://idp.example/account"
            "#,
        )
        .unwrap();

        assert_eq!(settings.application.base_uri, "http://localhost:8080/");
        assert_eq!(settings.paths.log_in_path.as_deref(), Some("auth/sign-in"));
        assert_eq!(settings.paths.log_out_path, None);

        let effective = settings.effective_paths();
        assert_eq!(effective.log_out_path.as_deref(), Some("authentication/logout"));
        assert_eq!(effective.remote_profile(), Some("https://idp.example/account"));
        assert_eq!(effective.remote_register(), None);
    }

    #[test]
    fn test_read_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[application]\nbase_uri = \"https://app.example/\"\n\n[protection]\nkey = \"abc\""
        )
        .unwrap();

        let settings = RemoteAuthSettings::read_settings_file(file.path())
            .unwrap()
            .unwrap();
        assert_eq!(settings.application.base_uri, "https://app.example/");
        assert_eq!(settings.protection.key, "abc");
    }

    #[test]
    fn test_read_settings_file_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(SETTINGS_FILE);
        assert!(RemoteAuthSettings::read_settings_file(&missing)
            .unwrap()
            .is_none());

        fs::write(&missing, "[application\nbase_uri = ").unwrap();
        assert!(RemoteAuthSettings::read_settings_file(&missing).is_err());
    }

    #[test]
    #[serial]
    fn test_config_dir_overrides_defaults() {
        clean_env_vars();
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[paths]\nlog_out_failed_path = \"auth/logout-error\"\n",
        )
        .unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path());

        let settings = RemoteAuthSettings::load_base_settings().unwrap();
        assert_eq!(
            settings.paths.log_out_failed_path.as_deref(),
            Some("auth/logout-error")
        );

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_path_env_overrides() {
        clean_env_vars();
        std::env::set_var("AUTH_LOG_IN_PATH", "account/login");
        std::env::set_var("AUTH_REMOTE_REGISTER_PATH", "https://idp.example/register");

        let mut paths = ApplicationPaths::default();
        RemoteAuthSettings::apply_paths_env_overrides(&mut paths);

        assert_eq!(paths.log_in_path.as_deref(), Some("account/login"));
        assert_eq!(
            paths.remote_register_path.as_deref(),
            Some("https://idp.example/register")
        );
        assert_eq!(paths.log_out_path, None);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_protection_key_env_override() {
        clean_env_vars();
        std::env::set_var("PROTECTION_KEY", "env-key");

        let mut protection = ProtectionSettings {
            key: "file-key".to_string(),
        };
        RemoteAuthSettings::apply_protection_env_overrides(&mut protection);
        assert_eq!(protection.key, "env-key");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_protection_key_is_generated_when_empty() {
        clean_env_vars();

        let mut protection = ProtectionSettings::default();
        RemoteAuthSettings::apply_protection_env_overrides(&mut protection);

        let decoded = general_purpose::STANDARD.decode(&protection.key).unwrap();
        assert_eq!(decoded.len(), 32);

        let mut configured = ProtectionSettings {
            key: "file-key".to_string(),
        };
        RemoteAuthSettings::apply_protection_env_overrides(&mut configured);
        assert_eq!(configured.key, "file-key");
    }

    #[test]
    fn test_normalize_base_uri() {
        assert_eq!(normalize_base_uri("https://app.example"), "https://app.example/");
        assert_eq!(normalize_base_uri(" https://app.example/ "), "https://app.example/");
    }
}
