//! Configuration loading for the payment service.
//!
//! TOML files with `${VAR_NAME}` environment substitution, `PAY_`-prefixed
//! environment overrides, and validation after load. Recipient account
//! details are checked here so that a missing or malformed configuration is
//! fatal at startup rather than per-request.

use std::env;
use std::path::Path;
use thiserror::Error;

mod types;

pub use types::{
	AuthConfig, Config, LedgerConfig, PricingConfig, RecipientConfig, ServiceConfig, StorageConfig,
};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "PAY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<Config, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;

		let substituted_content = self.substitute_env_vars(&content)?;

		let config: Config = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.service.log_level = log_level;
		}

		if let Ok(http_port) = env::var(format!("{}HTTP_PORT", self.env_prefix)) {
			config.service.http_port = http_port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid HTTP port: {}", e)))?;
		}

		if let Ok(admin_token) = env::var(format!("{}ADMIN_TOKEN", self.env_prefix)) {
			config.auth.admin_token = admin_token;
		}

		Ok(())
	}

	fn validate_config(&self, config: &Config) -> Result<(), ConfigError> {
		if config.recipient.account.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"Recipient account must not be empty".to_string(),
			));
		}

		if config.recipient.name.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"Recipient name must not be empty".to_string(),
			));
		}

		// The IPS payload is pipe-delimited; a pipe in any recipient field
		// would corrupt every encoded payload.
		for (field, value) in [
			("recipient.account", &config.recipient.account),
			("recipient.name", &config.recipient.name),
			("recipient.label", &config.recipient.label),
		] {
			if value.contains('|') {
				return Err(ConfigError::ValidationError(format!(
					"{} must not contain the '|' delimiter",
					field
				)));
			}
		}

		if config.ledger.ttl_hours == 0 {
			return Err(ConfigError::ValidationError(
				"Ledger TTL must be at least one hour".to_string(),
			));
		}

		if config.ledger.reference_max_len < 16 {
			return Err(ConfigError::ValidationError(
				"Reference length limit too small to hold a generated reference".to_string(),
			));
		}

		for (purpose, amount) in [
			("subscription", config.pricing.subscription),
			("contact_reveal", config.pricing.contact_reveal),
			("priority_listing", config.pricing.priority_listing),
			("urgent_listing", config.pricing.urgent_listing),
		] {
			if amount == 0 {
				return Err(ConfigError::ValidationError(format!(
					"Price for {} must be positive",
					purpose
				)));
			}
		}

		match config.storage.backend.as_str() {
			"memory" | "file" => {}
			other => {
				return Err(ConfigError::ValidationError(format!(
					"Unknown storage backend: {}",
					other
				)));
			}
		}

		if config.auth.admin_token.trim().is_empty() {
			return Err(ConfigError::ValidationError(
				"Admin token must not be empty".to_string(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const VALID: &str = r#"
[service]
name = "ips-pay"
http_port = 8080

[ledger]
ttl_hours = 24

[recipient]
account = "265104031000361092"
name = "Primer DOO Beograd"
label = "Primer DOO"

[auth]
admin_token = "test-admin-token"
"#;

	fn write_config(content: &str) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	#[tokio::test]
	async fn test_load_valid_config_with_defaults() {
		let file = write_config(VALID);
		let config = ConfigLoader::new().with_file(file.path()).load().await.unwrap();

		assert_eq!(config.service.name, "ips-pay");
		assert_eq!(config.ledger.ttl_hours, 24);
		assert_eq!(config.ledger.reference_max_len, 25);
		assert_eq!(config.ledger.sweep_interval_secs, 60);
		assert_eq!(config.pricing.contact_reveal, 300);
		assert_eq!(config.storage.backend, "memory");
	}

	#[tokio::test]
	async fn test_env_substitution() {
		env::set_var("PAY_TEST_SUBST_TOKEN", "from-env");
		let content = VALID.replace("test-admin-token", "${PAY_TEST_SUBST_TOKEN}");
		let file = write_config(&content);
		let config = ConfigLoader::new().with_file(file.path()).load().await.unwrap();
		assert_eq!(config.auth.admin_token, "from-env");
	}

	#[tokio::test]
	async fn test_missing_env_var_is_an_error() {
		let content = VALID.replace("test-admin-token", "${PAY_TEST_DOES_NOT_EXIST}");
		let file = write_config(&content);
		let err = ConfigLoader::new().with_file(file.path()).load().await.unwrap_err();
		assert!(matches!(err, ConfigError::EnvVarNotFound(_)));
	}

	#[tokio::test]
	async fn test_pipe_in_recipient_rejected() {
		let content = VALID.replace("Primer DOO Beograd", "Primer|DOO");
		let file = write_config(&content);
		let err = ConfigLoader::new().with_file(file.path()).load().await.unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(_)));
	}

	#[tokio::test]
	async fn test_empty_recipient_account_rejected() {
		let content = VALID.replace("265104031000361092", "");
		let file = write_config(&content);
		let err = ConfigLoader::new().with_file(file.path()).load().await.unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(_)));
	}
}
