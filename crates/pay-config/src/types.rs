//! Configuration types for the payment service.

use serde::{Deserialize, Serialize};

/// Top-level service configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub service: ServiceConfig,
	pub ledger: LedgerConfig,
	pub recipient: RecipientConfig,
	#[serde(default)]
	pub pricing: PricingConfig,
	#[serde(default)]
	pub storage: StorageConfig,
	pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
	pub name: String,
	#[serde(default = "default_http_port")]
	pub http_port: u16,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
	/// Completion window for a pending intent, in hours.
	#[serde(default = "default_ttl_hours")]
	pub ttl_hours: u64,
	/// Maximum reference length accepted by the IPS `RO` field.
	/// Carried as configuration; consult the current NBS IPS QR
	/// specification for the exact limit.
	#[serde(default = "default_reference_max_len")]
	pub reference_max_len: usize,
	/// Cadence of the background expiry sweep, in seconds.
	#[serde(default = "default_sweep_interval_secs")]
	pub sweep_interval_secs: u64,
}

impl Default for LedgerConfig {
	fn default() -> Self {
		Self {
			ttl_hours: default_ttl_hours(),
			reference_max_len: default_reference_max_len(),
			sweep_interval_secs: default_sweep_interval_secs(),
		}
	}
}

/// Fixed recipient account details embedded in every QR payload.
/// Process-wide, not per-intent; missing or malformed values are fatal at
/// startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientConfig {
	/// Recipient bank account number for the `R` field.
	pub account: String,
	/// Recipient display name for the `N` field.
	pub name: String,
	/// Payer-or-recipient label for the `P` field.
	pub label: String,
}

/// Default amounts per purpose, whole RSD. TOPUP has no default; callers
/// must supply the amount explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
	pub subscription: u64,
	pub contact_reveal: u64,
	pub priority_listing: u64,
	pub urgent_listing: u64,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			subscription: 2400,
			contact_reveal: 300,
			priority_listing: 500,
			urgent_listing: 800,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
	/// `memory` or `file`.
	#[serde(default = "default_storage_backend")]
	pub backend: String,
	/// Base directory for the file backend.
	#[serde(default = "default_storage_path")]
	pub path: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: default_storage_backend(),
			path: default_storage_path(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
	/// Bearer token granting the admin capability (verify endpoint).
	pub admin_token: String,
}

fn default_http_port() -> u16 {
	8080
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_ttl_hours() -> u64 {
	24
}

fn default_reference_max_len() -> usize {
	25
}

fn default_sweep_interval_secs() -> u64 {
	60
}

fn default_storage_backend() -> String {
	"memory".to_string()
}

fn default_storage_path() -> String {
	"./data/ledger".to_string()
}
