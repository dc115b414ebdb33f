use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use clap::{Parser, Subcommand};
use pay_config::ConfigLoader;
use pay_ledger::{LedgerService, Pricing};
use pay_qr::RecipientAccount;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod sweeper;

#[derive(Parser)]
#[command(name = "pay-service")]
#[command(about = "IPS payment ledger service", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "PAY_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the payment service
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("Starting IPS payment ledger service");
	info!("Loading configuration from: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration loaded successfully");
	info!("Service name: {}", config.service.name);
	info!("HTTP port: {}", config.service.http_port);
	info!("Storage backend: {}", config.storage.backend);

	let store = pay_storage::create_store(&config.storage.backend, &config.storage.path)
		.await
		.context("Failed to open ledger store")?;

	let ledger = Arc::new(LedgerService::new(
		store,
		Pricing::from(&config.pricing),
		ChronoDuration::hours(config.ledger.ttl_hours as i64),
		config.ledger.reference_max_len,
	));

	let state = api::AppState {
		ledger: ledger.clone(),
		recipient: RecipientAccount {
			account: config.recipient.account.clone(),
			name: config.recipient.name.clone(),
			label: config.recipient.label.clone(),
		},
		admin_token: config.auth.admin_token.clone(),
	};

	let http_port = config.service.http_port;
	let http_handle = tokio::spawn(async move { api::start_http_server(state, http_port).await });

	let sweep_interval = Duration::from_secs(config.ledger.sweep_interval_secs);
	let sweep_ledger = ledger.clone();
	let sweep_handle = tokio::spawn(async move { sweeper::run(sweep_ledger, sweep_interval).await });

	info!("IPS payment ledger service started successfully");

	shutdown_signal().await;

	info!("Shutdown signal received, stopping services...");

	http_handle.abort();
	sweep_handle.abort();

	info!("IPS payment ledger service stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("Service name: {}", config.service.name);
	info!("Recipient: {} ({})", config.recipient.name, config.recipient.account);
	info!(
		"Ledger: ttl {}h, reference limit {}, sweep every {}s",
		config.ledger.ttl_hours,
		config.ledger.reference_max_len,
		config.ledger.sweep_interval_secs
	);

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
