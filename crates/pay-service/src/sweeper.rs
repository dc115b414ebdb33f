//! Background expiry sweep.

use pay_ledger::LedgerService;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Runs `sweep_expired` on a fixed cadence until the task is aborted.
///
/// The sweep is idempotent and only ever moves pending intents past their
/// deadline to `Expired`, so any cadence is safe; the read-time guard in
/// the ledger covers intents that expire between ticks.
pub async fn run(ledger: Arc<LedgerService>, interval: Duration) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;
		if let Err(e) = ledger.sweep_expired().await {
			error!(error = %e, "expiry sweep failed");
		}
	}
}
