//! The payment ledger: sole owner of payment-intent state transitions.
//!
//! Every operation takes an explicit [`Caller`]; ownership and the admin
//! capability are checked here, not at the web layer. The two contended
//! operations, `open` and `mark_paid`, each route through a single atomic
//! store operation (unique-constrained insert, compare-and-set update) so
//! that concurrent calls on the same reference can never interleave into an
//! inconsistent status.

use chrono::{Duration, Utc};
use pay_storage::{LedgerStore, StoreError};
use pay_types::{
	Caller, IntentId, LedgerError, PaymentIntent, PaymentPurpose, PaymentStatus, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod pricing;

pub use pricing::Pricing;

/// Attempts at allocating a unique reference before giving up. A collision
/// requires two opens by the same payer and purpose in the same
/// microsecond; repeated collisions indicate a stuck clock.
const MAX_OPEN_ATTEMPTS: u32 = 3;

pub struct LedgerService {
	store: Arc<dyn LedgerStore>,
	pricing: Pricing,
	ttl: Duration,
	reference_max_len: usize,
}

impl LedgerService {
	pub fn new(
		store: Arc<dyn LedgerStore>,
		pricing: Pricing,
		ttl: Duration,
		reference_max_len: usize,
	) -> Self {
		Self {
			store,
			pricing,
			ttl,
			reference_max_len,
		}
	}

	/// Opens a new pending intent for the calling payer.
	///
	/// The amount is the explicit one when given, otherwise the pricing
	/// table's default for the purpose; TOPUP always requires an explicit
	/// amount. The reference is allocated through the store's uniqueness
	/// constraint, retrying with a fresh timestamp on a collision.
	pub async fn open(
		&self,
		caller: &Caller,
		purpose: PaymentPurpose,
		amount: Option<u64>,
		related_entity_id: Option<String>,
	) -> Result<PaymentIntent> {
		let Caller::Payer(payer_id) = caller else {
			return Err(LedgerError::Forbidden);
		};

		let amount = self.resolve_amount(purpose, amount)?;

		for attempt in 1..=MAX_OPEN_ATTEMPTS {
			// Retries skew the timestamp forward so a clock that returns the
			// same microsecond twice still yields a fresh reference.
			let now = Utc::now() + Duration::microseconds(i64::from(attempt - 1));
			let reference =
				pay_reference::generate(payer_id, purpose, now, self.reference_max_len)?;

			let intent = PaymentIntent {
				id: IntentId::new(),
				purpose,
				payer_id: payer_id.clone(),
				amount,
				reference_number: reference,
				status: PaymentStatus::Pending,
				created_at: now,
				expires_at: now + self.ttl,
				resolved_at: None,
				related_entity_id: related_entity_id.clone(),
			};

			match self.store.insert(&intent).await {
				Ok(()) => {
					info!(
						payment_id = %intent.id,
						reference = %intent.reference_number,
						%purpose,
						amount,
						"opened payment intent"
					);
					return Ok(intent);
				}
				Err(StoreError::DuplicateReference(reference)) => {
					warn!(%reference, attempt, "reference collision, retrying");
					continue;
				}
				Err(e) => return Err(store_error(e)),
			}
		}

		Err(LedgerError::Storage(
			"could not allocate a unique reference number".to_string(),
		))
	}

	/// Looks up an intent by its bank-transfer reference.
	pub async fn get_by_reference(
		&self,
		caller: &Caller,
		reference: &str,
	) -> Result<PaymentIntent> {
		let intent = self
			.store
			.get_by_reference(reference)
			.await
			.map_err(store_error)?
			.ok_or(LedgerError::NotFound)?;
		if !caller.owns(&intent.payer_id) {
			return Err(LedgerError::Forbidden);
		}
		Ok(intent)
	}

	/// Looks up an intent by id; only the payer or an admin may read it.
	pub async fn get_by_payer_and_id(
		&self,
		caller: &Caller,
		id: &IntentId,
	) -> Result<PaymentIntent> {
		let intent = self
			.store
			.get(id)
			.await
			.map_err(store_error)?
			.ok_or(LedgerError::NotFound)?;
		if !caller.owns(&intent.payer_id) {
			return Err(LedgerError::Forbidden);
		}
		Ok(intent)
	}

	/// Records an operator-observed bank statement line against an intent.
	///
	/// Idempotent: re-verifying an already-paid intent with the same amount
	/// returns the paid intent rather than erroring, so at-least-once
	/// delivery of a reconciliation signal cannot corrupt state. The expiry
	/// check happens here at read time; an intent past its deadline is
	/// ineligible even if the sweep has not yet moved it to `Expired`.
	pub async fn mark_paid(
		&self,
		caller: &Caller,
		reference: &str,
		observed_amount: u64,
	) -> Result<PaymentIntent> {
		if !caller.is_admin() {
			return Err(LedgerError::Forbidden);
		}

		let intent = self
			.store
			.get_by_reference(reference)
			.await
			.map_err(store_error)?
			.ok_or(LedgerError::NotFound)?;

		if intent.status == PaymentStatus::Paid {
			return if intent.amount == observed_amount {
				debug!(%reference, "re-verification of paid intent, returning as-is");
				Ok(intent)
			} else {
				Err(LedgerError::AlreadyTerminal {
					status: PaymentStatus::Paid,
				})
			};
		}
		if intent.status.is_terminal() {
			return Err(LedgerError::AlreadyTerminal {
				status: intent.status,
			});
		}

		let now = Utc::now();
		if intent.is_past_deadline(now) {
			return Err(LedgerError::Expired {
				expired_at: intent.expires_at,
			});
		}

		if observed_amount != intent.amount {
			return Err(LedgerError::AmountMismatch {
				expected: intent.amount,
				observed: observed_amount,
			});
		}

		match self
			.store
			.transition(&intent.id, PaymentStatus::Pending, PaymentStatus::Paid, now)
			.await
		{
			Ok(paid) => {
				info!(payment_id = %paid.id, %reference, amount = paid.amount, "payment verified");
				Ok(paid)
			}
			// Lost a race against another verification of the same
			// reference; the amount was already checked, so resolve
			// through the idempotency rule.
			Err(StoreError::StatusConflict {
				actual: PaymentStatus::Paid,
			}) => self
				.store
				.get(&intent.id)
				.await
				.map_err(store_error)?
				.ok_or(LedgerError::NotFound),
			Err(StoreError::StatusConflict { actual }) => {
				Err(LedgerError::AlreadyTerminal { status: actual })
			}
			Err(e) => Err(store_error(e)),
		}
	}

	/// Cancels a pending intent; the payer or an admin may cancel.
	pub async fn cancel(&self, caller: &Caller, id: &IntentId) -> Result<PaymentIntent> {
		let intent = self.get_by_payer_and_id(caller, id).await?;

		match self
			.store
			.transition(
				&intent.id,
				PaymentStatus::Pending,
				PaymentStatus::Cancelled,
				Utc::now(),
			)
			.await
		{
			Ok(cancelled) => {
				info!(payment_id = %cancelled.id, "payment intent cancelled");
				Ok(cancelled)
			}
			Err(StoreError::StatusConflict { actual }) => {
				Err(LedgerError::AlreadyTerminal { status: actual })
			}
			Err(e) => Err(store_error(e)),
		}
	}

	/// Moves every pending intent past its deadline to `Expired`.
	///
	/// Returns the number of intents transitioned. Idempotent and safe to
	/// run concurrently with `open` and `mark_paid`: it only issues
	/// Pending -> Expired compare-and-sets for rows already past their
	/// deadline, and a row won by a concurrent verification is skipped.
	pub async fn sweep_expired(&self) -> Result<usize> {
		let now = Utc::now();
		let ids = self
			.store
			.pending_expired_before(now)
			.await
			.map_err(store_error)?;

		let mut swept = 0;
		for id in ids {
			match self
				.store
				.transition(&id, PaymentStatus::Pending, PaymentStatus::Expired, now)
				.await
			{
				Ok(_) => swept += 1,
				// Resolved between the scan and the CAS; nothing to do.
				Err(StoreError::StatusConflict { .. }) | Err(StoreError::NotFound) => {}
				Err(e) => return Err(store_error(e)),
			}
		}

		if swept > 0 {
			info!(swept, "expired pending intents");
		}
		Ok(swept)
	}

	/// Count of intents per status.
	pub async fn status_counts(&self) -> Result<HashMap<PaymentStatus, usize>> {
		self.store.count_by_status().await.map_err(store_error)
	}

	fn resolve_amount(&self, purpose: PaymentPurpose, amount: Option<u64>) -> Result<u64> {
		let amount = match amount {
			Some(amount) => amount,
			None => self.pricing.default_amount(purpose).ok_or_else(|| {
				LedgerError::InvalidAmount(format!(
					"{} requires an explicit amount",
					purpose.tag()
				))
			})?,
		};
		if amount == 0 {
			return Err(LedgerError::InvalidAmount(
				"amount must be positive".to_string(),
			));
		}
		Ok(amount)
	}
}

fn store_error(e: StoreError) -> LedgerError {
	match e {
		StoreError::NotFound => LedgerError::NotFound,
		other => LedgerError::Storage(other.to_string()),
	}
}
