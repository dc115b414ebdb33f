//! Error taxonomy for ledger operations.

use crate::PaymentStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors returned by ledger operations.
///
/// All of these are typed results surfaced to the caller; the web layer maps
/// them to HTTP status codes. The one deliberate non-error duplicate is
/// re-verification of an already-paid intent with a matching amount, which
/// returns the existing intent instead of `AlreadyTerminal`.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// The generated reference exceeds the wire-format length limit.
	/// Misconfiguration, not a user-facing condition; never truncate instead.
	#[error("reference number {reference:?} exceeds limit of {limit} characters")]
	ReferenceTooLong { reference: String, limit: usize },

	/// Verification of an intent that already left `Pending`.
	#[error("intent is already {status}")]
	AlreadyTerminal { status: PaymentStatus },

	/// Verification attempted after the completion deadline.
	#[error("intent expired at {expired_at}")]
	Expired { expired_at: chrono::DateTime<chrono::Utc> },

	/// The observed bank-statement amount does not match the intent.
	#[error("amount mismatch: expected {expected} RSD, observed {observed} RSD")]
	AmountMismatch { expected: u64, observed: u64 },

	/// No intent with the given id or reference.
	#[error("payment intent not found")]
	NotFound,

	/// The caller is neither the payer nor an admin.
	#[error("caller is not allowed to access this intent")]
	Forbidden,

	/// A zero amount, or a purpose with no configured price and no explicit
	/// amount supplied.
	#[error("invalid amount: {0}")]
	InvalidAmount(String),

	/// Storage backend failure.
	#[error("storage error: {0}")]
	Storage(String),
}
