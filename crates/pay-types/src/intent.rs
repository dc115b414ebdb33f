//! The payment intent data model.
//!
//! A [`PaymentIntent`] is one ledger row representing a pending-or-resolved
//! purchase. Rows are never deleted; resolved intents are retained for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(Uuid);

impl IntentId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub fn parse(s: &str) -> Option<Self> {
		Uuid::parse_str(s).ok().map(Self)
	}
}

impl Default for IntentId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for IntentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// What a payment is for.
///
/// The purpose selects the reference tag and, for fixed-price purchases,
/// the expected amount from the pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentPurpose {
	Subscription,
	Topup,
	ContactReveal,
	PriorityListing,
	UrgentListing,
}

impl PaymentPurpose {
	/// Three-letter tag embedded in the reference number.
	pub fn tag(&self) -> &'static str {
		match self {
			Self::Subscription => "SUB",
			Self::Topup => "TOP",
			Self::ContactReveal => "REV",
			Self::PriorityListing => "PRI",
			Self::UrgentListing => "URG",
		}
	}

	/// Human-readable purpose text for the QR payload `S` field.
	pub fn description(&self) -> &'static str {
		match self {
			Self::Subscription => "Pretplata",
			Self::Topup => "Dopuna kredita",
			Self::ContactReveal => "Otkrivanje kontakta",
			Self::PriorityListing => "Prioritetni oglas",
			Self::UrgentListing => "Hitan oglas",
		}
	}
}

impl fmt::Display for PaymentPurpose {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// Lifecycle state of a payment intent.
///
/// Strictly forward-moving: `Pending` may move to any of the other three,
/// which are all terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	Pending,
	Paid,
	Expired,
	Cancelled,
}

impl PaymentStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, Self::Pending)
	}
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::Pending => "PENDING",
			Self::Paid => "PAID",
			Self::Expired => "EXPIRED",
			Self::Cancelled => "CANCELLED",
		};
		f.write_str(s)
	}
}

/// One ledger row: a purchase intent and its resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
	/// Opaque identifier, allocated at creation.
	pub id: IntentId,
	/// What is being paid for.
	pub purpose: PaymentPurpose,
	/// Identifier of the requesting account.
	pub payer_id: String,
	/// Whole-unit RSD, always positive.
	pub amount: u64,
	/// Bank-transfer reference; unique across all intents.
	pub reference_number: String,
	/// Current lifecycle state.
	pub status: PaymentStatus,
	/// When the intent was opened.
	pub created_at: DateTime<Utc>,
	/// Deadline past which the intent can no longer be completed.
	pub expires_at: DateTime<Utc>,
	/// When the intent left `Pending`, if it has.
	pub resolved_at: Option<DateTime<Utc>>,
	/// The thing being paid for (plan code, match id, listing id). Opaque here.
	pub related_entity_id: Option<String>,
}

impl PaymentIntent {
	/// Whether the completion deadline has passed at `now`.
	///
	/// This is the read-time guard: an intent past its deadline is
	/// ineligible for completion even before the expiry sweep has run.
	pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
		now > self.expires_at
	}
}
