//! HTTP request and response types.

use crate::{IntentId, PaymentIntent, PaymentPurpose, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPaymentRequest {
	pub purpose: PaymentPurpose,
	/// Explicit amount in whole RSD. Required for TOPUP; optional for
	/// fixed-price purposes, which fall back to the pricing table.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amount: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub related_entity_id: Option<String>,
}

/// Response to `POST /api/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPaymentResponse {
	pub payment_id: IntentId,
	pub reference_number: String,
	pub amount: u64,
	pub expires_at: DateTime<Utc>,
	/// Raw NBS IPS text payload.
	pub qr_payload: String,
	/// PNG rendering of the payload, base64-encoded.
	pub qr_code_png: String,
}

/// Body of `POST /api/payments/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
	pub reference_number: String,
	/// Amount observed on the bank statement line, whole RSD.
	pub observed_amount: u64,
}

/// Intent view returned by status and verify endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentView {
	pub payment_id: IntentId,
	pub purpose: PaymentPurpose,
	pub payer_id: String,
	pub amount: u64,
	pub reference_number: String,
	pub status: PaymentStatus,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resolved_at: Option<DateTime<Utc>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub related_entity_id: Option<String>,
}

impl From<PaymentIntent> for PaymentView {
	fn from(intent: PaymentIntent) -> Self {
		Self {
			payment_id: intent.id,
			purpose: intent.purpose,
			payer_id: intent.payer_id,
			amount: intent.amount,
			reference_number: intent.reference_number,
			status: intent.status,
			created_at: intent.created_at,
			expires_at: intent.expires_at,
			resolved_at: intent.resolved_at,
			related_entity_id: intent.related_entity_id,
		}
	}
}

/// JSON error body, `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
	pub code: String,
	pub message: String,
}
