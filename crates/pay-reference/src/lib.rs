//! Payment reference-number generation.
//!
//! A reference is the token placed in a bank transfer's memo field and later
//! matched against the ledger during reconciliation. It is derived, not
//! random: a caller holding `{payer_id, purpose, timestamp}` can re-derive
//! the exact string for audit. Uniqueness across concurrent opens by the
//! same payer comes from microsecond timestamp resolution, backed by the
//! storage-level unique constraint.
//!
//! Format: `<TAG>-<TS>-<PAYER>`
//! - `TAG`: three-letter purpose tag (`SUB`, `TOP`, `REV`, `PRI`, `URG`)
//! - `TS`: microseconds since the Unix epoch, base-36 uppercase
//! - `PAYER`: first 3 bytes of SHA3-256 of the payer id, hex uppercase

use chrono::{DateTime, Utc};
use pay_types::{LedgerError, PaymentPurpose, Result};
use sha3::{Digest, Sha3_256};

/// Number of payer-hash bytes embedded in the reference.
const PAYER_SLICE_BYTES: usize = 3;

/// Generates the reference number for an intent opened by `payer_id` with
/// `purpose` at `created_at`.
///
/// Pure and deterministic. Fails with [`LedgerError::ReferenceTooLong`] if
/// the rendered string would exceed `max_len` (the configured IPS
/// reference-field limit); truncating instead would risk collisions.
pub fn generate(
	payer_id: &str,
	purpose: PaymentPurpose,
	created_at: DateTime<Utc>,
	max_len: usize,
) -> Result<String> {
	let micros = created_at.timestamp_micros().max(0) as u64;
	let reference = format!(
		"{}-{}-{}",
		purpose.tag(),
		to_base36(micros),
		payer_slice(payer_id)
	);

	if reference.len() > max_len {
		return Err(LedgerError::ReferenceTooLong {
			reference,
			limit: max_len,
		});
	}

	Ok(reference)
}

fn payer_slice(payer_id: &str) -> String {
	let digest = Sha3_256::digest(payer_id.as_bytes());
	hex::encode_upper(&digest[..PAYER_SLICE_BYTES])
}

fn to_base36(mut value: u64) -> String {
	const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
	if value == 0 {
		return "0".to_string();
	}
	let mut out = Vec::new();
	while value > 0 {
		out.push(DIGITS[(value % 36) as usize]);
		value /= 36;
	}
	out.reverse();
	String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	const MAX_LEN: usize = 25;

	#[test]
	fn test_deterministic_for_same_inputs() {
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
		let a = generate("payer-1", PaymentPurpose::Subscription, at, MAX_LEN).unwrap();
		let b = generate("payer-1", PaymentPurpose::Subscription, at, MAX_LEN).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_distinct_across_microseconds() {
		let t1 = Utc.timestamp_micros(1_740_000_000_000_000).unwrap();
		let t2 = Utc.timestamp_micros(1_740_000_000_000_001).unwrap();
		let a = generate("payer-1", PaymentPurpose::ContactReveal, t1, MAX_LEN).unwrap();
		let b = generate("payer-1", PaymentPurpose::ContactReveal, t2, MAX_LEN).unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn test_distinct_across_payers_and_purposes() {
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
		let a = generate("payer-1", PaymentPurpose::Topup, at, MAX_LEN).unwrap();
		let b = generate("payer-2", PaymentPurpose::Topup, at, MAX_LEN).unwrap();
		let c = generate("payer-1", PaymentPurpose::UrgentListing, at, MAX_LEN).unwrap();
		assert_ne!(a, b);
		assert_ne!(a, c);
	}

	#[test]
	fn test_embeds_purpose_tag() {
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
		let reference = generate("payer-1", PaymentPurpose::PriorityListing, at, MAX_LEN).unwrap();
		assert!(reference.starts_with("PRI-"));
	}

	#[test]
	fn test_memo_field_safe_charset() {
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
		let reference = generate("payer with spaces!", PaymentPurpose::Topup, at, MAX_LEN).unwrap();
		assert!(reference
			.chars()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'));
	}

	#[test]
	fn test_too_long_is_an_error_not_a_truncation() {
		let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
		let err = generate("payer-1", PaymentPurpose::Subscription, at, 10).unwrap_err();
		match err {
			pay_types::LedgerError::ReferenceTooLong { reference, limit } => {
				assert_eq!(limit, 10);
				assert!(reference.len() > 10);
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_base36_encoding() {
		assert_eq!(to_base36(0), "0");
		assert_eq!(to_base36(35), "Z");
		assert_eq!(to_base36(36), "10");
	}
}
