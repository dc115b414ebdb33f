//! NBS IPS QR payload encoding.
//!
//! Renders a payment intent as the pipe-delimited `K:V` text payload of the
//! Serbian instant-payment QR standard, and rasterizes that payload as a PNG.
//! Encoding is a pure transform once the recipient account configuration is
//! loaded; recipient fields are validated at startup, not per call.
//!
//! Payload shape:
//!
//! ```text
//! K:PR|V:01|C:1|R:<account>|N:<name>|I:RSD<amount>|P:<label>|SF:289|S:<purpose>|RO:<reference>
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pay_types::PaymentIntent;
use std::io::Cursor;
use thiserror::Error;

/// Identification code, fixed for payment requests.
const IDENTIFICATION: &str = "PR";
/// Payload version.
const VERSION: &str = "01";
/// Character set code (1 = UTF-8).
const CHARSET: &str = "1";
/// Payment purpose code for service fees.
const PURPOSE_CODE: &str = "289";

#[derive(Debug, Error)]
pub enum QrError {
	/// A dynamic field contains the `|` delimiter.
	#[error("field {field} must not contain the '|' delimiter")]
	InvalidField { field: &'static str },
	/// The payload does not fit in a QR code.
	#[error("QR encoding failed: {0}")]
	Encoding(String),
	/// PNG serialization failure.
	#[error("PNG rendering failed: {0}")]
	Rendering(String),
	/// A payload being parsed is malformed.
	#[error("malformed payload: {0}")]
	Malformed(String),
}

/// Fixed recipient account details, one per process.
#[derive(Debug, Clone)]
pub struct RecipientAccount {
	pub account: String,
	pub name: String,
	pub label: String,
}

/// The decoded form of an IPS payload, used for encoding and for the
/// parse-back in reconciliation tooling and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpsPayload {
	pub account: String,
	pub name: String,
	/// Whole-unit RSD.
	pub amount: u64,
	pub label: String,
	pub purpose_text: String,
	pub reference: String,
}

impl IpsPayload {
	/// Builds the payload for an intent against the configured recipient.
	pub fn for_intent(intent: &PaymentIntent, recipient: &RecipientAccount) -> Self {
		Self {
			account: recipient.account.clone(),
			name: recipient.name.clone(),
			amount: intent.amount,
			label: recipient.label.clone(),
			purpose_text: intent.purpose.description().to_string(),
			reference: intent.reference_number.clone(),
		}
	}

	/// Renders the pipe-delimited wire text.
	pub fn encode(&self) -> Result<String, QrError> {
		for (field, value) in [
			("account", &self.account),
			("name", &self.name),
			("label", &self.label),
			("purpose_text", &self.purpose_text),
			("reference", &self.reference),
		] {
			if value.contains('|') {
				return Err(QrError::InvalidField { field });
			}
		}

		Ok(format!(
			"K:{}|V:{}|C:{}|R:{}|N:{}|I:RSD{}|P:{}|SF:{}|S:{}|RO:{}",
			IDENTIFICATION,
			VERSION,
			CHARSET,
			self.account,
			self.name,
			self.amount,
			self.label,
			PURPOSE_CODE,
			self.purpose_text,
			self.reference,
		))
	}

	/// Parses a wire payload back into its fields.
	pub fn parse(payload: &str) -> Result<Self, QrError> {
		let mut account = None;
		let mut name = None;
		let mut amount = None;
		let mut label = None;
		let mut purpose_text = None;
		let mut reference = None;

		for pair in payload.split('|') {
			let (key, value) = pair
				.split_once(':')
				.ok_or_else(|| QrError::Malformed(format!("field {:?} has no key", pair)))?;
			match key {
				"K" if value != IDENTIFICATION => {
					return Err(QrError::Malformed(format!(
						"unexpected identification code {:?}",
						value
					)));
				}
				"R" => account = Some(value.to_string()),
				"N" => name = Some(value.to_string()),
				"I" => {
					let digits = value.strip_prefix("RSD").ok_or_else(|| {
						QrError::Malformed(format!("amount {:?} is not RSD", value))
					})?;
					let parsed = digits.parse::<u64>().map_err(|e| {
						QrError::Malformed(format!("amount {:?}: {}", digits, e))
					})?;
					amount = Some(parsed);
				}
				"P" => label = Some(value.to_string()),
				"S" => purpose_text = Some(value.to_string()),
				"RO" => reference = Some(value.to_string()),
				_ => {}
			}
		}

		let missing = |field: &str| QrError::Malformed(format!("missing field {}", field));
		Ok(Self {
			account: account.ok_or_else(|| missing("R"))?,
			name: name.ok_or_else(|| missing("N"))?,
			amount: amount.ok_or_else(|| missing("I"))?,
			label: label.ok_or_else(|| missing("P"))?,
			purpose_text: purpose_text.ok_or_else(|| missing("S"))?,
			reference: reference.ok_or_else(|| missing("RO"))?,
		})
	}
}

/// Rasterizes a wire payload as a PNG image.
pub fn render_png(payload: &str) -> Result<Vec<u8>, QrError> {
	let code = qrcode::QrCode::new(payload.as_bytes())
		.map_err(|e| QrError::Encoding(e.to_string()))?;

	let img = code
		.render::<image::Luma<u8>>()
		.min_dimensions(240, 240)
		.build();

	let mut bytes = Vec::new();
	image::DynamicImage::ImageLuma8(img)
		.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
		.map_err(|e| QrError::Rendering(e.to_string()))?;

	Ok(bytes)
}

/// PNG rendering, base64-encoded for JSON transport.
pub fn render_png_base64(payload: &str) -> Result<String, QrError> {
	Ok(BASE64.encode(render_png(payload)?))
}
