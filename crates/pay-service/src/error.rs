//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pay_types::{ErrorDetail, ErrorResponse, LedgerError};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// API error type; every ledger and QR error maps to one HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("missing or invalid caller identity")]
	Unauthorized,

	#[error("bad request: {0}")]
	BadRequest(String),

	#[error(transparent)]
	Ledger(#[from] LedgerError),

	#[error(transparent)]
	Qr(#[from] pay_qr::QrError),
}

impl ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::BadRequest(_) => StatusCode::BAD_REQUEST,
			Self::Ledger(e) => match e {
				LedgerError::NotFound => StatusCode::NOT_FOUND,
				LedgerError::Forbidden => StatusCode::FORBIDDEN,
				LedgerError::AmountMismatch { .. } | LedgerError::AlreadyTerminal { .. } => {
					StatusCode::CONFLICT
				}
				LedgerError::Expired { .. } => StatusCode::GONE,
				LedgerError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
				LedgerError::ReferenceTooLong { .. } | LedgerError::Storage(_) => {
					StatusCode::INTERNAL_SERVER_ERROR
				}
			},
			Self::Qr(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_code(&self) -> &'static str {
		match self {
			Self::Unauthorized => "UNAUTHORIZED",
			Self::BadRequest(_) => "BAD_REQUEST",
			Self::Ledger(e) => match e {
				LedgerError::NotFound => "NOT_FOUND",
				LedgerError::Forbidden => "FORBIDDEN",
				LedgerError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
				LedgerError::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
				LedgerError::Expired { .. } => "EXPIRED",
				LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
				LedgerError::ReferenceTooLong { .. } | LedgerError::Storage(_) => {
					"INTERNAL_ERROR"
				}
			},
			Self::Qr(_) => "INTERNAL_ERROR",
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let code = self.error_code();

		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(error = ?self, "internal API error");
		}

		let body = ErrorResponse {
			error: ErrorDetail {
				code: code.to_string(),
				message: self.to_string(),
			},
		};

		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pay_types::PaymentStatus;

	#[test]
	fn test_ledger_error_status_mapping() {
		let cases: Vec<(ApiError, StatusCode, &str)> = vec![
			(
				ApiError::Ledger(LedgerError::NotFound),
				StatusCode::NOT_FOUND,
				"NOT_FOUND",
			),
			(
				ApiError::Ledger(LedgerError::Forbidden),
				StatusCode::FORBIDDEN,
				"FORBIDDEN",
			),
			(
				ApiError::Ledger(LedgerError::AmountMismatch {
					expected: 30,
					observed: 25,
				}),
				StatusCode::CONFLICT,
				"AMOUNT_MISMATCH",
			),
			(
				ApiError::Ledger(LedgerError::AlreadyTerminal {
					status: PaymentStatus::Cancelled,
				}),
				StatusCode::CONFLICT,
				"ALREADY_TERMINAL",
			),
			(
				ApiError::Ledger(LedgerError::Expired {
					expired_at: chrono::Utc::now(),
				}),
				StatusCode::GONE,
				"EXPIRED",
			),
			(
				ApiError::Ledger(LedgerError::InvalidAmount("x".into())),
				StatusCode::BAD_REQUEST,
				"INVALID_AMOUNT",
			),
			(
				ApiError::Ledger(LedgerError::Storage("x".into())),
				StatusCode::INTERNAL_SERVER_ERROR,
				"INTERNAL_ERROR",
			),
			(ApiError::Unauthorized, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
		];

		for (error, status, code) in cases {
			assert_eq!(error.status_code(), status, "{error}");
			assert_eq!(error.error_code(), code, "{error}");
		}
	}
}
