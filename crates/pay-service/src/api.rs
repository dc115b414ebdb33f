//! HTTP API for the payment ledger.
//!
//! Caller identity is explicit: payers present an `x-payer-id` header and
//! operators present the configured admin bearer token. The handlers build
//! a [`Caller`] and pass it into the ledger; the ledger, not the route
//! table, decides ownership and privilege.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use pay_ledger::LedgerService;
use pay_qr::{IpsPayload, RecipientAccount};
use pay_types::{
	Caller, IntentId, OpenPaymentRequest, OpenPaymentResponse, PaymentView, VerifyPaymentRequest,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
	pub ledger: Arc<LedgerService>,
	pub recipient: RecipientAccount,
	pub admin_token: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/payments", post(open_payment))
		.route("/api/payments/{id}", get(get_payment))
		.route("/api/payments/{id}/cancel", post(cancel_payment))
		.route("/api/payments/verify", post(verify_payment))
		.route("/health", get(health))
		.route("/status", get(status))
		.with_state(state)
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

/// Starts the HTTP server on the given port.
pub async fn start_http_server(state: AppState, port: u16) -> anyhow::Result<()> {
	let app = router(state);
	let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
	info!("API server listening on port {}", port);
	axum::serve(listener, app).await?;
	Ok(())
}

/// Resolves the caller from request headers.
///
/// The admin bearer token wins over a payer header; a request carrying
/// neither is unauthenticated.
fn caller_from_headers(headers: &HeaderMap, admin_token: &str) -> ApiResult<Caller> {
	if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
		if let Some(token) = auth.strip_prefix("Bearer ") {
			if token == admin_token {
				return Ok(Caller::Admin);
			}
			return Err(ApiError::Unauthorized);
		}
	}

	match headers.get("x-payer-id").and_then(|v| v.to_str().ok()) {
		Some(payer) if !payer.trim().is_empty() => Ok(Caller::Payer(payer.to_string())),
		_ => Err(ApiError::Unauthorized),
	}
}

fn parse_id(id: &str) -> ApiResult<IntentId> {
	IntentId::parse(id).ok_or_else(|| ApiError::BadRequest(format!("invalid payment id: {id}")))
}

/// Handles `POST /api/payments`: opens a pending intent and returns the
/// reference plus the rendered QR code.
async fn open_payment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<OpenPaymentRequest>,
) -> ApiResult<Json<OpenPaymentResponse>> {
	let caller = caller_from_headers(&headers, &state.admin_token)?;

	let intent = state
		.ledger
		.open(&caller, request.purpose, request.amount, request.related_entity_id)
		.await?;

	let qr_payload = IpsPayload::for_intent(&intent, &state.recipient).encode()?;
	let qr_code_png = pay_qr::render_png_base64(&qr_payload)?;

	Ok(Json(OpenPaymentResponse {
		payment_id: intent.id,
		reference_number: intent.reference_number,
		amount: intent.amount,
		expires_at: intent.expires_at,
		qr_payload,
		qr_code_png,
	}))
}

/// Handles `GET /api/payments/{id}`: ownership-checked intent view.
async fn get_payment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> ApiResult<Json<PaymentView>> {
	let caller = caller_from_headers(&headers, &state.admin_token)?;
	let id = parse_id(&id)?;
	let intent = state.ledger.get_by_payer_and_id(&caller, &id).await?;
	Ok(Json(intent.into()))
}

/// Handles `POST /api/payments/{id}/cancel`.
async fn cancel_payment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> ApiResult<Json<PaymentView>> {
	let caller = caller_from_headers(&headers, &state.admin_token)?;
	let id = parse_id(&id)?;
	let intent = state.ledger.cancel(&caller, &id).await?;
	Ok(Json(intent.into()))
}

/// Handles `POST /api/payments/verify`: records an operator-observed bank
/// statement line. Privileged; the ledger rejects non-admin callers.
async fn verify_payment(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<PaymentView>> {
	let caller = caller_from_headers(&headers, &state.admin_token)?;
	let intent = state
		.ledger
		.mark_paid(&caller, &request.reference_number, request.observed_amount)
		.await?;
	Ok(Json(intent.into()))
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Intent counts by status.
async fn status(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
	let counts = state.ledger.status_counts().await?;
	let counts: serde_json::Map<String, serde_json::Value> = counts
		.into_iter()
		.map(|(status, count)| (status.to_string(), serde_json::json!(count)))
		.collect();

	Ok(Json(serde_json::json!({
		"status": "running",
		"intents": counts,
		"timestamp": chrono::Utc::now().timestamp(),
	})))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	const ADMIN: &str = "secret-admin-token";

	fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (k, v) in pairs {
			map.insert(
				axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
				HeaderValue::from_str(v).unwrap(),
			);
		}
		map
	}

	#[test]
	fn test_admin_token_grants_admin() {
		let caller = caller_from_headers(
			&headers(&[("authorization", "Bearer secret-admin-token")]),
			ADMIN,
		)
		.unwrap();
		assert_eq!(caller, Caller::Admin);
	}

	#[test]
	fn test_wrong_bearer_token_rejected() {
		let result = caller_from_headers(&headers(&[("authorization", "Bearer nope")]), ADMIN);
		assert!(matches!(result, Err(ApiError::Unauthorized)));
	}

	#[test]
	fn test_payer_header_becomes_payer_caller() {
		let caller = caller_from_headers(&headers(&[("x-payer-id", "u1")]), ADMIN).unwrap();
		assert_eq!(caller, Caller::Payer("u1".to_string()));
	}

	#[test]
	fn test_no_identity_is_unauthorized() {
		let result = caller_from_headers(&headers(&[]), ADMIN);
		assert!(matches!(result, Err(ApiError::Unauthorized)));

		let result = caller_from_headers(&headers(&[("x-payer-id", "  ")]), ADMIN);
		assert!(matches!(result, Err(ApiError::Unauthorized)));
	}

	#[test]
	fn test_invalid_id_is_bad_request() {
		assert!(matches!(parse_id("not-a-uuid"), Err(ApiError::BadRequest(_))));
	}
}
