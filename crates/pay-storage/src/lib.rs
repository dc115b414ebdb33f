//! Storage backends for the payment ledger.
//!
//! The store is where the ledger's two contended operations are made atomic:
//! inserting a new intent (unique on reference number) and transitioning an
//! intent's status (compare-and-set on the expected current status). Callers
//! never check-then-write; they issue one atomic operation and handle the
//! typed conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_types::{IntentId, PaymentIntent, PaymentStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use implementations::file::FileStore;
pub use implementations::memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// Insert would violate reference-number uniqueness.
	#[error("reference number {0:?} already exists")]
	DuplicateReference(String),
	/// No intent with the given id.
	#[error("not found")]
	NotFound,
	/// Compare-and-set failed: the intent is not in the expected status.
	#[error("status conflict: intent is {actual}")]
	StatusConflict { actual: PaymentStatus },
	/// Error during serialization/deserialization.
	#[error("serialization error: {0}")]
	Serialization(String),
	/// Error in the storage backend.
	#[error("backend error: {0}")]
	Backend(String),
}

/// Trait defining the interface for ledger storage backends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
	/// Inserts a new intent. Atomic with respect to concurrent inserts:
	/// fails with [`StoreError::DuplicateReference`] if the reference
	/// number is already present.
	async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError>;

	/// Looks up an intent by id.
	async fn get(&self, id: &IntentId) -> Result<Option<PaymentIntent>, StoreError>;

	/// Looks up an intent by reference number.
	async fn get_by_reference(&self, reference: &str)
		-> Result<Option<PaymentIntent>, StoreError>;

	/// Atomically moves an intent from `expected` to `next`, stamping
	/// `resolved_at` with `at`. Fails with [`StoreError::StatusConflict`]
	/// carrying the actual status if the intent is not in `expected`.
	async fn transition(
		&self,
		id: &IntentId,
		expected: PaymentStatus,
		next: PaymentStatus,
		at: DateTime<Utc>,
	) -> Result<PaymentIntent, StoreError>;

	/// Ids of all `Pending` intents whose deadline is before `cutoff`.
	async fn pending_expired_before(
		&self,
		cutoff: DateTime<Utc>,
	) -> Result<Vec<IntentId>, StoreError>;

	/// Count of intents per status, for the status endpoint.
	async fn count_by_status(&self) -> Result<HashMap<PaymentStatus, usize>, StoreError>;
}

/// Creates a store from the configured backend name.
///
/// Backends: `memory` (default) and `file` (persists one JSON document per
/// intent under `path`).
pub async fn create_store(backend: &str, path: &str) -> Result<Arc<dyn LedgerStore>, StoreError> {
	match backend {
		"memory" => Ok(Arc::new(MemoryStore::new())),
		"file" => {
			let store = FileStore::open(PathBuf::from(path)).await?;
			Ok(Arc::new(store))
		}
		other => Err(StoreError::Backend(format!(
			"unknown storage backend: {}",
			other
		))),
	}
}
