//! In-memory store implementation.

use crate::{LedgerStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pay_types::{IntentId, PaymentIntent, PaymentStatus};
use std::collections::HashMap;

/// In-memory ledger store.
///
/// The reference index is the uniqueness constraint: inserts claim the
/// reference through the entry API, so two concurrent opens racing on the
/// same reference cannot both succeed. Transitions mutate under the
/// per-key entry lock, making the compare-and-set atomic.
#[derive(Default)]
pub struct MemoryStore {
	intents: DashMap<IntentId, PaymentIntent>,
	references: DashMap<String, IntentId>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self {
			intents: DashMap::new(),
			references: DashMap::new(),
		}
	}
}

#[async_trait]
impl LedgerStore for MemoryStore {
	async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
		match self.references.entry(intent.reference_number.clone()) {
			dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::DuplicateReference(
				intent.reference_number.clone(),
			)),
			dashmap::mapref::entry::Entry::Vacant(entry) => {
				entry.insert(intent.id);
				self.intents.insert(intent.id, intent.clone());
				Ok(())
			}
		}
	}

	async fn get(&self, id: &IntentId) -> Result<Option<PaymentIntent>, StoreError> {
		Ok(self.intents.get(id).map(|entry| entry.clone()))
	}

	async fn get_by_reference(
		&self,
		reference: &str,
	) -> Result<Option<PaymentIntent>, StoreError> {
		let Some(id) = self.references.get(reference).map(|entry| *entry) else {
			return Ok(None);
		};
		self.get(&id).await
	}

	async fn transition(
		&self,
		id: &IntentId,
		expected: PaymentStatus,
		next: PaymentStatus,
		at: DateTime<Utc>,
	) -> Result<PaymentIntent, StoreError> {
		let mut entry = self.intents.get_mut(id).ok_or(StoreError::NotFound)?;
		if entry.status != expected {
			return Err(StoreError::StatusConflict {
				actual: entry.status,
			});
		}
		entry.status = next;
		entry.resolved_at = Some(at);
		Ok(entry.clone())
	}

	async fn pending_expired_before(
		&self,
		cutoff: DateTime<Utc>,
	) -> Result<Vec<IntentId>, StoreError> {
		Ok(self
			.intents
			.iter()
			.filter(|entry| entry.status == PaymentStatus::Pending && entry.expires_at < cutoff)
			.map(|entry| entry.id)
			.collect())
	}

	async fn count_by_status(&self) -> Result<HashMap<PaymentStatus, usize>, StoreError> {
		let mut counts = HashMap::new();
		for entry in self.intents.iter() {
			*counts.entry(entry.status).or_insert(0) += 1;
		}
		Ok(counts)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use pay_types::PaymentPurpose;

	fn intent(reference: &str) -> PaymentIntent {
		let now = Utc::now();
		PaymentIntent {
			id: IntentId::new(),
			purpose: PaymentPurpose::ContactReveal,
			payer_id: "payer-1".to_string(),
			amount: 300,
			reference_number: reference.to_string(),
			status: PaymentStatus::Pending,
			created_at: now,
			expires_at: now + Duration::hours(24),
			resolved_at: None,
			related_entity_id: None,
		}
	}

	#[tokio::test]
	async fn test_insert_and_lookup() {
		let store = MemoryStore::new();
		let intent = intent("REV-ABC-123456");

		store.insert(&intent).await.unwrap();

		let by_id = store.get(&intent.id).await.unwrap().unwrap();
		assert_eq!(by_id.reference_number, intent.reference_number);

		let by_reference = store
			.get_by_reference("REV-ABC-123456")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(by_reference.id, intent.id);
	}

	#[tokio::test]
	async fn test_duplicate_reference_rejected() {
		let store = MemoryStore::new();
		store.insert(&intent("REV-DUP-000001")).await.unwrap();

		let err = store.insert(&intent("REV-DUP-000001")).await.unwrap_err();
		assert!(matches!(err, StoreError::DuplicateReference(_)));
	}

	#[tokio::test]
	async fn test_transition_cas() {
		let store = MemoryStore::new();
		let intent = intent("REV-CAS-000001");
		store.insert(&intent).await.unwrap();

		let paid = store
			.transition(
				&intent.id,
				PaymentStatus::Pending,
				PaymentStatus::Paid,
				Utc::now(),
			)
			.await
			.unwrap();
		assert_eq!(paid.status, PaymentStatus::Paid);
		assert!(paid.resolved_at.is_some());

		// Second CAS from Pending fails and reports the actual status.
		let err = store
			.transition(
				&intent.id,
				PaymentStatus::Pending,
				PaymentStatus::Expired,
				Utc::now(),
			)
			.await
			.unwrap_err();
		match err {
			StoreError::StatusConflict { actual } => assert_eq!(actual, PaymentStatus::Paid),
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn test_pending_expired_before() {
		let store = MemoryStore::new();
		let mut stale = intent("REV-OLD-000001");
		stale.expires_at = Utc::now() - Duration::hours(1);
		let fresh = intent("REV-NEW-000001");

		store.insert(&stale).await.unwrap();
		store.insert(&fresh).await.unwrap();

		let expired = store.pending_expired_before(Utc::now()).await.unwrap();
		assert_eq!(expired, vec![stale.id]);
	}

	#[tokio::test]
	async fn test_count_by_status() {
		let store = MemoryStore::new();
		let a = intent("REV-CNT-000001");
		let b = intent("REV-CNT-000002");
		store.insert(&a).await.unwrap();
		store.insert(&b).await.unwrap();
		store
			.transition(&a.id, PaymentStatus::Pending, PaymentStatus::Paid, Utc::now())
			.await
			.unwrap();

		let counts = store.count_by_status().await.unwrap();
		assert_eq!(counts.get(&PaymentStatus::Pending), Some(&1));
		assert_eq!(counts.get(&PaymentStatus::Paid), Some(&1));
	}

	#[tokio::test]
	async fn test_concurrent_inserts_one_winner() {
		let store = std::sync::Arc::new(MemoryStore::new());
		let mut handles = Vec::new();
		for _ in 0..8 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				store.insert(&intent("REV-RACE-000001")).await
			}));
		}

		let mut ok = 0;
		let mut duplicates = 0;
		for handle in handles {
			match handle.await.unwrap() {
				Ok(()) => ok += 1,
				Err(StoreError::DuplicateReference(_)) => duplicates += 1,
				Err(other) => panic!("unexpected error: {other}"),
			}
		}
		assert_eq!(ok, 1);
		assert_eq!(duplicates, 7);
	}
}
