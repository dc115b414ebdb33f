//! File-backed store implementation.
//!
//! One JSON document per intent, named by intent id, under a base
//! directory. Writes go to a temp file first and are renamed into place.
//! All mutations serialize through one mutex that also guards the
//! reference index, so uniqueness and compare-and-set hold for a single
//! process owning the directory.

use crate::{LedgerStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_types::{IntentId, PaymentIntent, PaymentStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

pub struct FileStore {
	base_path: PathBuf,
	/// Reference number -> intent id, rebuilt from disk at open.
	index: Mutex<HashMap<String, IntentId>>,
}

impl FileStore {
	/// Opens (creating if needed) a ledger directory and rebuilds the
	/// reference index from the documents found there.
	pub async fn open(base_path: PathBuf) -> Result<Self, StoreError> {
		fs::create_dir_all(&base_path)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;

		let mut index = HashMap::new();
		let mut entries = fs::read_dir(&base_path)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|e| e.to_str()) != Some("json") {
				continue;
			}
			let bytes = fs::read(&path)
				.await
				.map_err(|e| StoreError::Backend(e.to_string()))?;
			let intent: PaymentIntent = serde_json::from_slice(&bytes)
				.map_err(|e| StoreError::Serialization(e.to_string()))?;
			if let Some(existing) = index.insert(intent.reference_number.clone(), intent.id) {
				return Err(StoreError::Backend(format!(
					"reference {} present on both {} and {}",
					intent.reference_number, existing, intent.id
				)));
			}
		}

		Ok(Self {
			base_path,
			index: Mutex::new(index),
		})
	}

	fn file_path(&self, id: &IntentId) -> PathBuf {
		self.base_path.join(format!("{}.json", id))
	}

	async fn read_intent(&self, id: &IntentId) -> Result<Option<PaymentIntent>, StoreError> {
		match fs::read(self.file_path(id)).await {
			Ok(bytes) => {
				let intent = serde_json::from_slice(&bytes)
					.map_err(|e| StoreError::Serialization(e.to_string()))?;
				Ok(Some(intent))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StoreError::Backend(e.to_string())),
		}
	}

	async fn write_intent(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
		let path = self.file_path(&intent.id);
		let bytes = serde_json::to_vec_pretty(intent)
			.map_err(|e| StoreError::Serialization(e.to_string()))?;

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StoreError::Backend(e.to_string()))?;

		Ok(())
	}
}

#[async_trait]
impl LedgerStore for FileStore {
	async fn insert(&self, intent: &PaymentIntent) -> Result<(), StoreError> {
		let mut index = self.index.lock().await;
		if index.contains_key(&intent.reference_number) {
			return Err(StoreError::DuplicateReference(
				intent.reference_number.clone(),
			));
		}
		self.write_intent(intent).await?;
		index.insert(intent.reference_number.clone(), intent.id);
		Ok(())
	}

	async fn get(&self, id: &IntentId) -> Result<Option<PaymentIntent>, StoreError> {
		self.read_intent(id).await
	}

	async fn get_by_reference(
		&self,
		reference: &str,
	) -> Result<Option<PaymentIntent>, StoreError> {
		let id = {
			let index = self.index.lock().await;
			index.get(reference).copied()
		};
		match id {
			Some(id) => self.read_intent(&id).await,
			None => Ok(None),
		}
	}

	async fn transition(
		&self,
		id: &IntentId,
		expected: PaymentStatus,
		next: PaymentStatus,
		at: DateTime<Utc>,
	) -> Result<PaymentIntent, StoreError> {
		// Held across the read-modify-write so transitions cannot interleave.
		let _index = self.index.lock().await;

		let mut intent = self.read_intent(id).await?.ok_or(StoreError::NotFound)?;
		if intent.status != expected {
			return Err(StoreError::StatusConflict {
				actual: intent.status,
			});
		}
		intent.status = next;
		intent.resolved_at = Some(at);
		self.write_intent(&intent).await?;
		Ok(intent)
	}

	async fn pending_expired_before(
		&self,
		cutoff: DateTime<Utc>,
	) -> Result<Vec<IntentId>, StoreError> {
		let ids: Vec<IntentId> = {
			let index = self.index.lock().await;
			index.values().copied().collect()
		};

		let mut expired = Vec::new();
		for id in ids {
			if let Some(intent) = self.read_intent(&id).await? {
				if intent.status == PaymentStatus::Pending && intent.expires_at < cutoff {
					expired.push(intent.id);
				}
			}
		}
		Ok(expired)
	}

	async fn count_by_status(&self) -> Result<HashMap<PaymentStatus, usize>, StoreError> {
		let ids: Vec<IntentId> = {
			let index = self.index.lock().await;
			index.values().copied().collect()
		};

		let mut counts = HashMap::new();
		for id in ids {
			if let Some(intent) = self.read_intent(&id).await? {
				*counts.entry(intent.status).or_insert(0) += 1;
			}
		}
		Ok(counts)
	}
}
