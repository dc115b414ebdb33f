//! Explicit caller identity.
//!
//! Every ledger operation takes a [`Caller`] rather than reading identity
//! from ambient request state. Ownership and privilege checks happen at the
//! ledger, not only at the HTTP layer.

use serde::{Deserialize, Serialize};

/// Who is invoking a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caller {
	/// A payer account, identified by its account id.
	Payer(String),
	/// An operator with the admin capability (bank-statement reconciliation).
	Admin,
}

impl Caller {
	pub fn is_admin(&self) -> bool {
		matches!(self, Self::Admin)
	}

	/// Whether this caller may read or cancel an intent owned by `payer_id`.
	pub fn owns(&self, payer_id: &str) -> bool {
		match self {
			Self::Payer(id) => id == payer_id,
			Self::Admin => true,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ownership() {
		let caller = Caller::Payer("u1".to_string());
		assert!(caller.owns("u1"));
		assert!(!caller.owns("u2"));
		assert!(Caller::Admin.owns("u2"));
	}
}
