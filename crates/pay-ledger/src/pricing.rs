//! Default amounts per purchase purpose.

use pay_config::PricingConfig;
use pay_types::PaymentPurpose;

/// Fixed prices in whole RSD. TOPUP has no fixed price; the payer chooses
/// the amount.
#[derive(Debug, Clone)]
pub struct Pricing {
	subscription: u64,
	contact_reveal: u64,
	priority_listing: u64,
	urgent_listing: u64,
}

impl Pricing {
	pub fn default_amount(&self, purpose: PaymentPurpose) -> Option<u64> {
		match purpose {
			PaymentPurpose::Subscription => Some(self.subscription),
			PaymentPurpose::ContactReveal => Some(self.contact_reveal),
			PaymentPurpose::PriorityListing => Some(self.priority_listing),
			PaymentPurpose::UrgentListing => Some(self.urgent_listing),
			PaymentPurpose::Topup => None,
		}
	}
}

impl From<&PricingConfig> for Pricing {
	fn from(config: &PricingConfig) -> Self {
		Self {
			subscription: config.subscription,
			contact_reveal: config.contact_reveal,
			priority_listing: config.priority_listing,
			urgent_listing: config.urgent_listing,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_topup_has_no_default() {
		let pricing = Pricing::from(&PricingConfig::default());
		assert_eq!(pricing.default_amount(PaymentPurpose::Topup), None);
		assert!(pricing
			.default_amount(PaymentPurpose::Subscription)
			.is_some());
	}
}
