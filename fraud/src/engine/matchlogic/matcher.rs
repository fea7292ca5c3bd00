use crate::engine::entry::PurchaseRecord;
use crate::engine::matchlogic::normalize::{
    fold_case, normalize_email_local_part, normalize_state, normalize_street,
};
use crate::error::{FraudError, FraudResult};

/// Normalized identity fields of one purchase, computed once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity<'a> {
    record: &'a PurchaseRecord,
    email: String,
    street: String,
    city: String,
    state: String,
    zip: String,
}

impl<'a> Identity<'a> {
    fn from_record(record: &'a PurchaseRecord) -> FraudResult<Self> {
        let email = normalize_email_local_part(&record.email_address).ok_or_else(|| {
            FraudError::MalformedEmail {
                order_id: record.order_id,
                email: record.email_address.clone(),
            }
        })?;
        Ok(Self {
            record,
            email,
            street: normalize_street(&record.street_address),
            city: fold_case(&record.city),
            state: normalize_state(&record.state),
            zip: fold_case(&record.zip_code),
        })
    }

    fn same_email(&self, other: &Identity) -> bool {
        self.email == other.email
    }

    // the expanded form also covers plain case-insensitive equality
    fn same_address(&self, other: &Identity) -> bool {
        self.street == other.street
            && self.city == other.city
            && self.state == other.state
            && self.zip == other.zip
    }

    fn is_fraudulent_with(&self, other: &Identity) -> bool {
        if !self.record.same_deal(other.record) || self.record.same_card(other.record) {
            return false;
        }
        self.same_email(other) || self.same_address(other)
    }
}

/// Stateless matcher over a single batch of purchases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher;

impl Matcher {
    pub fn new() -> Self {
        Self
    }

    /// Returns every purchase that forms a fraudulent pair with at least one
    /// other purchase in `records`, sorted by order id, each at most once.
    ///
    /// Applies the same rule as [`Matcher::is_fraudulent_pair`] to every pair,
    /// normalizing each record once up front instead of once per pair.
    ///
    /// Fails without a partial result if any record cannot be normalized.
    pub fn evaluate(&self, records: &[PurchaseRecord]) -> FraudResult<Vec<PurchaseRecord>> {
        let identities = records
            .iter()
            .map(Identity::from_record)
            .collect::<FraudResult<Vec<_>>>()?;

        let mut flagged = vec![false; identities.len()];
        for (i, a) in identities.iter().enumerate() {
            for (j, b) in identities.iter().enumerate().skip(i + 1) {
                if a.is_fraudulent_with(b) {
                    log::debug!(
                        "orders {} and {} flagged as fraudulent pair",
                        a.record.order_id,
                        b.record.order_id
                    );
                    flagged[i] = true;
                    flagged[j] = true;
                }
            }
        }

        let mut fraudulent: Vec<PurchaseRecord> = records
            .iter()
            .zip(flagged)
            .filter(|(_, hit)| *hit)
            .map(|(record, _)| record.clone())
            .collect();
        fraudulent.sort();
        fraudulent.dedup();
        Ok(fraudulent)
    }

    /// Matching rule for a single pair. Symmetric in its arguments.
    ///
    /// Single-pair entry point for callers and tests; batches go through
    /// [`Matcher::evaluate`], which shares the rule via `Identity`.
    #[allow(unused)]
    pub fn is_fraudulent_pair(&self, a: &PurchaseRecord, b: &PurchaseRecord) -> FraudResult<bool> {
        let a = Identity::from_record(a)?;
        let b = Identity::from_record(b)?;
        Ok(a.is_fraudulent_with(&b))
    }
}
