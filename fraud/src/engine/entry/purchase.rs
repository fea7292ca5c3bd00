use serde::{Deserialize, Serialize};

pub type OrderId = u64;
pub type DealId = u64;

/// A single purchase attempt as submitted by a client.
///
/// Field order matters: the derived `Ord` compares `order_id` first, so sorting
/// a batch orders it by order id and places identical records next to each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub order_id: OrderId,
    pub deal_id: DealId,
    pub email_address: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub credit_card_number: String,
}

#[allow(unused)]
impl PurchaseRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        deal_id: DealId,
        email_address: &str,
        street_address: &str,
        city: &str,
        state: &str,
        zip_code: &str,
        credit_card_number: &str,
    ) -> Self {
        Self {
            order_id,
            deal_id,
            email_address: email_address.to_string(),
            street_address: street_address.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            zip_code: zip_code.to_string(),
            credit_card_number: credit_card_number.to_string(),
        }
    }

    pub fn same_deal(&self, other: &PurchaseRecord) -> bool {
        self.deal_id == other.deal_id
    }

    /// Card numbers are opaque, compared byte for byte.
    pub fn same_card(&self, other: &PurchaseRecord) -> bool {
        self.credit_card_number == other.credit_card_number
    }
}

/// Request body of the validate endpoint.
///
/// `purchases` is optional so that an absent or `null` collection can be told
/// apart from a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseBatch {
    #[serde(default)]
    pub purchases: Option<Vec<PurchaseRecord>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_wire_format() {
        let json = r#"{
            "orderId": 7,
            "dealId": 1,
            "emailAddress": "bugs@bunny.com",
            "streetAddress": "123 Sesame St.",
            "city": "New York",
            "state": "NY",
            "zipCode": "10011",
            "creditCardNumber": "12345689010"
        }"#;
        let record: PurchaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.order_id, 7);
        assert_eq!(record.zip_code, "10011");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["creditCardNumber"], "12345689010");
        assert_eq!(value["streetAddress"], "123 Sesame St.");
    }

    #[test]
    fn test_zip_code_keeps_leading_zeros() {
        let json = r#"{"orderId":1,"dealId":1,"emailAddress":"a@b.c","streetAddress":"x",
            "city":"y","state":"MA","zipCode":"02134","creditCardNumber":"1"}"#;
        let record: PurchaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.zip_code, "02134");
    }

    #[test]
    fn test_batch_without_purchases() {
        let batch: PurchaseBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.purchases.is_none());

        let batch: PurchaseBatch = serde_json::from_str(r#"{"purchases":null}"#).unwrap();
        assert!(batch.purchases.is_none());
    }

    #[test]
    fn test_ordering_follows_order_id() {
        let a = PurchaseRecord::new(2, 9, "a@x.com", "s", "c", "st", "z", "1");
        let b = PurchaseRecord::new(10, 1, "a@x.com", "s", "c", "st", "z", "1");
        assert!(a < b);
    }
}
