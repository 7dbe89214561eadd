//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pitstop_core::{OrderId, OrderStatus, PartId, UserId};

/// A placed order (domain type).
///
/// Line items and the shipping address are snapshots taken at checkout;
/// later catalog edits do not rewrite order history.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub shipping: ShippingAddress,
    /// Gross sum of line totals.
    pub subtotal: Decimal,
    /// 27% VAT contained in the gross subtotal (display only).
    pub tax: Decimal,
    /// 1990 Ft below the free-shipping threshold, otherwise 0.
    pub shipping_fee: Decimal,
    /// subtotal + shipping fee.
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of pieces across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// One line of an order: a part snapshot with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub part_id: PartId,
    pub name: String,
    pub brand: String,
    /// Gross unit price at the time of ordering.
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    /// Gross total for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Delivery address captured by the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    /// Hungarian postal code, four digits.
    pub postal_code: String,
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32, unit_price: i64) -> OrderLine {
        OrderLine {
            part_id: PartId::generate(),
            name: "Olajszűrő".into(),
            brand: "Mann-Filter".into(),
            unit_price: Decimal::new(unit_price, 0),
            quantity,
        }
    }

    #[test]
    fn test_line_total_multiplies_quantity() {
        assert_eq!(line(3, 4500).line_total(), Decimal::new(13_500, 0));
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let order = Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            items: vec![line(2, 1000), line(5, 200)],
            shipping: ShippingAddress {
                full_name: "Teszt Elek".into(),
                address: "Fő utca 1.".into(),
                city: "Budapest".into(),
                postal_code: "1011".into(),
                phone_number: None,
            },
            subtotal: Decimal::new(3000, 0),
            tax: Decimal::ZERO,
            shipping_fee: Decimal::ZERO,
            total: Decimal::new(3000, 0),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.item_count(), 7);
    }
}
