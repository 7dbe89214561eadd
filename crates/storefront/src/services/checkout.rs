//! Checkout service: cart totals and order placement.
//!
//! Catalog prices are gross. The VAT line on cart and order pages is the
//! "ebből ÁFA" share of the gross subtotal and is never added on top; only
//! the shipping fee moves the payable total.

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use thiserror::Error;

use pitstop_core::UserId;

use crate::cache::CartSnapshot;
use crate::db::RepositoryError;
use crate::db::orders::{NewOrder, OrderRepository};
use crate::models::order::{Order, OrderLine, ShippingAddress};

/// Flat shipping fee in forints.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(1990, 0, 0, false, 0);

/// Carts at or above this gross subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(20_000, 0, 0, false, 0);

/// Hungarian VAT rate (27%).
pub const TAX_RATE: Decimal = Decimal::from_parts(27, 0, 0, false, 2);

/// The money lines shown on the cart page and frozen into an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Gross sum of line totals.
    pub subtotal: Decimal,
    /// VAT contained in the subtotal, rounded to whole forints.
    pub tax: Decimal,
    /// Flat fee, zero for an empty cart or above the free threshold.
    pub shipping_fee: Decimal,
    /// What the customer pays: subtotal plus shipping.
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute the totals for a cart snapshot.
    #[must_use]
    pub fn for_cart(cart: &CartSnapshot) -> Self {
        let subtotal = cart.subtotal();
        let tax = (subtotal * TAX_RATE)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let shipping_fee = if !cart.is_empty() && subtotal < FREE_SHIPPING_THRESHOLD {
            SHIPPING_FEE
        } else {
            Decimal::ZERO
        };

        Self {
            subtotal,
            tax,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }
}

/// Shipping form fields, as submitted.
#[derive(Debug, Clone, Default)]
pub struct ShippingInput {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub phone_number: String,
}

/// Rejected checkouts.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders cannot be placed from an empty cart.
    #[error("the cart is empty")]
    EmptyCart,

    /// Recipient name is required.
    #[error("full name is required")]
    MissingFullName,

    /// Street address is required.
    #[error("address is required")]
    MissingAddress,

    /// City is required.
    #[error("city is required")]
    MissingCity,

    /// Hungarian postal codes are exactly four digits.
    #[error("invalid postal code")]
    InvalidPostalCode,

    /// A phone number of 6-12 digits is required for delivery.
    #[error("invalid phone number")]
    InvalidPhoneNumber,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout service.
pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate the shipping form into an address.
    ///
    /// # Errors
    ///
    /// Returns the first failing field's `CheckoutError`.
    pub fn validate_address(input: &ShippingInput) -> Result<ShippingAddress, CheckoutError> {
        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(CheckoutError::MissingFullName);
        }

        let address = input.address.trim();
        if address.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }

        let city = input.city.trim();
        if city.is_empty() {
            return Err(CheckoutError::MissingCity);
        }

        let postal_code = input.postal_code.trim();
        if postal_code.len() != 4 || !postal_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CheckoutError::InvalidPostalCode);
        }

        let phone_number = input.phone_number.trim();
        if !(6..=12).contains(&phone_number.len())
            || !phone_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(CheckoutError::InvalidPhoneNumber);
        }

        Ok(ShippingAddress {
            full_name: full_name.to_owned(),
            address: address.to_owned(),
            city: city.to_owned(),
            postal_code: postal_code.to_owned(),
            phone_number: Some(phone_number.to_owned()),
        })
    }

    /// Place an order from the cart, freezing lines, address and totals.
    ///
    /// The cart itself is untouched; the caller clears it once this
    /// returns so a failed insert never costs the customer their cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart, a validation
    /// error for a bad shipping form, or `CheckoutError::Repository` if
    /// the insert fails.
    pub async fn place_order(
        &self,
        user_id: UserId,
        cart: &CartSnapshot,
        input: &ShippingInput,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let shipping = Self::validate_address(input)?;
        let totals = OrderTotals::for_cart(cart);

        let items = cart
            .lines
            .iter()
            .map(|line| OrderLine {
                part_id: line.part.id,
                name: line.part.name.clone(),
                brand: line.part.brand.clone(),
                unit_price: line.part.price,
                quantity: line.quantity,
            })
            .collect();

        let order = self
            .orders
            .create(NewOrder {
                user_id,
                items,
                shipping,
                subtotal: totals.subtotal,
                tax: totals.tax,
                shipping_fee: totals.shipping_fee,
                total: totals.total,
            })
            .await?;

        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::CartLine;
    use crate::models::part::PartSummary;
    use pitstop_core::{OwnerKey, PartId};

    fn cart_with(prices_and_quantities: &[(i64, u32)]) -> CartSnapshot {
        let lines = prices_and_quantities
            .iter()
            .map(|&(price, quantity)| CartLine {
                part: PartSummary {
                    id: PartId::generate(),
                    name: "Alkatrész".into(),
                    category: "Motor".into(),
                    brand: "Bosch".into(),
                    price: Decimal::new(price, 0),
                    image_url: None,
                    description: None,
                },
                quantity,
            })
            .collect();
        CartSnapshot {
            owner: OwnerKey::Guest,
            lines,
        }
    }

    fn valid_input() -> ShippingInput {
        ShippingInput {
            full_name: "Teszt Elek".into(),
            address: "Fő utca 1.".into(),
            city: "Budapest".into(),
            postal_code: "1011".into(),
            phone_number: "06301234567".into(),
        }
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let totals = OrderTotals::for_cart(&cart_with(&[]));
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.shipping_fee, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_small_cart_pays_shipping() {
        let totals = OrderTotals::for_cart(&cart_with(&[(4500, 1)]));
        assert_eq!(totals.subtotal, Decimal::new(4500, 0));
        assert_eq!(totals.shipping_fee, SHIPPING_FEE);
        assert_eq!(totals.total, Decimal::new(6490, 0));
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        let totals = OrderTotals::for_cart(&cart_with(&[(20_000, 1)]));
        assert_eq!(totals.shipping_fee, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::new(20_000, 0));

        let below = OrderTotals::for_cart(&cart_with(&[(19_999, 1)]));
        assert_eq!(below.shipping_fee, SHIPPING_FEE);
    }

    #[test]
    fn test_tax_is_contained_not_added() {
        let totals = OrderTotals::for_cart(&cart_with(&[(24_500, 2), (4500, 1)]));
        assert_eq!(totals.subtotal, Decimal::new(53_500, 0));
        assert_eq!(totals.tax, Decimal::new(14_445, 0));
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_tax_rounds_to_whole_forints() {
        // 101 * 0.27 = 27.27
        let totals = OrderTotals::for_cart(&cart_with(&[(101, 1)]));
        assert_eq!(totals.tax, Decimal::new(27, 0));
    }

    #[test]
    fn test_address_validation_accepts_good_input() {
        let address = CheckoutService::validate_address(&valid_input()).unwrap();
        assert_eq!(address.city, "Budapest");
        assert_eq!(address.phone_number.as_deref(), Some("06301234567"));
    }

    #[test]
    fn test_address_validation_field_errors() {
        let mut input = valid_input();
        input.full_name = "  ".into();
        assert!(matches!(
            CheckoutService::validate_address(&input),
            Err(CheckoutError::MissingFullName)
        ));

        let mut input = valid_input();
        input.postal_code = "10A1".into();
        assert!(matches!(
            CheckoutService::validate_address(&input),
            Err(CheckoutError::InvalidPostalCode)
        ));

        let mut input = valid_input();
        input.postal_code = "10111".into();
        assert!(matches!(
            CheckoutService::validate_address(&input),
            Err(CheckoutError::InvalidPostalCode)
        ));

        let mut input = valid_input();
        input.phone_number = "12345".into();
        assert!(matches!(
            CheckoutService::validate_address(&input),
            Err(CheckoutError::InvalidPhoneNumber)
        ));
    }
}
