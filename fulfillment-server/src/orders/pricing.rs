//! Order pricing
//!
//! Amounts are computed once at creation and frozen on the order.
//! Everything is exact `Decimal` arithmetic; rounding to integer minor
//! units happens only at the payment-gateway boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::models::OrderItem;

/// VAT rate applied to the item subtotal (8%)
pub const VAT_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// The frozen money fields of an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingBreakdown {
    pub items_subtotal: Decimal,
    pub vat: Decimal,
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
}

/// Price a set of snapshotted items with the given flat shipping fee
pub fn price_items(items: &[OrderItem], shipping_fee: Decimal) -> PricingBreakdown {
    let items_subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
    let vat = items_subtotal * VAT_RATE;
    let total_amount = items_subtotal + vat + shipping_fee;

    PricingBreakdown {
        items_subtotal,
        vat,
        shipping_fee,
        total_amount,
    }
}

/// Convert a currency amount to integer minor units (centavos),
/// rounding to the nearest unit. Used only at the gateway boundary.
pub fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, unit_price: i64, quantity: u32) -> OrderItem {
        let unit_price = Decimal::from(unit_price);
        OrderItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            image: None,
            unit_price,
            quantity,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_two_item_order() {
        // 3 x 100 + 1 x 50 = 350, VAT 28, shipping 120, total 498
        let items = vec![item("beans", 100, 3), item("filter", 50, 1)];
        let pricing = price_items(&items, Decimal::from(120));

        assert_eq!(pricing.items_subtotal, Decimal::from(350));
        assert_eq!(pricing.vat, Decimal::from(28));
        assert_eq!(pricing.shipping_fee, Decimal::from(120));
        assert_eq!(pricing.total_amount, Decimal::from(498));
    }

    #[test]
    fn test_total_invariant() {
        let items = vec![item("a", 199, 2), item("b", 75, 3)];
        let pricing = price_items(&items, Decimal::from(120));
        assert_eq!(
            pricing.total_amount,
            pricing.items_subtotal + pricing.vat + pricing.shipping_fee
        );
    }

    #[test]
    fn test_empty_items_still_add_up() {
        let pricing = price_items(&[], Decimal::from(120));
        assert_eq!(pricing.items_subtotal, Decimal::ZERO);
        assert_eq!(pricing.vat, Decimal::ZERO);
        assert_eq!(pricing.total_amount, Decimal::from(120));
    }

    #[test]
    fn test_minor_units_rounding() {
        assert_eq!(to_minor_units(Decimal::from(498)), 49800);
        assert_eq!(to_minor_units(Decimal::new(1005, 2)), 1005); // 10.05
        assert_eq!(to_minor_units(Decimal::new(99999, 3)), 10000); // 99.999 -> 100.00
    }

    #[test]
    fn test_vat_rate_constant() {
        assert_eq!(VAT_RATE, Decimal::new(8, 2));
    }
}
