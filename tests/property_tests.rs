use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use promo_orders_api::entities::product;
use promo_orders_api::services::orders::line_amounts;

fn make_product(price: i64, crate_qty: i32, free_qty: i32, crate_price: i64) -> product::Model {
    product::Model {
        id: 1,
        name: "prop".to_string(),
        product_price: Decimal::from(price),
        crate_qty_per_product: crate_qty,
        promotion_free_qty: free_qty,
        crate_price: Decimal::from(crate_price),
        images: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

proptest! {
    /// The per-line math matches the documented formulas, checked against
    /// plain integer arithmetic.
    #[test]
    fn line_amounts_match_integer_reference(
        price in 0i64..10_000_000,
        crate_qty in 0i32..20,
        free_qty in 0i32..20,
        crate_price in 0i64..1_000_000,
        qty in 1i32..500,
    ) {
        let product = make_product(price, crate_qty, free_qty, crate_price);
        let (crate_fee, subtotal) = line_amounts(&product, qty);

        let expected_fee = (crate_qty as i128 + free_qty as i128)
            * qty as i128
            * crate_price as i128;
        let expected_subtotal = qty as i128 * price as i128;

        prop_assert_eq!(crate_fee, Decimal::from_i128_with_scale(expected_fee, 0));
        prop_assert_eq!(subtotal, Decimal::from_i128_with_scale(expected_subtotal, 0));
    }

    /// An order's grand total always equals the sum of its per-line crate
    /// fees plus the sum of its per-line subtotals.
    #[test]
    fn grand_total_is_the_sum_of_its_parts(
        lines in proptest::collection::vec(
            (0i64..1_000_000, 0i32..10, 0i32..10, 0i64..100_000, 1i32..100),
            1..8,
        )
    ) {
        let mut crate_fee_total = Decimal::ZERO;
        let mut subtotal_total = Decimal::ZERO;
        let mut per_line = Vec::new();

        for (price, crate_qty, free_qty, crate_price, qty) in &lines {
            let product = make_product(*price, *crate_qty, *free_qty, *crate_price);
            let (fee, sub) = line_amounts(&product, *qty);
            crate_fee_total += fee;
            subtotal_total += sub;
            per_line.push((fee, sub));
        }

        let grand_total = crate_fee_total + subtotal_total;

        let recomputed: Decimal = per_line.iter().map(|(fee, sub)| fee + sub).sum();
        prop_assert_eq!(grand_total, recomputed);
    }

    /// Splitting a quantity across two lines of the same product never
    /// changes the totals.
    #[test]
    fn line_amounts_are_linear_in_quantity(
        price in 0i64..1_000_000,
        crate_qty in 0i32..10,
        free_qty in 0i32..10,
        crate_price in 0i64..100_000,
        qty_a in 1i32..200,
        qty_b in 1i32..200,
    ) {
        let product = make_product(price, crate_qty, free_qty, crate_price);
        let (fee_a, sub_a) = line_amounts(&product, qty_a);
        let (fee_b, sub_b) = line_amounts(&product, qty_b);
        let (fee_ab, sub_ab) = line_amounts(&product, qty_a + qty_b);

        prop_assert_eq!(fee_a + fee_b, fee_ab);
        prop_assert_eq!(sub_a + sub_b, sub_ab);
    }
}
