//! Property-based tests for `Symbol`'s tick/step rounding (§4.5 "tick
//! alignment" step). Uses proptest to check invariants across randomized
//! prices rather than a handful of fixed examples.

#[cfg(test)]
mod tests {
    use super::super::types::Symbol;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn symbol() -> Symbol {
        Symbol {
            tick_size: dec!(0.1),
            qty_step: dec!(0.001),
            min_qty: dec!(0.001),
        }
    }

    fn arb_price() -> impl Strategy<Value = Decimal> {
        (1_000i64..200_000i64).prop_map(|cents| Decimal::new(cents, 1))
    }

    proptest! {
        /// `round_down` never produces a price above the input.
        #[test]
        fn round_down_never_exceeds_input(price in arb_price()) {
            let sym = symbol();
            prop_assert!(sym.round_down(price) <= price);
        }

        /// `round_up` never produces a price below the input.
        #[test]
        fn round_up_never_below_input(price in arb_price()) {
            let sym = symbol();
            prop_assert!(sym.round_up(price) >= price);
        }

        /// Both directions land on an exact multiple of `tick_size`.
        #[test]
        fn rounded_prices_are_tick_aligned(price in arb_price()) {
            let sym = symbol();
            let down = sym.round_down(price);
            let up = sym.round_up(price);
            prop_assert_eq!((down / sym.tick_size).fract(), Decimal::ZERO);
            prop_assert_eq!((up / sym.tick_size).fract(), Decimal::ZERO);
        }

        /// Rounding a price already on-tick is a no-op in both directions.
        #[test]
        fn on_tick_price_is_idempotent(ticks in 10_000i64..2_000_000i64) {
            let sym = symbol();
            let price = Decimal::new(ticks, 0) * sym.tick_size;
            prop_assert_eq!(sym.round_down(price), price);
            prop_assert_eq!(sym.round_up(price), price);
        }

        /// `round_qty` never returns below `min_qty`, regardless of input.
        #[test]
        fn round_qty_respects_floor(qty in 0i64..1000i64) {
            let sym = symbol();
            let qty = Decimal::new(qty, 4);
            prop_assert!(sym.round_qty(qty) >= sym.min_qty);
        }
    }
}
