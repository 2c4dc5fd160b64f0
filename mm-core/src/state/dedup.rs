//! Event Dedup (§4.2): collapses duplicate fill notifications keyed by
//! `(order_id, cumulative_filled_qty)` within a TTL window. Entries expire
//! lazily — no background sweeper.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use crate::core::types::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupKey {
    order_id: OrderId,
    cum_filled: Decimal,
}

impl DedupKey {
    fn new(order_id: OrderId, cum_filled: Decimal) -> Self {
        Self { order_id, cum_filled: cum_filled.normalize() }
    }
}

pub struct EventDedup {
    ttl: Duration,
    seen: HashMap<DedupKey, Instant>,
}

impl EventDedup {
    pub fn new(ttl_sec: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_sec),
            seen: HashMap::new(),
        }
    }

    /// Returns `true` if `(order_id, cum_filled)` was already seen within
    /// the TTL window; otherwise records it as seen now and returns
    /// `false`. Applied only to fill events (§4.2).
    pub fn check_and_insert(&mut self, order_id: OrderId, cum_filled: Decimal) -> bool {
        let key = DedupKey::new(order_id, cum_filled);
        let now = Instant::now();

        self.seen.retain(|_, ts| now.duration_since(*ts) < self.ttl);

        if let Some(ts) = self.seen.get(&key) {
            if now.duration_since(*ts) < self.ttl {
                return true;
            }
        }
        self.seen.insert(key, now);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_occurrence_is_not_a_duplicate() {
        let mut dedup = EventDedup::new(60);
        assert!(!dedup.check_and_insert(OrderId(1), dec!(0.01)));
    }

    #[test]
    fn repeated_key_within_ttl_is_a_duplicate() {
        let mut dedup = EventDedup::new(60);
        assert!(!dedup.check_and_insert(OrderId(1), dec!(0.01)));
        assert!(dedup.check_and_insert(OrderId(1), dec!(0.01)));
    }

    #[test]
    fn different_cum_filled_is_not_a_duplicate() {
        let mut dedup = EventDedup::new(60);
        assert!(!dedup.check_and_insert(OrderId(1), dec!(0.01)));
        assert!(!dedup.check_and_insert(OrderId(1), dec!(0.02)));
    }

    proptest! {
        /// Replaying a shuffled stream with duplicate `(order_id, cum_filled)`
        /// pairs mixed in always reports exactly one "first occurrence" per
        /// distinct pair, however the duplicates are interleaved.
        #[test]
        fn replay_with_duplicates_counts_each_distinct_pair_once(
            pairs in prop::collection::vec((1u64..20, 0i64..50), 1..40),
            seed in any::<u64>(),
        ) {
            use std::collections::HashSet;

            let mut events: Vec<(OrderId, Decimal)> = pairs
                .iter()
                .map(|(id, qty)| (OrderId(*id), Decimal::new(*qty, 2)))
                .collect();
            // Duplicate every event once, then deterministically shuffle
            // via a simple seeded swap pass (no external RNG dependency).
            let doubled: Vec<_> = events.iter().cloned().chain(events.iter().cloned()).collect();
            events = doubled;
            let len = events.len();
            if len > 1 {
                for i in 0..len {
                    let j = ((seed.wrapping_add(i as u64)).wrapping_mul(2654435761)) as usize % len;
                    events.swap(i, j);
                }
            }

            let distinct: HashSet<(OrderId, Decimal)> =
                events.iter().map(|(id, qty)| (*id, qty.normalize())).collect();

            let mut dedup = EventDedup::new(3600);
            let mut first_occurrences = 0usize;
            for (id, qty) in &events {
                if !dedup.check_and_insert(*id, *qty) {
                    first_occurrences += 1;
                }
            }

            prop_assert_eq!(first_occurrences, distinct.len());
        }
    }
}
