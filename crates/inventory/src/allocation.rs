//! Proportional allocation math.
//!
//! A transport line item declares the quantity actually shipped; its linked
//! batches only record how much stock each batch had available at link time.
//! The shipped quantity is spread across the linked batches proportionally to
//! those availability figures.

use waybill_core::BatchId;

/// Split `total` across `weights` proportionally.
///
/// A single entry receives `total` outright, bypassing the division so no
/// rounding loss sneaks into the common case. Entries whose computed share is
/// zero or negative are dropped silently.
pub fn proportional_split(total: f64, weights: &[(BatchId, f64)]) -> Vec<(BatchId, f64)> {
    if total <= 0.0 || weights.is_empty() {
        return Vec::new();
    }

    if let [(batch_id, _)] = weights {
        return vec![(*batch_id, total)];
    }

    let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();
    if weight_sum <= 0.0 {
        return Vec::new();
    }

    weights
        .iter()
        .filter_map(|(batch_id, w)| {
            let share = (w / weight_sum) * total;
            (share > 0.0).then_some((*batch_id, share))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_batch_takes_the_full_quantity() {
        let id = BatchId::new();
        let shares = proportional_split(10.0, &[(id, 50.0)]);
        assert_eq!(shares, vec![(id, 10.0)]);
    }

    #[test]
    fn two_batches_split_proportionally() {
        let a = BatchId::new();
        let b = BatchId::new();
        let shares = proportional_split(10.0, &[(a, 30.0), (b, 20.0)]);

        assert_eq!(shares.len(), 2);
        assert!((shares[0].1 - 6.0).abs() < 1e-9);
        assert!((shares[1].1 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_batches_are_dropped() {
        let a = BatchId::new();
        let b = BatchId::new();
        let shares = proportional_split(10.0, &[(a, 25.0), (b, 0.0)]);

        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].0, a);
        assert!((shares[0].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_yields_nothing() {
        assert!(proportional_split(0.0, &[(BatchId::new(), 10.0)]).is_empty());
    }

    #[test]
    fn all_zero_weights_yield_nothing() {
        let weights = [(BatchId::new(), 0.0), (BatchId::new(), 0.0)];
        assert!(proportional_split(5.0, &weights).is_empty());
    }

    proptest! {
        #[test]
        fn shares_sum_to_total_for_positive_weights(
            total in 0.01f64..10_000.0,
            raw in proptest::collection::vec(0.01f64..1_000.0, 2..8),
        ) {
            let weights: Vec<(BatchId, f64)> =
                raw.iter().map(|w| (BatchId::new(), *w)).collect();

            let shares = proportional_split(total, &weights);
            let sum: f64 = shares.iter().map(|(_, q)| q).sum();

            prop_assert!((sum - total).abs() < 1e-6 * total.max(1.0));
            prop_assert!(shares.iter().all(|(_, q)| *q > 0.0));
        }
    }
}
