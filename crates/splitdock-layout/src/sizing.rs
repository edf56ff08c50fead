#![forbid(unsafe_code)]

//! Length apportionment.
//!
//! A container hands out its available length as if one unit at a time,
//! starting from every child's minimum. Each unit goes to the child with the highest
//! `percentage / (length + 0.5)` (the Sainte-Laguë divisor), ties resolved
//! towards the earliest child.
//!
//! Because the sequence of awards never depends on the total, growing the
//! total by one unit only ever adds one unit to one child. That makes window
//! resizes monotone: no child shrinks when its container grows and no child
//! grows when it shrinks. When percentages are exact ratios of integer
//! lengths that respect the minimums, the same lengths come back out, which
//! is what keeps save/restore and maximise/restore geometry stable.

/// What a visible child asks of its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LengthRequest {
    pub(crate) percentage: f64,
    pub(crate) min: i32,
}

/// Split `total` between `requests`.
///
/// If `total` is smaller than the sum of minimums every child gets its
/// minimum and the result overflows `total`; callers grow the window first.
pub(crate) fn apportion(total: i32, requests: &[LengthRequest]) -> Vec<i32> {
    let mut lengths: Vec<i32> = requests.iter().map(|r| r.min.max(0)).collect();
    if requests.is_empty() {
        return lengths;
    }

    let committed: i64 = lengths.iter().map(|&len| i64::from(len)).sum();
    if i64::from(total) <= committed {
        return lengths;
    }

    let weights = weights(requests);
    skip_ahead(&weights, &mut lengths, i64::from(total));
    let awarded: i64 = lengths.iter().map(|&len| i64::from(len)).sum();
    award_units(&weights, &mut lengths, i64::from(total) - awarded);
    lengths
}

/// Hand out `remaining` units one at a time by highest priority.
fn award_units(weights: &[f64], lengths: &mut [i32], mut remaining: i64) {
    while remaining > 0 {
        let mut best = 0;
        let mut best_priority = f64::NEG_INFINITY;
        for (index, weight) in weights.iter().enumerate() {
            let priority = weight / (f64::from(lengths[index]) + 0.5);
            if priority > best_priority {
                best = index;
                best_priority = priority;
            }
        }
        lengths[best] += 1;
        remaining -= 1;
    }
}

/// Jump to the state where every unit with priority above some threshold
/// has been awarded and no more than `total` is used.
///
/// Priorities of a child's successive units strictly decrease, so the units
/// above any threshold are exactly the first ones [`award_units`] would hand
/// out. Finishing with [`award_units`] gives the same lengths as awarding
/// everything one unit at a time.
fn skip_ahead(weights: &[f64], lengths: &mut [i32], total: i64) {
    let mins: Vec<i64> = lengths.iter().map(|&len| i64::from(len)).collect();
    let used = |threshold: f64| -> i64 {
        weights
            .iter()
            .zip(&mins)
            .map(|(&weight, &min)| units_above(weight, min, threshold, total))
            .sum()
    };

    // No unit is above the highest starting priority.
    let mut high = weights
        .iter()
        .zip(&mins)
        .map(|(&weight, &min)| weight / (min as f64 + 0.5))
        .fold(0.0_f64, f64::max);
    if high <= 0.0 {
        return;
    }
    let mut low = high;
    loop {
        low /= 2.0;
        if low <= 0.0 {
            return;
        }
        if used(low) > total {
            break;
        }
        high = low;
    }
    for _ in 0..64 {
        let mid = low + (high - low) / 2.0;
        if mid <= low || mid >= high {
            break;
        }
        if used(mid) > total {
            low = mid;
        } else {
            high = mid;
        }
    }

    for ((length, &weight), &min) in lengths.iter_mut().zip(weights).zip(&mins) {
        let units = units_above(weight, min, high, total);
        *length = i32::try_from(units).unwrap_or(i32::MAX);
    }
}

/// Length a child reaches once every unit with priority above `threshold`
/// is awarded, capped just past `total`.
fn units_above(weight: f64, min: i64, threshold: f64, total: i64) -> i64 {
    let cap = total + 1;
    if weight <= 0.0 || min >= cap {
        return min;
    }
    let estimate = (weight / threshold - 0.5).ceil();
    let mut length = if estimate.is_finite() {
        (estimate as i64).clamp(min, cap)
    } else {
        cap
    };
    while length > min && weight / ((length - 1) as f64 + 0.5) <= threshold {
        length -= 1;
    }
    while length < cap && weight / (length as f64 + 0.5) > threshold {
        length += 1;
    }
    length
}

/// Usable weights; falls back to an even split when no percentage is usable.
fn weights(requests: &[LengthRequest]) -> Vec<f64> {
    let usable = |p: f64| p.is_finite() && p > 0.0;
    if requests.iter().any(|r| usable(r.percentage)) {
        requests
            .iter()
            .map(|r| if usable(r.percentage) { r.percentage } else { 0.0 })
            .collect()
    } else {
        vec![1.0; requests.len()]
    }
}

/// Take up to `amount` units from `lengths`, visiting `order` and never
/// going below `mins`. Returns how much was actually taken.
pub(crate) fn shrink_in_order(
    lengths: &mut [i32],
    mins: &[i32],
    order: impl IntoIterator<Item = usize>,
    amount: i32,
) -> i32 {
    let mut left = amount;
    for index in order {
        if left <= 0 {
            break;
        }
        let slack = (lengths[index] - mins[index]).max(0);
        let take = slack.min(left);
        lengths[index] -= take;
        left -= take;
    }
    amount - left
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn req(percentage: f64, min: i32) -> LengthRequest {
        LengthRequest { percentage, min }
    }

    #[test]
    fn even_split_favours_first_on_ties() {
        assert_eq!(apportion(495, &[req(0.5, 80), req(0.5, 80)]), vec![248, 247]);
        assert_eq!(apportion(496, &[req(0.5, 80), req(0.5, 80)]), vec![248, 248]);
    }

    #[test]
    fn exact_ratios_reproduce_lengths() {
        let lengths = [264, 263, 263];
        let total: i32 = lengths.iter().sum();
        let requests: Vec<_> = lengths
            .iter()
            .map(|&len| req(f64::from(len) / f64::from(total), 80))
            .collect();
        assert_eq!(apportion(total, &requests), lengths.to_vec());
    }

    #[test]
    fn minimums_are_respected_when_squeezed() {
        let out = apportion(300, &[req(0.9, 80), req(0.1, 200)]);
        assert_eq!(out, vec![100, 200]);
    }

    #[test]
    fn total_below_minimums_returns_minimums() {
        assert_eq!(apportion(50, &[req(0.5, 80), req(0.5, 80)]), vec![80, 80]);
        assert!(apportion(50, &[]).is_empty());
    }

    #[test]
    fn unusable_percentages_split_evenly() {
        assert_eq!(apportion(100, &[req(0.0, 0), req(f64::NAN, 0)]), vec![50, 50]);
    }

    #[test]
    fn shrink_nearest_first() {
        let mut lengths = vec![100, 100, 100];
        let mins = vec![80, 80, 80];
        let taken = shrink_in_order(&mut lengths, &mins, [2, 1, 0], 50);
        assert_eq!(taken, 50);
        assert_eq!(lengths, vec![90, 80, 80]);
        let taken = shrink_in_order(&mut lengths, &mins, [0], 50);
        assert_eq!(taken, 10);
    }

    /// Every unit awarded individually, from the minimums.
    fn apportion_by_units(total: i32, requests: &[LengthRequest]) -> Vec<i32> {
        let mut lengths: Vec<i32> = requests.iter().map(|r| r.min.max(0)).collect();
        if requests.is_empty() {
            return lengths;
        }
        let committed: i64 = lengths.iter().map(|&len| i64::from(len)).sum();
        award_units(&weights(requests), &mut lengths, i64::from(total) - committed);
        lengths
    }

    #[test]
    fn huge_totals_are_split_without_walking_every_unit() {
        let requests = [req(0.25, 80), req(0.5, 80), req(0.25, 80)];
        let total = 1_000_000_000;
        let out = apportion(total, &requests);
        assert_eq!(out.iter().map(|&len| i64::from(len)).sum::<i64>(), i64::from(total));
        assert_eq!(out, vec![250_000_000, 500_000_000, 250_000_000]);

        let ten: Vec<_> = (1..=10).map(|w| req(f64::from(w) / 55.0, 90)).collect();
        let out = apportion(i32::MAX, &ten);
        assert_eq!(out.iter().map(|&len| i64::from(len)).sum::<i64>(), i64::from(i32::MAX));
        for pair in out.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    fn requests_strategy() -> impl Strategy<Value = Vec<LengthRequest>> {
        prop::collection::vec((1u32..100, 0i32..120), 1..8).prop_map(|raw| {
            let sum: u32 = raw.iter().map(|(w, _)| *w).sum();
            raw.into_iter()
                .map(|(w, min)| req(f64::from(w) / f64::from(sum), min))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn growth_is_monotone(requests in requests_strategy(), total in 0i32..2000, delta in 0i32..400) {
            let small = apportion(total, &requests);
            let large = apportion(total + delta, &requests);
            for (a, b) in small.iter().zip(&large) {
                prop_assert!(b >= a);
            }
        }

        #[test]
        fn skipping_ahead_matches_unit_awards(requests in requests_strategy(), total in 0i32..5000) {
            prop_assert_eq!(apportion(total, &requests), apportion_by_units(total, &requests));
        }

        #[test]
        fn skipping_ahead_matches_with_unusable_weights(
            mins in prop::collection::vec(0i32..120, 1..6),
            total in 0i32..3000,
        ) {
            let requests: Vec<_> = mins.iter().map(|&min| req(0.0, min)).collect();
            prop_assert_eq!(apportion(total, &requests), apportion_by_units(total, &requests));
        }

        #[test]
        fn fills_total_exactly_when_feasible(requests in requests_strategy(), extra in 0i32..2000) {
            let min_sum: i32 = requests.iter().map(|r| r.min).sum();
            let out = apportion(min_sum + extra, &requests);
            prop_assert_eq!(out.iter().sum::<i32>(), min_sum + extra);
            for (len, r) in out.iter().zip(&requests) {
                prop_assert!(*len >= r.min);
            }
        }
    }
}
