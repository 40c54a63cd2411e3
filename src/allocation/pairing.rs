//! Odd/even week pairing.
//!
//! Two units meeting at the same day and clock range, one in odd weeks
//! only and one in even weeks only, never clash and together form a
//! weekly commitment. Giving both to one person keeps the slot with a
//! single teacher across the semester.

use crate::models::{Day, Parity, TimeRange, WeekSet};

/// Finds odd/even pairs among candidate units.
///
/// Each candidate is `(key, day, time, weeks)` taken from the unit's lead
/// row. Every pure-odd unit, in input order, pairs with the first unused
/// pure-even unit at the same day and time. Mixed or empty week sets never
/// pair, and no unit appears in more than one pair.
pub fn find_pairs<K, I>(candidates: I) -> Vec<(K, K)>
where
    K: Copy,
    I: IntoIterator<Item = (K, Day, TimeRange, WeekSet)>,
{
    let mut odd = Vec::new();
    let mut even = Vec::new();
    for (key, day, time, weeks) in candidates {
        match weeks.parity() {
            Some(Parity::Odd) => odd.push((key, day, time)),
            Some(Parity::Even) => even.push((key, day, time)),
            None => {}
        }
    }

    let mut used = vec![false; even.len()];
    let mut pairs = Vec::new();
    for (odd_key, day, time) in odd {
        let found = even
            .iter()
            .enumerate()
            .find(|(i, (_, d, t))| !used[*i] && *d == day && *t == time);
        if let Some((i, &(even_key, _, _))) = found {
            used[i] = true;
            pairs.push((odd_key, even_key));
        }
    }
    pairs
}
