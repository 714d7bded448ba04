//! Group-key aggregation shared by the detection rules.
//!
//! Rules tag rows by set membership: aggregate per key, keep the keys that
//! cross the threshold, then test each row's key against that set.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Number of occurrences of each key.
pub fn group_counts<K, I>(keys: I) -> HashMap<K, usize>
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let mut counts = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Number of distinct values seen under each key.
pub fn distinct_counts<K, V, I>(pairs: I) -> HashMap<K, usize>
where
    K: Eq + Hash,
    V: Eq + Hash,
    I: IntoIterator<Item = (K, V)>,
{
    let mut seen: HashMap<K, HashSet<V>> = HashMap::new();
    for (key, value) in pairs {
        seen.entry(key).or_default().insert(value);
    }
    seen.into_iter().map(|(k, values)| (k, values.len())).collect()
}

/// Arithmetic mean of the values under each key.
/// Values are summed in iteration order, so results are reproducible.
pub fn group_means<K, I>(pairs: I) -> HashMap<K, f64>
where
    K: Eq + Hash,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut sums: HashMap<K, (f64, usize)> = HashMap::new();
    for (key, value) in pairs {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Keys whose aggregate satisfies `keep`.
pub fn keys_where<K, F>(aggregates: HashMap<K, usize>, keep: F) -> HashSet<K>
where
    K: Eq + Hash,
    F: Fn(usize) -> bool,
{
    aggregates
        .into_iter()
        .filter_map(|(k, n)| keep(n).then_some(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_thresholds() {
        let counts = group_counts(["a", "b", "a", "a"]);
        assert_eq!(counts["a"], 3);
        assert_eq!(counts["b"], 1);
        let hot = keys_where(counts, |n| n > 2);
        assert!(hot.contains("a"));
        assert!(!hot.contains("b"));
    }

    #[test]
    fn distinct_ignores_repeats() {
        let users = distinct_counts([("dev", "u1"), ("dev", "u1"), ("dev", "u2")]);
        assert_eq!(users["dev"], 2);
    }

    #[test]
    fn means_per_key() {
        let means = group_means([("u", 10.0), ("u", 30.0), ("v", 5.0)]);
        assert_eq!(means["u"], 20.0);
        assert_eq!(means["v"], 5.0);
    }
}
