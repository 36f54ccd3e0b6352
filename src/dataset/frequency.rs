//! Frequency List Module
//!
//! Weighted sampling of record ids. Logically a multiset in which each id
//! appears `weight` times; stored as cumulative weights so memory is linear
//! in the number of ids rather than in the total weight.

use rand::Rng;

// == Frequency List ==
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyList {
    ids: Vec<String>,
    /// `cumulative[i]` = sum of weights of `ids[0..=i]`
    cumulative: Vec<u64>,
}

impl FrequencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` with multiplicity `weight`. Zero weights are ignored.
    pub fn push(&mut self, id: impl Into<String>, weight: u64) {
        if weight == 0 {
            return;
        }
        let total = self.total_weight() + weight;
        self.ids.push(id.into());
        self.cumulative.push(total);
    }

    /// Length of the equivalent expanded multiset.
    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The id at position `index` of the expanded multiset.
    pub fn at(&self, index: u64) -> Option<&str> {
        if index >= self.total_weight() {
            return None;
        }
        let slot = self.cumulative.partition_point(|&c| c <= index);
        self.ids.get(slot).map(String::as_str)
    }

    /// Draws a uniform index into the multiset and returns its id.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.total_weight());
        self.at(index)
    }

    /// `(id, weight)` pairs in insertion order.
    pub fn weights(&self) -> impl Iterator<Item = (&str, u64)> {
        let mut previous = 0;
        self.ids.iter().zip(&self.cumulative).map(move |(id, &c)| {
            let weight = c - previous;
            previous = c;
            (id.as_str(), weight)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn expand(list: &FrequencyList) -> Vec<String> {
        list.weights()
            .flat_map(|(id, w)| std::iter::repeat(id.to_string()).take(w as usize))
            .collect()
    }

    #[test]
    fn test_empty_list() {
        let list = FrequencyList::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(list.is_empty());
        assert_eq!(list.total_weight(), 0);
        assert_eq!(list.at(0), None);
        assert_eq!(list.sample(&mut rng), None);
    }

    #[test]
    fn test_total_weight_is_sum_of_weights() {
        let mut list = FrequencyList::new();
        list.push("a", 3);
        list.push("b", 1);
        list.push("c", 100);
        assert_eq!(list.total_weight(), 104);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_zero_weight_ignored() {
        let mut list = FrequencyList::new();
        list.push("a", 0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_at_matches_expanded_multiset() {
        let mut list = FrequencyList::new();
        list.push("a", 2);
        list.push("b", 5);
        list.push("c", 1);
        list.push("a", 3);

        let expanded = expand(&list);
        assert_eq!(expanded.len() as u64, list.total_weight());
        for (i, id) in expanded.iter().enumerate() {
            assert_eq!(list.at(i as u64), Some(id.as_str()), "index {}", i);
        }
        assert_eq!(list.at(list.total_weight()), None);
    }

    #[test]
    fn test_weights_round_trip() {
        let mut list = FrequencyList::new();
        list.push("x", 7);
        list.push("y", 2);
        let weights: Vec<_> = list.weights().collect();
        assert_eq!(weights, vec![("x", 7), ("y", 2)]);
    }

    #[test]
    fn test_sample_favors_heavier_ids() {
        let mut list = FrequencyList::new();
        list.push("cold", 1);
        list.push("hot", 99);
        let mut rng = StdRng::seed_from_u64(99);

        let hot = (0..10_000)
            .filter(|_| list.sample(&mut rng) == Some("hot"))
            .count();
        assert!(hot > 9_700, "hot sampled {} times", hot);
    }
}
