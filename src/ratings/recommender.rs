use super::similarity::{common_keys, Metric};
use super::store::RatingStore;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_TOP_N: usize = 5;

/// Predicted score per attribute the target has not rated yet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ranking {
    pub scores: HashMap<String, f64>,
}

impl Ranking {
    #[cfg(test)]
    pub fn get(&self, attribute: &str) -> Option<f64> {
        self.scores.get(attribute).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Attribute/score pairs, best first, ties broken by name.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked = self
            .scores
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect::<Vec<_>>();
        ranked.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }
}

#[derive(Clone, Debug)]
pub struct Neighbour<'a> {
    pub entity: &'a str,
    pub similarity: f64,
}

impl PartialOrd for Neighbour<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbour<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.similarity
            .partial_cmp(&other.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.entity.cmp(self.entity))
    }
}

impl PartialEq for Neighbour<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbour<'_> {}

/// Similarity-weighted average of the other entities' ratings, for every
/// attribute `target` has not rated.
///
/// Entities with a non-positive similarity are left out entirely, so every
/// weight that reaches the division is strictly positive. Compared with
/// skipping only negative similarities, the sole difference is that
/// attributes reachable only through zero-similarity neighbours are dropped
/// instead of scoring 0/0.
pub fn recommend(store: &RatingStore, target: &str, metric: Metric) -> Ranking {
    let Some(k1) = store.get(target) else {
        warn!("recommend: entity {} not in store", target);
        return Ranking::default();
    };

    let mut total: HashMap<&str, f64> = HashMap::new();
    let mut total_sim: HashMap<&str, f64> = HashMap::new();

    for (p2, k2) in store.iter() {
        if p2 == target {
            continue;
        }
        let common = common_keys(k1, k2);
        let sim = metric.score(k1, k2);
        debug!("{} {} vs {}: {}", metric, target, p2, sim);
        if sim <= 0.0 {
            continue;
        }

        for (key, value) in k2.iter() {
            if common.contains(key.as_str()) {
                continue;
            }
            *total.entry(key.as_str()).or_default() += value * sim;
            *total_sim.entry(key.as_str()).or_default() += sim;
        }
    }

    let scores = total
        .into_iter()
        .map(|(key, sum)| (key.to_string(), sum / total_sim[key]))
        .collect();

    Ranking { scores }
}

/// Similarity of `target` against every other entity, in store iteration
/// order. Neither sorted nor truncated; `n` is only normalised.
pub fn top(store: &RatingStore, target: &str, n: usize, metric: Metric) -> Vec<f64> {
    let Some(k1) = store.get(target) else {
        warn!("top: entity {} not in store", target);
        return Vec::new();
    };
    let n = if n == 0 { DEFAULT_TOP_N } else { n }.min(store.len());

    let scores = store
        .iter()
        .filter(|(entity, _)| entity.as_str() != target)
        .map(|(_, k2)| metric.score(k1, k2))
        .collect::<Vec<_>>();
    debug!(
        "top: {} requested {} of {} scores",
        target,
        n,
        scores.len()
    );

    scores
}

/// The `n` entities most similar to `target`, best first (`n == 0` means
/// [`DEFAULT_TOP_N`]).
pub fn most_similar<'a>(
    store: &'a RatingStore,
    target: &str,
    n: usize,
    metric: Metric,
) -> Vec<Neighbour<'a>> {
    let Some(k1) = store.get(target) else {
        return Vec::new();
    };
    let n = if n == 0 { DEFAULT_TOP_N } else { n };

    let mut top_n = store
        .iter()
        .filter(|(entity, _)| entity.as_str() != target)
        .map(|(entity, k2)| Neighbour {
            entity: entity.as_str(),
            similarity: metric.score(k1, k2),
        })
        .collect::<Vec<_>>();
    top_n.sort_unstable_by(|a, b| b.cmp(a));
    top_n.truncate(n);

    top_n
}

#[cfg(test)]
mod tests {
    use super::super::store::tests::store;
    use super::*;
    use proptest::prelude::*;

    fn critics() -> RatingStore {
        store(vec![
            ("A", vec![("x", 1.0), ("y", 2.0)]),
            ("B", vec![("x", 1.0), ("y", 2.0)]),
            ("C", vec![("x", 5.0), ("y", 1.0)]),
        ])
    }

    #[test]
    fn recommends_weighted_average() {
        let s = store(vec![
            ("A", vec![("x", 1.0)]),
            ("B", vec![("x", 1.0), ("y", 5.0)]),
            ("C", vec![("x", 1.0), ("y", 3.0)]),
        ]);
        let ranking = recommend(&s, "A", Metric::Euclidean);

        // both neighbours agree on x, so each has similarity 1
        assert_eq!(ranking.len(), 1);
        assert!((ranking.get("y").unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(ranking.get("x"), None);
    }

    #[test]
    fn weights_follow_similarity() {
        let s = store(vec![
            ("A", vec![("x", 1.0)]),
            ("B", vec![("x", 1.0), ("y", 5.0)]),
            ("C", vec![("x", 2.0), ("y", 2.0)]),
        ]);
        let ranking = recommend(&s, "A", Metric::Euclidean);

        // sim(B) = 1, sim(C) = 1/2
        let expected = (5.0 * 1.0 + 2.0 * 0.5) / 1.5;
        assert!((ranking.get("y").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn negative_similarity_is_skipped() {
        let s = store(vec![
            ("A", vec![("x", 1.0), ("y", 2.0)]),
            ("B", vec![("x", 1.0), ("y", 2.0), ("z", 4.0)]),
            ("C", vec![("x", 5.0), ("y", 1.0), ("z", 1.0), ("w", 3.0)]),
        ]);
        let ranking = recommend(&s, "A", Metric::Pearson);

        // C is perfectly anti-correlated with A and contributes nothing
        assert!((ranking.get("z").unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(ranking.get("w"), None);

        let ranking = recommend(&s, "A", Metric::Euclidean);
        assert!(ranking.get("w").is_some());
    }

    #[test]
    fn zero_similarity_contributes_nothing() {
        let s = store(vec![("A", vec![("x", 1.0)]), ("B", vec![("y", 5.0)])]);
        for metric in Metric::ALL {
            assert!(recommend(&s, "A", metric).is_empty());
        }
    }

    #[test]
    fn empty_store() {
        let s = RatingStore::default();
        assert!(recommend(&s, "A", Metric::Pearson).is_empty());
        assert!(top(&s, "A", 5, Metric::Pearson).is_empty());
        assert!(most_similar(&s, "A", 5, Metric::Pearson).is_empty());
    }

    #[test]
    fn single_entity() {
        let s = store(vec![("A", vec![("x", 1.0), ("y", 2.0)])]);
        for metric in Metric::ALL {
            assert!(recommend(&s, "A", metric).is_empty());
            assert!(top(&s, "A", 0, metric).is_empty());
        }
    }

    #[test]
    fn unknown_target() {
        let s = critics();
        assert!(recommend(&s, "Z", Metric::Euclidean).is_empty());
        assert!(top(&s, "Z", 3, Metric::Euclidean).is_empty());
    }

    #[test]
    fn top_returns_every_other_score() {
        let s = critics();
        let mut scores = top(&s, "A", 1, Metric::Pearson);
        assert_eq!(scores.len(), 2);
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((scores[0] + 1.0).abs() < 1e-12);
        assert!((scores[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn most_similar_sorts_and_truncates() {
        let s = critics();
        let neighbours = most_similar(&s, "A", 1, Metric::Euclidean);
        assert_eq!(neighbours.len(), 1);
        assert_eq!(neighbours[0].entity, "B");
        assert_eq!(neighbours[0].similarity, 1.0);

        let neighbours = most_similar(&s, "C", 0, Metric::Euclidean);
        assert_eq!(neighbours.len(), 2);
        // tie on similarity, broken by name
        assert_eq!(neighbours[0].entity, "A");
        assert_eq!(neighbours[1].entity, "B");
    }

    #[test]
    fn ranked_orders_by_score() {
        let ranking = Ranking {
            scores: HashMap::from([
                ("b".to_string(), 2.0),
                ("a".to_string(), 2.0),
                ("c".to_string(), 3.5),
            ]),
        };
        assert_eq!(ranking.ranked(), vec![("c", 3.5), ("a", 2.0), ("b", 2.0)]);
    }

    #[test]
    fn item_based_after_transpose() {
        let s = store(vec![
            ("ann", vec![("dune", 5.0), ("alien", 4.0)]),
            ("bob", vec![("dune", 5.0), ("alien", 4.0), ("heat", 2.0)]),
        ])
        .transpose();
        // bob already rated heat, ann is the only candidate
        let ranking = recommend(&s, "heat", Metric::Euclidean);
        assert!(ranking.get("bob").is_none());
        // sim(dune) = 1/10, sim(alien) = 1/5
        let expected = (5.0 * 0.1 + 4.0 * 0.2) / 0.3;
        assert!((ranking.get("ann").unwrap() - expected).abs() < 1e-12);
        let ranking = recommend(&s, "dune", Metric::Euclidean);
        assert!(ranking.is_empty());
    }

    fn arb_store() -> impl Strategy<Value = RatingStore> {
        proptest::collection::hash_map(
            "[a-d]",
            proptest::collection::hash_map("[p-u]", (1u8..=5).prop_map(f64::from), 1..5),
            1..6,
        )
        .prop_map(RatingStore::new)
    }

    proptest! {
        #[test]
        fn never_recommends_rated_attributes(s in arb_store()) {
            for target in s.entities() {
                let rated = s.get(target).unwrap();
                for metric in Metric::ALL {
                    let ranking = recommend(&s, target, metric);
                    for key in ranking.scores.keys() {
                        prop_assert!(!rated.contains_key(key), "{} recommended to {}", key, target);
                    }
                    for score in ranking.scores.values() {
                        prop_assert!(score.is_finite());
                    }
                }
            }
        }

        #[test]
        fn top_covers_all_others(s in arb_store(), n in 0usize..8) {
            for target in s.entities() {
                prop_assert_eq!(top(&s, target, n, Metric::Euclidean).len(), s.len() - 1);
            }
        }
    }
}
