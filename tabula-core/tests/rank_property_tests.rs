//! Property-Based Tests for Similarity Ranking
//!
//! For any query and N candidates of the same dimensionality, ranking
//! returns exactly those N candidates in non-decreasing cosine distance.

use proptest::prelude::*;
use tabula_core::{rank_by_distance, EmbeddingVector};

fn arb_vector(dimensions: usize) -> impl Strategy<Value = EmbeddingVector> {
    prop::collection::vec(-1.0f32..1.0, dimensions)
        .prop_map(|data| EmbeddingVector::new(data, "test-model"))
}

fn arb_case() -> impl Strategy<Value = (EmbeddingVector, Vec<EmbeddingVector>)> {
    (1usize..16).prop_flat_map(|dimensions| {
        (
            arb_vector(dimensions),
            prop::collection::vec(arb_vector(dimensions), 0..20),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_rank_returns_every_candidate((query, candidates) in arb_case()) {
        let indexed: Vec<(usize, EmbeddingVector)> =
            candidates.into_iter().enumerate().collect();
        let n = indexed.len();

        let ranked = match rank_by_distance(&query, indexed, |(_, e)| e) {
            Ok(ranked) => ranked,
            Err(err) => {
                prop_assert!(false, "ranking failed: {:?}", err);
                return Ok(());
            }
        };

        prop_assert_eq!(ranked.len(), n);
        let mut seen: Vec<usize> = ranked.iter().map(|r| r.item.0).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_rank_is_non_decreasing((query, candidates) in arb_case()) {
        let ranked = match rank_by_distance(&query, candidates, |e| e) {
            Ok(ranked) => ranked,
            Err(err) => {
                prop_assert!(false, "ranking failed: {:?}", err);
                return Ok(());
            }
        };

        for pair in ranked.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }
    }
}
