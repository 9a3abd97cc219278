/// Euclidean (L2) distance between two vectors of equal length
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity computed directly
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine similarity of two unit vectors from their L2 distance
///
/// Only meaningful when both vectors are normalized.
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - (distance * distance) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean_distance(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_distance_to_similarity_boundaries() {
        assert_eq!(distance_to_similarity(0.0), 1.0);
        assert!(distance_to_similarity(2.0f32.sqrt()).abs() < 1e-6);
        assert!((distance_to_similarity(2.0) + 1.0).abs() < 1e-6);
        // threshold-implied minimum similarity
        assert!((distance_to_similarity(1.3) - 0.155).abs() < 1e-6);
    }

    fn arb_normalized(dim: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
            "non-zero vector",
            |mut v| {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm < 1e-3 {
                    return None;
                }
                v.iter_mut().for_each(|x| *x /= norm);
                Some(v)
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn distance_similarity_matches_cosine(
            a in arb_normalized(16),
            b in arb_normalized(16),
        ) {
            let via_distance = distance_to_similarity(euclidean_distance(&a, &b));
            let direct = cosine_similarity(&a, &b);
            prop_assert!((via_distance - direct).abs() < 1e-4,
                "distance-derived {} vs direct {}", via_distance, direct);
        }
    }
}
