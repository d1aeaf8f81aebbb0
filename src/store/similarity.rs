//! Vector distance helpers.

/// Cosine distance `1 - cos(a, b)` in `[0, 2]`.
///
/// Zero-length or mismatched inputs are treated as orthogonal (distance 1.0).
pub fn cosine_distance(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 1.0;
    }

    let mut dot = 0.0f64;
    let mut left_norm_sq = 0.0f64;
    let mut right_norm_sq = 0.0f64;

    for (l, r) in left.iter().zip(right.iter()) {
        let (l, r) = (*l as f64, *r as f64);
        dot += l * r;
        left_norm_sq += l * l;
        right_norm_sq += r * r;
    }

    if left_norm_sq <= f64::EPSILON || right_norm_sq <= f64::EPSILON {
        return 1.0;
    }

    1.0 - dot / (left_norm_sq.sqrt() * right_norm_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors_have_zero_distance() {
        let d = cosine_distance(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_opposite_and_orthogonal() {
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-9);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_distance(&[], &[]), 1.0);
    }
}
