// Utility functions for recommendation-engine

use ndarray::ArrayView1;
use std::collections::HashSet;
use std::hash::Hash;

/// Cosine similarity between two vectors of equal length.
///
/// Returns `None` when the lengths differ. A zero-norm vector yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let a = ArrayView1::from(a).mapv(f64::from);
    let b = ArrayView1::from(b).mapv(f64::from);

    let dot_product = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Map a cosine similarity from [-1, 1] onto [0, 1].
pub fn remap_similarity(similarity: f64) -> f64 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Jaccard index of two collections treated as sets. Two empty sets score 0.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// First `max_chars` Unicode scalar values of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-6);

        let c = [1.0, 0.0, 0.0];
        let d = [0.0, 1.0, 0.0];
        assert!(cosine_similarity(&c, &d).unwrap().abs() < 1e-6);

        let e = [-1.0, 0.0];
        let f = [1.0, 0.0];
        assert!((cosine_similarity(&e, &f).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatch_and_zero() {
        assert!(cosine_similarity(&[1.0, 2.0], &[1.0]).is_none());
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), Some(0.0));
    }

    #[test]
    fn test_remap_similarity() {
        assert!((remap_similarity(-1.0) - 0.0).abs() < 1e-9);
        assert!((remap_similarity(0.0) - 0.5).abs() < 1e-9);
        assert!((remap_similarity(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard() {
        let a: HashSet<&str> = ["rust", "go"].into_iter().collect();
        let b: HashSet<&str> = ["rust", "python", "c"].into_iter().collect();
        assert!((jaccard(&a, &b) - 0.25).abs() < 1e-9);

        let empty: HashSet<&str> = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 0.0);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 200), "hi");
        // multi-byte characters are counted once each
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }
}
