//! Word-order-insensitive string similarity.

/// Lowercase, replace non-alphanumerics with spaces, sort tokens.
pub fn sorted_tokens(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Token-sort similarity on a 0..=100 scale.
///
/// Both strings are reduced to their sorted token form and compared with
/// the indel ratio `2 * LCS / (len(a) + len(b))`, where LCS is the longest
/// common character subsequence. Either side empty after cleaning scores 0,
/// so blank names never match anything.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    sorted_similarity(&sorted_tokens(a), &sorted_tokens(b))
}

/// Similarity of two strings already in sorted-token form.
pub fn sorted_similarity(a_sorted: &str, b_sorted: &str) -> f64 {
    if a_sorted.is_empty() || b_sorted.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a_sorted.chars().collect();
    let b: Vec<char> = b_sorted.chars().collect();
    let common = longest_common_subsequence(&a, &b);
    (2 * common) as f64 / (a.len() + b.len()) as f64 * 100.0
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}
