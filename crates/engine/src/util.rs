/// Levenshtein edit distance over Unicode scalar values, using the two-row
/// O(min(m,n)) space algorithm. Accented letters count as one symbol each.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Shorter string drives the outer loop; rows are sized by the longer one.
    let (a, b, m, n) = if m <= n { (a, b, m, n) } else { (b, a, n, m) };

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Whole-string similarity `(max_len - distance) / max_len` in [0.0, 1.0].
///
/// Not tokenized: a short keyword compared with a long description scores
/// low even when it occurs verbatim inside it.
pub fn similarity(s1: &str, s2: &str) -> f64 {
    let max_len = char_len(s1).max(char_len(s2));
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein_distance(s1, s2)) as f64 / max_len as f64
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Trimmed, lower-cased form used for exact and substring comparisons.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
