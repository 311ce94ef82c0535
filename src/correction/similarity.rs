//! String similarity: Ratcliff/Obershelp ratio and a coarse phonetic key.

/// Ratcliff/Obershelp similarity `2·M / (|a| + |b|)` over characters.
///
/// `M` is the total size of the matching blocks found by repeatedly taking
/// the longest common substring and recursing on both sides of it. Two empty
/// strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`.
/// Ties go to the earliest start in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run[j + 1] = length of the match ending at a[i-1], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    for i in alo..ahi {
        let mut next = vec![0usize; b.len() + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j] + 1;
                next[j + 1] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        prev = next;
    }
    (best_i, best_j, best_k)
}

/// Coarse phonetic key: collapses common English digraphs and doubled
/// letters, drops a final silent `e`, and reads a final `y` as `i`.
pub fn phonetic_key(text: &str) -> String {
    const DIGRAPHS: &[(&str, &str)] = &[
        ("ph", "f"),
        ("ck", "k"),
        ("sh", "s"),
        ("ch", "c"),
        ("th", "t"),
        ("wh", "w"),
        ("ght", "t"),
        ("ough", "o"),
        ("augh", "af"),
        ("tion", "sn"),
        ("sion", "sn"),
        ("ance", "ns"),
        ("ence", "ns"),
    ];

    let mut key = text.to_lowercase();
    for (from, to) in DIGRAPHS {
        key = key.replace(from, to);
    }

    let mut collapsed = String::with_capacity(key.len());
    let mut last = None;
    for c in key.chars() {
        if last != Some(c) {
            collapsed.push(c);
        }
        last = Some(c);
    }

    if collapsed.ends_with('e') {
        collapsed.pop();
    }
    if collapsed.ends_with('y') {
        collapsed.pop();
        collapsed.push('i');
    }
    collapsed
}

/// Similarity of the phonetic keys of `a` and `b`.
pub fn phonetic_similarity(a: &str, b: &str) -> f64 {
    ratio(&phonetic_key(a), &phonetic_key(b))
}
