//! Typo suggestions for misspelled field names.

/// Upper bound on suggestions returned for one field.
pub const MAX_SUGGESTIONS: usize = 3;

/// Minimum normalized similarity for an edit-distance suggestion.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Ranks `candidates` by closeness to `target` and returns at most three.
///
/// Passes, in priority order: case-insensitive equality, case-insensitive
/// substring containment (either direction), then similarity above
/// [`SIMILARITY_THRESHOLD`]. A candidate keeps the rank of the first pass that
/// selects it.
pub fn suggest_fields<S: AsRef<str>>(target: &str, candidates: &[S]) -> Vec<String> {
    let target = target.to_lowercase();
    let lowered: Vec<(&str, String)> = candidates
        .iter()
        .map(|c| (c.as_ref(), c.as_ref().to_lowercase()))
        .collect();

    let mut picked: Vec<usize> = Vec::new();
    for pass in [Pass::Exact, Pass::Contains, Pass::Similar] {
        for (idx, (_, lower)) in lowered.iter().enumerate() {
            if picked.len() >= MAX_SUGGESTIONS {
                break;
            }
            if !picked.contains(&idx) && pass.accepts(&target, lower) {
                picked.push(idx);
            }
        }
    }

    picked
        .into_iter()
        .map(|idx| lowered[idx].0.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Pass {
    Exact,
    Contains,
    Similar,
}

impl Pass {
    fn accepts(self, target: &str, candidate: &str) -> bool {
        match self {
            Pass::Exact => candidate == target,
            Pass::Contains => candidate.contains(target) || target.contains(candidate),
            Pass::Similar => similarity(target, candidate) > SIMILARITY_THRESHOLD,
        }
    }
}

/// `(maxLen - distance) / maxLen`, case-insensitive, over chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a, &b);
    (longest - distance) as f64 / longest as f64
}

/// Single-character insert/delete/substitute edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    prev[b.len()]
}
