/*!
similar.rs - approximate token matching.

Scores a query against a name table with a normalized Levenshtein
similarity, scaled to 0..=100 and rounded half-up. Only names tied at the
best score survive, and only when that score is strictly above
`ACCEPT_THRESHOLD`.
*/

/// Scores must be strictly greater than this to be suggested.
pub const ACCEPT_THRESHOLD: u32 = 65;

/// A suggested name and its similarity score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: &'static str,
    pub score: u32,
}

/// Names tied at the best score above the threshold, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    candidates: Vec<Candidate>,
}

impl Matches {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// The accepted correction, if exactly one name qualified.
    pub fn unique(&self) -> Option<&'static str> {
        match self.candidates.as_slice() {
            [only] => Some(only.name),
            _ => None,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.name.to_string()).collect()
    }
}

/// Edit distance between two strings, counted in chars.
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
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Normalized similarity in `[0, 1]`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Similarity on the 0..=100 scale, rounded half-up.
pub fn score(a: &str, b: &str) -> u32 {
    (similarity(a, b) * 100.0 + 0.5).floor() as u32
}

/// Collect the names in `table` that best match `query`.
pub fn best_matches(query: &str, table: &'static [&'static str]) -> Matches {
    let mut max = 0;
    let mut candidates = Vec::new();
    for &name in table {
        let s = score(name, query);
        if s >= max {
            max = s;
            if s > ACCEPT_THRESHOLD {
                candidates.push(Candidate { name, score: s });
            }
        }
    }
    // Earlier entries may have been pushed before the maximum rose.
    candidates.retain(|c| c.score == max);
    Matches { candidates }
}

/* ---- Tests ---- */
