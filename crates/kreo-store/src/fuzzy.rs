//! Approximate string scoring for knowledge lookup.
//!
//! Scores follow the Fuse.js convention: `0.0` is a perfect match and `1.0`
//! is a complete mismatch. A field's score is the error ratio of the best
//! approximate substring match plus a proximity penalty for how far from the
//! start of the field the match begins. Field scores are combined into an
//! item score with a weighted, length-normalized product.

/// Score used in place of an exact `0.0` so the product stays meaningful.
const EPSILON: f64 = f64::EPSILON;

/// Tuning knobs for approximate matching.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyOptions {
    /// Maximum score (inclusive) that still counts as a match.
    pub threshold: f64,
    /// Expected match position in the field.
    pub location: usize,
    /// Characters away from `location` that cost a full 1.0 of score.
    pub distance: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            location: 0,
            distance: 100,
        }
    }
}

/// Score `pattern` against `text`, or `None` when it does not match.
pub fn field_score(pattern: &str, text: &str, options: &FuzzyOptions) -> Option<f64> {
    let pattern: Vec<char> = pattern.trim().to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();
    if pattern.is_empty() || text.is_empty() {
        return None;
    }

    let m = pattern.len();
    let proximity = |start: usize| {
        let offset = start.abs_diff(options.location) as f64;
        if options.distance == 0 {
            if offset == 0.0 {
                0.0
            } else {
                1.0
            }
        } else {
            offset / options.distance as f64
        }
    };

    // Sellers' algorithm: edit distance of the pattern against the best
    // substring of the text ending at each position.
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut prev_start: Vec<usize> = vec![0; m + 1];
    let mut best: Option<f64> = None;

    for (j, tc) in text.iter().enumerate() {
        let mut curr = vec![0usize; m + 1];
        let mut curr_start = vec![j + 1; m + 1];
        for i in 1..=m {
            let substitution = prev[i - 1] + usize::from(pattern[i - 1] != *tc);
            let deletion = prev[i] + 1;
            let insertion = curr[i - 1] + 1;
            let (cost, start) = if substitution <= deletion && substitution <= insertion {
                (substitution, if i == 1 { j } else { prev_start[i - 1] })
            } else if deletion <= insertion {
                (deletion, prev_start[i])
            } else {
                (insertion, curr_start[i - 1])
            };
            curr[i] = cost;
            curr_start[i] = start;
        }

        let score = curr[m] as f64 / m as f64 + proximity(curr_start[m]);
        if score <= options.threshold && best.map_or(true, |b| score < b) {
            best = Some(score);
        }
        prev = curr;
        prev_start = curr_start;
    }

    best
}

/// Field-length norm: longer fields weigh less.
fn norm(text: &str) -> f64 {
    let tokens = text.split_whitespace().count().max(1) as f64;
    (1.0 / tokens.sqrt() * 1000.0).round() / 1000.0
}

/// Combine per-field scores into one item score.
///
/// `fields` pairs each field's text with its weight. Fields that do not match
/// are ignored; `None` when no field matches.
pub fn item_score(pattern: &str, fields: &[(&str, f64)], options: &FuzzyOptions) -> Option<f64> {
    let total_weight: f64 = fields.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let mut matched = false;
    let mut total = 1.0;
    for (text, weight) in fields {
        let Some(score) = field_score(pattern, text, options) else {
            continue;
        };
        matched = true;
        let score = if score == 0.0 { EPSILON } else { score };
        total *= score.powf(weight / total_weight * norm(text));
    }

    matched.then_some(total)
}
