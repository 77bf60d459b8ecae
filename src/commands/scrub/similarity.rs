use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;

/// Weighted similarity on a 0-100 scale. Comparable lengths take the best of
/// the plain, token-sorted and token-set ratios. Lengths at least 1.5 apart
/// switch to partial (substring) ratios, discounted further past 8x.
///
/// Inputs are expected to be lowercased match keys.
pub(super) fn weighted_ratio(left: &str, right: &str) -> f64 {
    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len == 0 || right_len == 0 {
        return 0.0;
    }

    let base = ratio(left, right);
    let len_ratio = left_len.max(right_len) as f64 / left_len.min(right_len) as f64;

    if len_ratio < 1.5 {
        let sorted = ratio(&sorted_tokens(left), &sorted_tokens(right)) * UNBASE_SCALE;
        let set = token_set_ratio(left, right, ratio) * UNBASE_SCALE;
        return base.max(sorted).max(set).round();
    }

    let partial_scale = if len_ratio > 8.0 { 0.6 } else { 0.9 };
    let partial = partial_ratio(left, right) * partial_scale;
    let sorted = partial_ratio(&sorted_tokens(left), &sorted_tokens(right))
        * UNBASE_SCALE
        * partial_scale;
    let set = token_set_ratio(left, right, partial_ratio) * UNBASE_SCALE * partial_scale;
    base.max(partial).max(sorted).max(set).round()
}

fn ratio(left: &str, right: &str) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    (rapidfuzz::fuzz::ratio(left.chars(), right.chars()) * 100.0).round()
}

/// Best ratio of the shorter string against every equally long window of the
/// longer one.
fn partial_ratio(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    let (shorter, longer) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    if shorter.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let score = rapidfuzz::fuzz::ratio(shorter.iter().copied(), window.iter().copied());
        if score > 0.995 {
            return 100.0;
        }
        best = best.max(score);
    }
    (best * 100.0).round()
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Scores the shared tokens against each side's shared-plus-leftover tokens,
/// so one entry that extends another still scores high.
fn token_set_ratio(left: &str, right: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let left: BTreeSet<&str> = left.split_whitespace().collect();
    let right: BTreeSet<&str> = right.split_whitespace().collect();

    let shared = join(left.intersection(&right));
    let with_left = format!("{shared} {}", join(left.difference(&right)))
        .trim()
        .to_string();
    let with_right = format!("{shared} {}", join(right.difference(&left)))
        .trim()
        .to_string();

    scorer(&shared, &with_left)
        .max(scorer(&shared, &with_right))
        .max(scorer(&with_left, &with_right))
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<&str>>().join(" ")
}
