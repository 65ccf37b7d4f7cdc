//! Fuzzy name matching for spoken board, list and card names.
//!
//! Speech recognition garbles names ("Trott" for "Trello"), so a spoken name
//! is matched against the catalog with a substring check first and a
//! case-insensitive Levenshtein distance second. The accepted distance grows
//! with the length of the spoken name: `clamp(len / 3, 2, 6)`.

/// Lower bound of the accepted edit distance.
const MIN_DISTANCE: usize = 2;

/// Upper bound of the accepted edit distance.
const MAX_DISTANCE: usize = 6;

/// Maximum edit distance accepted for a spoken name of this length.
pub fn max_distance(spoken: &str) -> usize {
    (spoken.chars().count() / 3).clamp(MIN_DISTANCE, MAX_DISTANCE)
}

/// Distance between a spoken name and a candidate; 0 when either contains
/// the other (case-insensitive).
pub fn distance(spoken: &str, candidate: &str) -> usize {
    let spoken = spoken.to_lowercase();
    let candidate = candidate.to_lowercase();
    if candidate.contains(&spoken) || spoken.contains(&candidate) {
        0
    } else {
        strsim::levenshtein(&candidate, &spoken)
    }
}

/// Best matching item, or `None` when nothing is close enough.
///
/// Ties go to the earliest candidate. Blank spoken names and blank candidate
/// names never match.
pub fn best_match_by<'a, T, F>(spoken: &str, candidates: &'a [T], name: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let spoken = spoken.trim();
    if spoken.is_empty() {
        return None;
    }
    let limit = max_distance(spoken);

    let mut best: Option<(usize, &'a T)> = None;
    for candidate in candidates {
        let candidate_name = name(candidate);
        if candidate_name.trim().is_empty() {
            continue;
        }
        let d = distance(spoken, candidate_name);
        if best.is_none_or(|(best_d, _)| d < best_d) {
            best = Some((d, candidate));
            if d == 0 {
                break;
            }
        }
    }

    best.filter(|(d, _)| *d <= limit).map(|(_, item)| item)
}

/// Best matching name from a plain list of names.
pub fn best_match<'a, S: AsRef<str>>(spoken: &str, candidates: &'a [S]) -> Option<&'a S> {
    best_match_by(spoken, candidates, |c| c.as_ref())
}
