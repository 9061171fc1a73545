//! Text answer matching (exact, contains, regex and Levenshtein similarity).

use crate::types::ScoringMode;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Result of comparing a typed answer to the configured answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    /// Whether the answer matches under the scoring mode.
    pub is_correct: bool,
    /// Similarity percentage, only computed in similarity mode.
    pub similarity: Option<u8>,
}

/// Compare a typed answer to the correct answer.
///
/// Similarity mode always reports a match; the similarity percentage carries the grade.
pub fn compare_text(
    typed: &str,
    correct: &str,
    mode: ScoringMode,
    case_sensitive: bool,
) -> TextMatch {
    let typed_normalized = normalize(typed, case_sensitive);
    let correct_normalized = normalize(correct, case_sensitive);

    match mode {
        ScoringMode::Exact => TextMatch {
            is_correct: typed_normalized == correct_normalized,
            similarity: None,
        },
        ScoringMode::Contains => TextMatch {
            is_correct: typed_normalized.contains(correct_normalized.as_str()),
            similarity: None,
        },
        ScoringMode::Regex => TextMatch {
            is_correct: regex_matches(typed.trim(), correct, case_sensitive),
            similarity: None,
        },
        ScoringMode::Similarity => TextMatch {
            is_correct: true,
            similarity: Some(similarity(&typed_normalized, &correct_normalized)),
        },
    }
}

/// Trim and, unless case sensitive, lowercase.
pub fn normalize(s: &str, case_sensitive: bool) -> String {
    let trimmed = s.trim();
    if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Match `input` against `pattern`, failing closed when the pattern does not compile.
fn regex_matches(input: &str, pattern: &str, case_sensitive: bool) -> bool {
    match RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(re) => re.is_match(input),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid answer pattern, treating as no match");
            false
        }
    }
}

/// Calculate Levenshtein distance between two strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rows instead of the full table
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };

            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Similarity percentage (0 to 100) based on Levenshtein distance.
pub fn similarity(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }

    let max_len = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let distance = levenshtein_distance(a, b);
    let ratio = (max_len - distance) as f64 / max_len as f64;
    (ratio * 100.0).round() as u8
}
