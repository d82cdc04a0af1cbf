//! Close-match suggestions for unknown table/column identifiers, using
//! normalized edit-distance similarity rather than raw Levenshtein distance
//! so cutoffs read the same way regardless of identifier length.

use strsim::normalized_levenshtein;

/// Identifiers that need quoting when referenced in SQL (contain a hyphen
/// or a space).
pub fn needs_quoting(identifier: &str) -> bool {
    identifier.contains('-') || identifier.contains(' ')
}

pub fn quote_if_needed(identifier: &str) -> String {
    if needs_quoting(identifier) {
        format!("\"{identifier}\"")
    } else {
        identifier.to_string()
    }
}

/// Return up to `n` candidates whose normalized similarity to `target` is
/// at least `cutoff`, most similar first. Comparison is case-insensitive.
pub fn close_matches<'a>(target: &str, candidates: &'a [String], cutoff: f64, n: usize) -> Vec<&'a str> {
    let needle = target.to_lowercase();
    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|c| (normalized_levenshtein(&needle, &c.to_lowercase()), c.as_str()))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(n).map(|(_, c)| c).collect()
}

pub fn table_suggestion_message(target: &str, known_tables: &[String]) -> String {
    let matches = close_matches(target, known_tables, 0.5, 3);
    if matches.is_empty() {
        let sample: Vec<&str> = known_tables.iter().take(5).map(|s| s.as_str()).collect();
        format!(
            "Table '{target}' does not exist. Known tables: {}",
            sample.join(", ")
        )
    } else {
        format!("Table '{target}' does not exist. Did you mean: {}?", matches.join(", "))
    }
}

pub fn column_suggestion_message(target: &str, table: &str, known_columns: &[String]) -> String {
    let matches = close_matches(target, known_columns, 0.4, 3);
    if matches.is_empty() {
        format!("Column '{target}' does not exist on table '{table}'.")
    } else {
        let quoted: Vec<String> = matches.iter().map(|m| quote_if_needed(m)).collect();
        format!(
            "Column '{target}' does not exist on table '{table}'. Did you mean: {}?",
            quoted.join(", ")
        )
    }
}
