//! Parameter clause: exact key set, then an order-independent one-to-one
//! pairing of expected patterns to received values for every key.

use crate::expectation::ParamSpec;
use crate::live::ParamMap;
use crate::pattern::Pattern;

pub(crate) fn check_params(expected: &ParamSpec, actual: &ParamMap) -> Result<(), String> {
    let missing: Vec<&str> = expected
        .keys()
        .filter(|k| !actual.contains_key(*k))
        .map(String::as_str)
        .collect();
    let unexpected: Vec<&str> = actual
        .keys()
        .filter(|k| !expected.contains_key(*k))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(format!(
            "parameter names differ (missing: [{}], unexpected: [{}])",
            missing.join(", "),
            unexpected.join(", ")
        ));
    }

    for (name, patterns) in expected {
        let values = actual.get(name).map(Vec::as_slice).unwrap_or_default();
        if values.len() != patterns.len() {
            return Err(format!(
                "parameter '{name}' expected {} value(s), got {}",
                patterns.len(),
                values.len()
            ));
        }
        if !values_match(patterns, values) {
            let expected: Vec<String> = patterns.iter().map(ToString::to_string).collect();
            return Err(format!(
                "parameter '{name}' values {values:?} do not match [{}]",
                expected.join(", ")
            ));
        }
    }
    Ok(())
}

/// Whether every pattern can be paired with a distinct value it accepts.
pub(crate) fn values_match(patterns: &[Pattern], values: &[String]) -> bool {
    if patterns.len() != values.len() {
        return false;
    }

    // Literal-only: sorting both sides gives the pairing directly
    if let Some(mut literals) = patterns
        .iter()
        .map(Pattern::as_literal)
        .collect::<Option<Vec<&str>>>()
    {
        let mut received: Vec<&str> = values.iter().map(String::as_str).collect();
        literals.sort_unstable();
        received.sort_unstable();
        return literals == received;
    }

    has_perfect_matching(patterns, values)
}

/// Bipartite matching by augmenting paths over the accepts-matrix.
fn has_perfect_matching(patterns: &[Pattern], values: &[String]) -> bool {
    let accepts: Vec<Vec<bool>> = patterns
        .iter()
        .map(|p| values.iter().map(|v| p.accepts(v)).collect())
        .collect();

    // owner[value] = index of the pattern currently paired with it
    let mut owner: Vec<Option<usize>> = vec![None; values.len()];
    for pattern in 0..patterns.len() {
        let mut visited = vec![false; values.len()];
        if !augment(pattern, &accepts, &mut visited, &mut owner) {
            return false;
        }
    }
    true
}

fn augment(
    pattern: usize,
    accepts: &[Vec<bool>],
    visited: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for value in 0..visited.len() {
        if visited[value] || !accepts[pattern][value] {
            continue;
        }
        visited[value] = true;
        let free = match owner[value] {
            None => true,
            Some(other) => augment(other, accepts, visited, owner),
        };
        if free {
            owner[value] = Some(pattern);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literal_values_any_order() {
        let patterns = vec![Pattern::literal("this"), Pattern::literal("that")];
        assert!(values_match(&patterns, &strings(&["that", "this"])));
        assert!(!values_match(&patterns, &strings(&["that", "tha"])));
    }

    #[test]
    fn test_literal_duplicates_count() {
        let patterns = vec![Pattern::literal("a"), Pattern::literal("a")];
        assert!(values_match(&patterns, &strings(&["a", "a"])));
        assert!(!values_match(&patterns, &strings(&["a", "b"])));
    }

    #[test]
    fn test_mixed_needs_search_beyond_first_fit() {
        // A greedy pass would pair /.+/ with "exact" first and strand the literal.
        let patterns = vec![Pattern::regex(".+").unwrap(), Pattern::literal("exact")];
        assert!(values_match(&patterns, &strings(&["exact", "other"])));
        assert!(values_match(&patterns, &strings(&["other", "exact"])));
        assert!(!values_match(&patterns, &strings(&["other", "again"])));
    }

    #[test]
    fn test_overlapping_regexes() {
        let patterns = vec![
            Pattern::regex("[ab]").unwrap(),
            Pattern::regex("a").unwrap(),
            Pattern::regex("[abc]").unwrap(),
        ];
        assert!(values_match(&patterns, &strings(&["b", "c", "a"])));
        assert!(!values_match(&patterns, &strings(&["c", "c", "a"])));
    }

    #[test]
    fn test_length_mismatch() {
        let patterns = vec![Pattern::regex("v.").unwrap()];
        assert!(!values_match(&patterns, &strings(&["v1", "v2"])));
        assert!(!values_match(&patterns, &[]));
    }
}
