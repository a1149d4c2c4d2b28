/// Builds a `LIKE`/`ILIKE` pattern that matches `term` as a literal substring.
///
/// `%`, `_` and `\` in user input are escaped so a search for `50%` does not
/// turn into a wildcard. Returns `None` for blank input.
pub fn contains_pattern(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(trimmed.len() + 2);
    pattern.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_terms_yield_no_pattern() {
        assert_eq!(contains_pattern(""), None);
        assert_eq!(contains_pattern("   "), None);
    }

    #[test]
    fn test_plain_term_is_wrapped() {
        assert_eq!(contains_pattern(" Rust Meetup ").as_deref(), Some("%Rust Meetup%"));
    }

    #[test]
    fn test_wildcards_are_escaped() {
        assert_eq!(contains_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(contains_pattern("a\\b").as_deref(), Some("%a\\\\b%"));
    }
}
