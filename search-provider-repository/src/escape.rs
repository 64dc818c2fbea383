//! Query text escaping.
//!
//! The query parser treats `?` as a wildcard, `[` `]` as range delimiters and
//! `/` as a regex delimiter. Those are replaced with a space; single quotes are
//! dropped. Nothing else is touched, so field syntax such as `id:42` and
//! boolean operators still reach the parser.

/// Characters replaced by a single space.
pub const SPACED_CHARACTERS: [char; 4] = ['?', '[', ']', '/'];

/// Characters removed outright.
pub const REMOVED_CHARACTERS: [char; 1] = ['\''];

/// Escape free-text query input before it is submitted to the engine.
///
/// ```
/// use search_provider_repository::escape_query;
///
/// assert_eq!(escape_query("DNA/RNA"), "DNA RNA");
/// assert_eq!(escape_query("Parkinson's"), "Parkinsons");
/// ```
pub fn escape_query(term: &str) -> String {
    term.chars()
        .filter(|c| !REMOVED_CHARACTERS.contains(c))
        .map(|c| if SPACED_CHARACTERS.contains(&c) { ' ' } else { c })
        .collect()
}
