//! Escaping of user input for Solr query syntax.

/// Characters with a meaning in the Solr/Lucene query parser.
const SPECIAL_CHARS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\', '/',
];

/// Escape a single term so it is matched literally.
pub fn escape_term(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if SPECIAL_CHARS.contains(&c) || c.is_whitespace() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Quote a value as a phrase.
pub fn phrase(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Turn fulltext keywords into a query string of escaped terms.
pub fn escape_keys(keys: &str) -> String {
    keys.split_whitespace()
        .map(escape_term)
        .collect::<Vec<_>>()
        .join(" ")
}
