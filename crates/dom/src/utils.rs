//! Utility functions for DOM processing

/// Cap text length for display, keeping the result within `max_len`
/// characters (the last three being `...` when truncated)
pub fn cap_text_length(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Class tokens with duplicates removed, first occurrence wins
pub fn distinct_tokens(value: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for token in value.split_whitespace() {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

/// Strip one layer of matching single or double quotes
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
