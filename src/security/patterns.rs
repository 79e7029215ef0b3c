//! LIKE/ILIKE pattern construction.
//!
//! Caller text is always bound as a parameter, never spliced into SQL. The
//! helpers here only make sure that `%`, `_` and the escape character inside
//! that text are matched literally, so "substring" really means substring.

use crate::error::ServerError;

/// Escape character declared in every `ILIKE ... ESCAPE` clause we emit.
pub const LIKE_ESCAPE_CHAR: char = '\\';

/// Escape LIKE metacharacters so the input matches literally.
///
/// # Examples
///
/// ```
/// use alloydb_survey_mcp_server::security::escape_like;
///
/// assert_eq!(escape_like("New York"), "New York");
/// assert_eq!(escape_like("50%_off"), "50\\%\\_off");
/// assert_eq!(escape_like(r"C:\data"), r"C:\\data");
/// ```
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE_CHAR {
            escaped.push(LIKE_ESCAPE_CHAR);
        }
        escaped.push(ch);
    }
    escaped
}

/// The `ESCAPE` clause that follows every bound LIKE pattern.
///
/// # Examples
///
/// ```
/// use alloydb_survey_mcp_server::security::escape_clause;
///
/// assert_eq!(escape_clause(), r" ESCAPE '\'");
/// ```
pub fn escape_clause() -> String {
    format!(" ESCAPE '{}'", LIKE_ESCAPE_CHAR)
}

/// Build a substring pattern (`%text%`) for an `ILIKE` predicate.
///
/// # Examples
///
/// ```
/// use alloydb_survey_mcp_server::security::contains_pattern;
///
/// assert_eq!(contains_pattern("york"), "%york%");
/// assert_eq!(contains_pattern("100%"), "%100\\%%");
/// ```
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

/// Validate free-text search input.
///
/// Empty or whitespace-only text would turn into `%%` and match every row,
/// so it is rejected. Surrounding whitespace is trimmed from accepted text.
pub fn require_search_text(field: &str, text: &str) -> Result<String, ServerError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ServerError::invalid_input(format!(
            "{} must not be empty or whitespace",
            field
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_like("public transport"), "public transport");
        assert_eq!(escape_like(""), "");
    }

    #[test]
    fn test_escape_metacharacters() {
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("_"), "\\_");
        assert_eq!(escape_like("\\"), "\\\\");
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
    }

    #[test]
    fn test_escape_preserves_unicode() {
        assert_eq!(escape_like("São Paulo"), "São Paulo");
        assert_eq!(contains_pattern("Zürich"), "%Zürich%");
    }

    #[test]
    fn test_escape_clause_uses_escape_char() {
        assert_eq!(escape_clause(), format!(" ESCAPE '{}'", LIKE_ESCAPE_CHAR));
        assert_eq!(escape_clause(), " ESCAPE '\\'");
    }

    #[test]
    fn test_contains_pattern_wraps() {
        assert_eq!(contains_pattern("Chicago"), "%Chicago%");
        assert_eq!(contains_pattern("it's"), "%it's%");
    }

    #[test]
    fn test_require_search_text_rejects_blank() {
        assert!(require_search_text("question_text", "").is_err());
        assert!(require_search_text("question_text", "   ").is_err());
        assert!(require_search_text("question_text", "\t\n").is_err());

        let err = require_search_text("response_text", " ").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("response_text"));
    }

    #[test]
    fn test_require_search_text_trims() {
        assert_eq!(
            require_search_text("question_text", "  public transport ").unwrap(),
            "public transport"
        );
    }
}
