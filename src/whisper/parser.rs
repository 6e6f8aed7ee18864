//! Inline query grammar: `<body> @<handle>`, where the handle is the run of
//! word characters ending the query and the body is everything before it.

use thiserror::Error;

/// A successfully parsed composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub secret_text: String,
    /// Handle exactly as typed, without the `@`
    pub target_username: String,
}

/// Why a composition could not be turned into a whisper
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("no trailing @username addressee")]
    NoAddressee,

    #[error("secret message is empty")]
    EmptyBody,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split a raw inline query into secret text and addressee.
pub fn parse_query(raw: &str) -> Result<ParsedQuery, ParseError> {
    let input = raw.trim();

    let handle_start = input
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(idx, _)| idx)
        .ok_or(ParseError::NoAddressee)?;

    let handle = &input[handle_start..];
    let body = input[..handle_start]
        .strip_suffix('@')
        .ok_or(ParseError::NoAddressee)?
        .trim();

    if body.is_empty() {
        return Err(ParseError::EmptyBody);
    }

    Ok(ParsedQuery {
        secret_text: body.to_string(),
        target_username: handle.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parsed(body: &str, handle: &str) -> Result<ParsedQuery, ParseError> {
        Ok(ParsedQuery {
            secret_text: body.to_string(),
            target_username: handle.to_string(),
        })
    }

    #[test]
    fn test_simple_query() {
        assert_eq!(parse_query("hello @bob"), parsed("hello", "bob"));
    }

    #[test]
    fn test_handle_only_is_empty_body() {
        assert_eq!(parse_query("@bob"), Err(ParseError::EmptyBody));
        assert_eq!(parse_query("   @bob  "), Err(ParseError::EmptyBody));
    }

    #[test]
    fn test_missing_addressee() {
        assert_eq!(parse_query("no addressee here"), Err(ParseError::NoAddressee));
        assert_eq!(parse_query(""), Err(ParseError::NoAddressee));
        assert_eq!(parse_query("   "), Err(ParseError::NoAddressee));
        assert_eq!(parse_query("hello @"), Err(ParseError::NoAddressee));
        assert_eq!(parse_query("@"), Err(ParseError::NoAddressee));
    }

    #[test]
    fn test_only_trailing_token_is_addressee() {
        assert_eq!(parse_query("say @x to @bob"), parsed("say @x to", "bob"));
    }

    #[test]
    fn test_whitespace_before_handle_is_optional() {
        assert_eq!(parse_query("hello@bob"), parsed("hello", "bob"));
    }

    #[test]
    fn test_body_is_trimmed() {
        assert_eq!(parse_query("  meet me at noon   @alice "), parsed("meet me at noon", "alice"));
    }

    #[test]
    fn test_handle_case_is_preserved() {
        assert_eq!(parse_query("hi @Alice_99"), parsed("hi", "Alice_99"));
    }

    #[test]
    fn test_email_suffix_is_not_an_addressee() {
        assert_eq!(parse_query("mail a@b.com"), Err(ParseError::NoAddressee));
    }

    #[test]
    fn test_unicode_handle_chars() {
        assert_eq!(parse_query("नमस्ते @राम"), parsed("नमस्ते", "राम"));
    }

    #[test]
    fn test_multiline_body() {
        assert_eq!(parse_query("line one\nline two @bob"), parsed("line one\nline two", "bob"));
    }

    proptest! {
        #[test]
        fn prop_trailing_handle_is_addressee(
            body in "[a-zA-Z0-9 @!?.,]{0,40}",
            handle in "[A-Za-z0-9_]{1,20}",
        ) {
            let input = format!("{} @{}", body, handle);
            match parse_query(&input) {
                Ok(p) => {
                    prop_assert_eq!(p.target_username, handle);
                    prop_assert_eq!(p.secret_text.as_str(), body.trim());
                }
                Err(e) => {
                    prop_assert_eq!(e, ParseError::EmptyBody);
                    prop_assert!(body.trim().is_empty());
                }
            }
        }

        #[test]
        fn prop_non_word_ending_has_no_addressee(input in "[a-z @]{0,30}[!.?]") {
            prop_assert_eq!(parse_query(&input), Err(ParseError::NoAddressee));
        }
    }
}
