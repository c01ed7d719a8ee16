//! Purpose: Sanitize mapping keys and type tags before dispatch.
//! Exports: `sanitize_key`.
//! Role: Shared first step for every field name and tag the decoder touches.
//! Invariants: Sanitized keys are non-empty and carry no surrounding whitespace.
use crate::core::error::{Error, ErrorKind};

pub fn sanitize_key(raw: &str) -> Result<&str, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::EmptyKey)
            .with_message("key is empty after trimming")
            .with_token(raw));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::sanitize_key;
    use crate::core::error::ErrorKind;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize_key("  name \t").unwrap(), "name");
        assert_eq!(sanitize_key("id").unwrap(), "id");
    }

    #[test]
    fn rejects_empty_and_blank_keys() {
        assert_eq!(sanitize_key("").unwrap_err().kind(), ErrorKind::EmptyKey);
        assert_eq!(sanitize_key("   ").unwrap_err().kind(), ErrorKind::EmptyKey);
    }

    #[test]
    fn interior_whitespace_is_preserved() {
        assert_eq!(sanitize_key(" first name ").unwrap(), "first name");
    }
}
