/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing API key")]
    Missing,
    #[error("invalid API key")]
    Invalid,
}

/// Validates the provided API key against the key configured at startup.
///
/// When no key is configured, every request is accepted.
pub fn validate_api_key(provided_key: Option<&str>, expected_key: Option<&str>) -> Result<(), AuthError> {
    let Some(expected_key) = expected_key else {
        return Ok(());
    };

    match provided_key {
        None => Err(AuthError::Missing),
        Some(key) if key == expected_key => Ok(()),
        Some(_) => Err(AuthError::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_configured_key_allows_everything() {
        assert_eq!(validate_api_key(None, None), Ok(()));
        assert_eq!(validate_api_key(Some("anything"), None), Ok(()));
    }

    #[test]
    fn configured_key_must_match() {
        assert_eq!(validate_api_key(Some("s3cret"), Some("s3cret")), Ok(()));
        assert_eq!(
            validate_api_key(Some("guess"), Some("s3cret")),
            Err(AuthError::Invalid)
        );
        assert_eq!(validate_api_key(None, Some("s3cret")), Err(AuthError::Missing));
    }
}
