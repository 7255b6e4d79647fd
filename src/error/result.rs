//! Result type alias for provider operations.

use super::provider_error::ProviderError;

/// Type alias for Results using [`ProviderError`].
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Extension trait for provider results.
pub trait ResultExt<T> {
    /// Turn a "not found" failure into `Ok(None)`, keeping every other
    /// error.
    ///
    /// ```ignore
    /// let record = client.fetch_json(&url).await.found()?;
    /// ```
    fn found(self) -> ProviderResult<Option<T>>;
}

impl<T> ResultExt<T> for ProviderResult<T> {
    fn found(self) -> ProviderResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LookupError, NetworkError};

    #[test]
    fn test_found_maps_not_found_to_none() {
        let result: ProviderResult<i32> = Err(NetworkError::HttpStatus {
            status: 404,
            message: String::new(),
        }
        .into());
        assert_eq!(result.found().unwrap(), None);

        let result: ProviderResult<i32> = Err(LookupError::NotFound { id: "a".into() }.into());
        assert_eq!(result.found().unwrap(), None);
    }

    #[test]
    fn test_found_keeps_other_errors() {
        let result: ProviderResult<i32> = Err(NetworkError::Cancelled.into());
        assert!(result.found().is_err());

        let ok: ProviderResult<i32> = Ok(7);
        assert_eq!(ok.found().unwrap(), Some(7));
    }
}
