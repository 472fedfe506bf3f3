use crate::common::error::MultiRepoError;

/// Result alias used across the crate.
///
/// # Examples
///
/// ```
/// use multirepo::common::result::MultiRepoResult;
/// use multirepo::common::error::MultiRepoError;
///
/// fn example_function() -> MultiRepoResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> MultiRepoResult<()> {
///     Err(MultiRepoError::artifact_not_found("defs/x.xml"))
/// }
///
/// assert!(example_function().is_ok());
/// assert!(example_with_error().is_err());
/// ```
pub type MultiRepoResult<T> = Result<T, MultiRepoError>;
