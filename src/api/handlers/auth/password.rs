//! bcrypt hashing, run on the blocking pool.

use crate::api::error::ApiError;

/// Hashes `password` with the given bcrypt cost.
pub(crate) async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)
}

/// Constant-time comparison of `password` against a stored hash.
///
/// A malformed stored hash counts as a mismatch.
pub(crate) async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?;
    Ok(verified.unwrap_or(false))
}
