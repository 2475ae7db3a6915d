use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::auth::auth::AuthUser;
use crate::auth::claims::Claims;
use crate::auth::error::AuthError;

/// Decodes an access token signed with `secret` into the calling user.
///
/// Refresh tokens are rejected: they are only good at the identity service.
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AuthError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?
    .claims;

    claims.into_caller()
}
