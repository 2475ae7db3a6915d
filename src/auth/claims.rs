use serde::{Deserialize, Serialize};

use crate::auth::auth::AuthUser;
use crate::auth::error::AuthError;
use crate::model::role::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// The subset of identity-service token claims payroll reads.
/// Other claims in the token are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8,
    pub exp: usize,
    pub token_type: TokenType,
}

impl Claims {
    /// Caller identity carried by an access token.
    pub fn into_caller(self) -> Result<AuthUser, AuthError> {
        if self.token_type != TokenType::Access {
            return Err(AuthError::NotAccessToken);
        }

        let role = Role::from_id(self.role).ok_or(AuthError::UnknownRole(self.role))?;

        Ok(AuthUser {
            user_id: self.user_id,
            username: self.sub,
            role,
        })
    }
}
