use crate::auth::error::AuthError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// Caller identity established by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or(AuthError::MissingHeader),
        )
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> Result<(), AuthError> {
        if self.role.manages_payroll() {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                username = %self.username,
                role = %self.role,
                "Payroll write refused"
            );
            Err(AuthError::Forbidden)
        }
    }
}
