//! The authenticated principal for a request.
//!
//! Identity is owned by an upstream service; after it authenticates a request it forwards the principal in the
//! `x-user-id` and `x-user-roles` headers. This module materializes those headers as an explicit
//! [`AuthenticatedUser`] value that handlers take as a parameter; operations never recover the caller from ambient
//! request state.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use template_market_engine::db_types::{Role, UserId};

use crate::errors::AuthError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn from_request_parts(req: &HttpRequest) -> Result<Self, AuthError> {
        let id = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingPrincipal)?
            .to_str()
            .map_err(|e| AuthError::PoorlyFormattedPrincipal(e.to_string()))?;
        if id.is_empty() {
            return Err(AuthError::MissingPrincipal);
        }
        let roles = match req.headers().get(USER_ROLES_HEADER) {
            None => vec![Role::User],
            Some(value) => {
                let value = value.to_str().map_err(|e| AuthError::PoorlyFormattedPrincipal(e.to_string()))?;
                value
                    .split(',')
                    .map(|s| s.trim().parse::<Role>())
                    .collect::<Result<Vec<Role>, _>>()
                    .map_err(|e| AuthError::PoorlyFormattedPrincipal(e.to_string()))?
            },
        };
        Ok(Self { id: UserId::from(id), roles })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = crate::errors::ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_request_parts(req).map_err(crate::errors::ServerError::AuthenticationError))
    }
}
