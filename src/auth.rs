use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use uuid::Uuid;

use crate::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub(crate) enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid bearer token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id")]
    InvalidSubject(#[source] uuid::Error),
}

impl AuthError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingToken => ErrorCode::UNAUTHENTICATED,
            Self::InvalidToken(_) | Self::InvalidSubject(_) => ErrorCode::INVALID_TOKEN,
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// Validates HS256 bearer tokens issued for this service
#[derive(Clone)]
pub(crate) struct JwtAuth {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth").finish_non_exhaustive()
    }
}

impl JwtAuth {
    pub(crate) fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtAuth {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Resolve the requesting user from an `Authorization: Bearer` header
    pub(crate) fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(AuthError::InvalidToken)?;

        data.claims
            .sub
            .parse()
            .map_err(AuthError::InvalidSubject)
    }
}
