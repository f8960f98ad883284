//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying `{ sub, role, exp }`, where `sub` is the caller's canonical
//! record id. Issuing credentials (login, registration) is handled elsewhere; this module only
//! turns a presented token into a [`Caller`].

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use medairon_core::Caller;
use medairon_types::Role;
use medairon_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("authentication misconfigured: {0}")]
    Config(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    /// # Errors
    ///
    /// Returns `AuthError::Config` if `secret` is empty.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::Config("JWT secret cannot be empty".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }

    /// Authenticates the value of an `Authorization` header.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Caller, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;
        self.authenticate_token(token.trim())
    }

    pub fn authenticate_token(&self, token: &str) -> Result<Caller, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let id = RecordId::parse(&data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("sub: {e}")))?;
        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|e| AuthError::InvalidToken(format!("role: {e}")))?;
        Ok(Caller::new(id, role))
    }

    /// Signs a token for `caller` that expires at the unix timestamp `exp`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the token cannot be signed.
    pub fn issue(&self, caller: &Caller, exp: usize) -> Result<String, AuthError> {
        let claims = Claims {
            sub: caller.id.to_string(),
            role: caller.role.as_str().to_string(),
            exp,
        };
        self.sign(&Header::default(), &claims)
    }

    fn sign(&self, header: &Header, claims: &Claims) -> Result<String, AuthError> {
        encode(header, claims, &self.encoding)
            .map_err(|e| AuthError::Config(format!("failed to sign token: {e}")))
    }
}
