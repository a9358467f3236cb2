//! JWT bearer authentication.
//!
//! Token issuance lives in the external identity service; this adapter only
//! verifies HS256 tokens and trusts the `sub` claim as the acting user. The
//! [`Identity`] extractor makes the principal available to handlers without
//! threading headers through every signature.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, UserId};

use super::state::HttpState;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a UUID string.
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    /// Issued-at as a unix timestamp.
    pub iat: i64,
}

/// Verifies HS256 bearer tokens against a shared secret.
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Verify a token and return the user it identifies.
    pub fn verify(&self, token: &str) -> Result<UserId, Error> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|_| Error::unauthorized("invalid or expired token"))?;
        let sub = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| Error::unauthorized("token subject is not a user id"))?;
        Ok(UserId::from_uuid(sub))
    }

    /// Issue a token for `user`. Used by tests and local tooling; production
    /// tokens come from the identity service signing with the same secret.
    pub fn mint(&self, user: UserId, ttl: Duration) -> Result<String, Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::internal(format!("failed to sign token: {err}")))
    }
}

/// The authenticated principal of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub UserId);

impl Identity {
    pub fn user(self) -> UserId {
        self.0
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from(req))
    }
}

fn identity_from(req: &HttpRequest) -> Result<Identity, Error> {
    let verifier = req
        .app_data::<web::Data<HttpState>>()
        .map(|state| Arc::clone(&state.verifier))
        .ok_or_else(|| Error::internal("http state is not configured"))?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(|| Error::unauthorized("authorization header is not a bearer token"))?;

    verifier.verify(token).map(Identity)
}
